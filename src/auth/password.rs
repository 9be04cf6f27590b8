//! Password hashing and verification using Argon2.
//!
//! Stored hashes are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$digest`),
//! so the algorithm tag and cost parameters travel with every hash. Verification
//! re-derives the digest with the stored salt and parameters; the digest
//! comparison inside `argon2` is constant-time.

use argon2::password_hash::{Error as PasswordHashError, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::config::{AuthConfig, HashingConfig};
use crate::error::{AuthError, Result};

// Hashed once at construction; unknown identities are verified against it
// so they cost the same as a real mismatch.
const DUMMY_SECRET: &str = "tenant-gate-dummy-credential";

/// Verifies presented secrets against stored salted hashes
pub struct CredentialVerifier {
    hasher: Argon2<'static>,
    pepper: Option<String>,
    dummy_hash: String,
}

impl CredentialVerifier {
    /// Build a verifier with the given cost factor and optional pepper
    pub fn new(hashing: HashingConfig, pepper: Option<String>) -> Result<Self> {
        let params = Params::new(
            hashing.memory_kib,
            hashing.iterations,
            hashing.parallelism,
            None,
        )
        .map_err(|e| AuthError::ConfigurationError(format!("invalid argon2 parameters: {}", e)))?;

        let mut verifier = Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            pepper,
            dummy_hash: String::new(),
        };
        verifier.dummy_hash = verifier.hash(DUMMY_SECRET)?;
        Ok(verifier)
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(config.hashing, config.pepper.clone())
    }

    /// Hash a secret for storage (registration, password change)
    pub fn hash(&self, plain_secret: &str) -> Result<String> {
        if plain_secret.is_empty() {
            return Err(AuthError::InvalidIdentifier(
                "secret must not be empty".to_string(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let input = self.peppered(plain_secret);
        self.hasher
            .hash_password(input.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Crypto(format!("hashing failed: {}", e)))
    }

    /// Check a presented secret against a stored hash.
    ///
    /// Returns `false` for a wrong secret, an empty secret and a malformed
    /// or foreign-scheme hash alike. Every path costs one Argon2 derivation.
    pub fn verify(&self, plain_secret: &str, stored_hash: &str) -> bool {
        if plain_secret.is_empty() {
            return self.verify_dummy(plain_secret);
        }

        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("Stored credential hash could not be parsed: {}", e);
                return self.verify_dummy(plain_secret);
            }
        };

        let input = self.peppered(plain_secret);
        match self.hasher.verify_password(input.as_bytes(), &parsed) {
            Ok(()) => true,
            Err(PasswordHashError::Password) => false,
            Err(e) => {
                log::debug!("Stored credential hash is unusable: {}", e);
                self.verify_dummy(plain_secret)
            }
        }
    }

    /// Burn the same work as a real verification; always `false`
    pub fn verify_dummy(&self, plain_secret: &str) -> bool {
        if let Ok(parsed) = PasswordHash::new(&self.dummy_hash) {
            let input = self.peppered(plain_secret);
            let _ = self.hasher.verify_password(input.as_bytes(), &parsed);
        }
        false
    }

    fn peppered(&self, plain_secret: &str) -> String {
        match &self.pepper {
            Some(pepper) => format!("{}{}", pepper, plain_secret),
            None => plain_secret.to_string(),
        }
    }
}
