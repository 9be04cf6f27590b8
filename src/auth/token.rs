use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::tenant::TenantId;
use crate::auth::user::Role;
use crate::config::AuthConfig;
use crate::constants::MAX_TOKEN_LEN;
use crate::error::{AuthError, Result};

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (principal email)
    pub sub: String,
    /// Issued at (UTC timestamp, seconds)
    pub iat: i64,
    /// Expiration (UTC timestamp, seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    /// Tenant the session was bound to at login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantId>,
    /// Role at mint time. Informational only: authorization re-reads the
    /// current role from storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl SessionClaims {
    fn new(subject: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self> {
        if subject.trim().is_empty() {
            return Err(AuthError::InvalidIdentifier(
                "token subject must not be empty".to_string(),
            ));
        }
        AuthConfig::validate_ttl(ttl)?;

        let iat = issued_at.timestamp();
        Ok(Self {
            sub: subject.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
            jti: Uuid::new_v4().to_string(),
            tenant: None,
            role: None,
        })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Signs and validates session tokens with a single HMAC secret.
///
/// The accepted algorithm is fixed at construction; the `alg` header of an
/// incoming token is never used to pick the verification scheme.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenCodec {
    /// Creates a codec; fails when the secret, algorithm or ttl is unusable
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        default_ttl: Duration,
        leeway_secs: u64,
    ) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::ConfigurationError(
                "signing secret is missing".to_string(),
            ));
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::ConfigurationError(format!(
                "signing algorithm {:?} is not an HMAC variant",
                algorithm
            )));
        }
        AuthConfig::validate_ttl(default_ttl)?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(algorithm),
            validation,
            default_ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        Self::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.token_ttl,
            config.token_leeway_secs,
        )
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Mint a token carrying `sub`, `iat = issued_at` and `exp = issued_at + ttl`
    pub fn mint(&self, subject: &str, issued_at: DateTime<Utc>, ttl: Duration) -> Result<String> {
        let claims = SessionClaims::new(subject, issued_at, ttl)?;
        self.sign(&claims)
    }

    /// Mint a token bound to the tenant (and role) resolved at login
    pub fn mint_for_tenant(
        &self,
        subject: &str,
        tenant: TenantId,
        role: &Role,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String> {
        let mut claims = SessionClaims::new(subject, issued_at, ttl)?;
        claims.tenant = Some(tenant);
        claims.role = Some(role.clone());
        self.sign(&claims)
    }

    /// Verify the signature and expiry of a token and return its claims
    pub fn decode(&self, token: &str) -> Result<SessionClaims> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(AuthError::TokenMalformed("token too long".to_string()));
        }
        if token.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(AuthError::TokenMalformed(
                "token contains invalid characters".to_string(),
            ));
        }

        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::TokenSignatureInvalid
                }
                _ => AuthError::TokenMalformed(e.to_string()),
            })
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("failed to sign token: {}", e)))
    }
}

/// Extracts bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
