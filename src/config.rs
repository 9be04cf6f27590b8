//! Authentication configuration
//! Loads the signing secret, token lifetime, hashing cost and tenant policy
//! from the environment. Everything here is read-only after construction.

use crate::constants::{
    DEFAULT_ARGON2_ITERATIONS, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_ARGON2_PARALLELISM,
    DEFAULT_MIN_LOGIN_DURATION_MS, DEFAULT_PERMISSION_CACHE_SIZE,
    DEFAULT_PERMISSION_CACHE_TTL_SECS, DEFAULT_TOKEN_LEEWAY_SECS, DEFAULT_TOKEN_TTL_SECS,
    ENV_PREFIX, MAX_TOKEN_TTL_SECS, MIN_SECRET_LEN,
};
use crate::error::{AuthError, Result};
use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Argon2 cost parameters used when hashing new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashingConfig {
    /// Read `TENANT_GATE_ARGON2_*` overrides from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        Ok(Self {
            memory_kib: parse_var(&var, "ARGON2_MEMORY_KIB", DEFAULT_ARGON2_MEMORY_KIB)?,
            iterations: parse_var(&var, "ARGON2_ITERATIONS", DEFAULT_ARGON2_ITERATIONS)?,
            parallelism: parse_var(&var, "ARGON2_PARALLELISM", DEFAULT_ARGON2_PARALLELISM)?,
        })
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            iterations: DEFAULT_ARGON2_ITERATIONS,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

/// How superadmin principals interact with tenant scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuperadminPolicy {
    /// Superadmins act in any tenant without a membership row.
    pub bypass_tenant_scoping: bool,
    /// Bypass audit entries carry the tenant the superadmin acted in.
    pub audit_tenant_scoped: bool,
}

/// Authentication service configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for token signing/validation
    pub jwt_secret: String,
    /// The single accepted HMAC variant
    pub jwt_algorithm: Algorithm,
    /// Default token lifetime
    pub token_ttl: chrono::Duration,
    /// Clock skew tolerated when checking `exp`
    pub token_leeway_secs: u64,
    pub hashing: HashingConfig,
    /// Optional pepper prepended to secrets before hashing
    pub pepper: Option<String>,
    pub superadmin: SuperadminPolicy,
    pub permission_cache_size: usize,
    pub permission_cache_ttl: Duration,
    /// Failed logins are padded to at least this duration
    pub min_login_duration: Duration,
}

// The secret and pepper never reach logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("token_ttl", &self.token_ttl)
            .field("token_leeway_secs", &self.token_leeway_secs)
            .field("hashing", &self.hashing)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .field("superadmin", &self.superadmin)
            .field("permission_cache_size", &self.permission_cache_size)
            .field("permission_cache_ttl", &self.permission_cache_ttl)
            .field("min_login_duration", &self.min_login_duration)
            .finish()
    }
}

impl AuthConfig {
    /// Create a configuration with default settings around a validated secret
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self> {
        let jwt_secret = jwt_secret.into();
        Self::validate_secret(&jwt_secret)?;

        Ok(Self {
            jwt_secret,
            jwt_algorithm: Algorithm::HS512,
            token_ttl: chrono::Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            token_leeway_secs: DEFAULT_TOKEN_LEEWAY_SECS,
            hashing: HashingConfig::default(),
            pepper: None,
            superadmin: SuperadminPolicy::default(),
            permission_cache_size: DEFAULT_PERMISSION_CACHE_SIZE,
            permission_cache_ttl: Duration::from_secs(DEFAULT_PERMISSION_CACHE_TTL_SECS),
            min_login_duration: Duration::from_millis(DEFAULT_MIN_LOGIN_DURATION_MS),
        })
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self> {
        Self::validate_algorithm(algorithm)?;
        self.jwt_algorithm = algorithm;
        Ok(self)
    }

    pub fn with_token_ttl(mut self, ttl: chrono::Duration) -> Result<Self> {
        Self::validate_ttl(ttl)?;
        self.token_ttl = ttl;
        Ok(self)
    }

    pub fn with_hashing(mut self, hashing: HashingConfig) -> Self {
        self.hashing = hashing;
        self
    }

    pub fn with_pepper(mut self, pepper: impl Into<String>) -> Self {
        self.pepper = Some(pepper.into());
        self
    }

    pub fn with_superadmin_policy(mut self, policy: SuperadminPolicy) -> Self {
        self.superadmin = policy;
        self
    }

    pub fn with_min_login_duration(mut self, duration: Duration) -> Self {
        self.min_login_duration = duration;
        self
    }

    pub fn with_permission_cache(mut self, size: usize, ttl: Duration) -> Self {
        self.permission_cache_size = size;
        self.permission_cache_ttl = ttl;
        self
    }

    /// Validate that the signing secret meets security requirements
    pub fn validate_secret(secret: &str) -> Result<()> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::ConfigurationError(format!(
                "JWT secret must be at least {} characters long",
                MIN_SECRET_LEN
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "INSECURE-DEFAULT-FOR-TESTING-ONLY",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.contains(pattern) {
                return Err(AuthError::ConfigurationError(format!(
                    "JWT secret contains insecure pattern '{}'. Generate one with: tenant_gate gen-secret",
                    pattern
                )));
            }
        }

        // Ensure some complexity
        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AuthError::ConfigurationError(
                "JWT secret should contain mixed characters (letters, numbers, symbols)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate_ttl(ttl: chrono::Duration) -> Result<()> {
        // `exp` has whole-second resolution
        if ttl < chrono::Duration::seconds(1) {
            return Err(AuthError::ConfigurationError(
                "token ttl must be at least one second".to_string(),
            ));
        }
        if ttl > chrono::Duration::seconds(MAX_TOKEN_TTL_SECS) {
            return Err(AuthError::ConfigurationError(format!(
                "token ttl must not exceed {} seconds",
                MAX_TOKEN_TTL_SECS
            )));
        }
        Ok(())
    }

    fn validate_algorithm(algorithm: Algorithm) -> Result<()> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
            other => Err(AuthError::ConfigurationError(format!(
                "unsupported signing algorithm {:?}: only HMAC variants are allowed",
                other
            ))),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source using the environment variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let jwt_secret = var("JWT_SECRET")
            .or_else(|| lookup("JWT_SECRET"))
            .ok_or_else(|| {
                AuthError::ConfigurationError(
                    "TENANT_GATE_JWT_SECRET environment variable is required. \
                     Generate one with: tenant_gate gen-secret"
                        .to_string(),
                )
            })?;

        let mut config = Self::new(jwt_secret)?;

        if let Some(name) = var("JWT_ALGORITHM") {
            let algorithm = Algorithm::from_str(name.trim()).map_err(|_| {
                AuthError::ConfigurationError(format!("unknown signing algorithm '{}'", name))
            })?;
            config = config.with_algorithm(algorithm)?;
        }

        let ttl_secs: i64 = parse_var(&var, "TOKEN_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;
        let ttl = chrono::Duration::try_seconds(ttl_secs).ok_or_else(|| {
            AuthError::ConfigurationError(format!(
                "{}TOKEN_TTL_SECS is out of range: {}",
                ENV_PREFIX, ttl_secs
            ))
        })?;
        config = config.with_token_ttl(ttl)?;

        config.token_leeway_secs =
            parse_var(&var, "TOKEN_LEEWAY_SECS", DEFAULT_TOKEN_LEEWAY_SECS)?;

        config.hashing = HashingConfig::from_lookup(&lookup)?;
        config.pepper = pepper_from_lookup(&lookup);

        config.superadmin = SuperadminPolicy {
            bypass_tenant_scoping: parse_flag(&var, "SUPERADMIN_BYPASS"),
            audit_tenant_scoped: parse_flag(&var, "SUPERADMIN_AUDIT_TENANT_SCOPED"),
        };

        config.permission_cache_size =
            parse_var(&var, "PERMISSION_CACHE_SIZE", DEFAULT_PERMISSION_CACHE_SIZE)?;
        config.permission_cache_ttl = Duration::from_secs(parse_var(
            &var,
            "PERMISSION_CACHE_TTL_SECS",
            DEFAULT_PERMISSION_CACHE_TTL_SECS,
        )?);
        config.min_login_duration = Duration::from_millis(parse_var(
            &var,
            "MIN_LOGIN_DURATION_MS",
            DEFAULT_MIN_LOGIN_DURATION_MS,
        )?);

        Ok(config)
    }
}

/// `TENANT_GATE_PASSWORD_PEPPER`, ignoring an empty value
pub fn pepper_from_lookup<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(&format!("{}PASSWORD_PEPPER", ENV_PREFIX)).filter(|p| !p.is_empty())
}

fn parse_var<T, F>(var: &F, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AuthError::ConfigurationError(format!(
                "{}{} has an invalid value '{}'",
                ENV_PREFIX, name, raw
            ))
        }),
        None => Ok(default),
    }
}

fn parse_flag<F>(var: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(false) // SECURITY: Default to false
}
