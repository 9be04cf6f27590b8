use thiserror::Error;

/// Errors produced by the credential and authorization core.
///
/// Login failures never distinguish an unknown email from a wrong secret:
/// both surface as [`AuthError::InvalidCredentials`] with the same message.
#[derive(Debug, Error)]
pub enum AuthError {
    // Credential errors
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account is disabled")]
    AccountDisabled,

    // Tenant errors
    #[error("tenant selection required: principal belongs to several tenants")]
    TenantSelectionRequired,
    #[error("no membership in the requested tenant")]
    NoSuchTenantMembership,

    // Token errors
    #[error("token is malformed: {0}")]
    TokenMalformed(String),
    #[error("token has expired")]
    TokenExpired,
    #[error("token signature is invalid")]
    TokenSignatureInvalid,

    // Authorization errors
    #[error("insufficient permission: {0}")]
    InsufficientPermission(String),

    // Collaborator errors
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("audit recording failed: {0}")]
    AuditFailure(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    // Input errors
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

impl AuthError {
    /// Only storage outages may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// True for the three token rejection causes.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::TokenMalformed(_) | Self::TokenExpired | Self::TokenSignatureInvalid
        )
    }
}

// Generic result type for the crate
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_storage_errors_are_retryable() {
        assert!(AuthError::StorageUnavailable("down".to_string()).is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
        assert!(!AuthError::TokenExpired.is_retryable());
        assert!(!AuthError::ConfigurationError("x".to_string()).is_retryable());
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        assert_eq!(AuthError::InvalidCredentials.to_string(), "invalid credentials");
    }

    #[test]
    fn test_token_errors_are_grouped() {
        assert!(AuthError::TokenExpired.is_token_error());
        assert!(AuthError::TokenSignatureInvalid.is_token_error());
        assert!(AuthError::TokenMalformed("bad".to_string()).is_token_error());
        assert!(!AuthError::NoSuchTenantMembership.is_token_error());
    }
}
