use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

use crate::error::{AuthError, Result};

const MAX_CODE_LEN: usize = 128;

/// Principal identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role held by a principal within a tenant.
///
/// The well-known roles get their own variants; anything else is kept
/// verbatim. What a role may do is decided by the permission resolver's
/// grant table, never by comparing role names in business logic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Owner,
    Finder,
    Admin,
    /// Implicit role assigned by the superadmin bypass branch
    Superadmin,
    Custom(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Owner => "owner",
            Role::Finder => "finder",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
            Role::Custom(name) => name,
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "owner" => Role::Owner,
            "finder" => Role::Finder,
            "admin" => Role::Admin,
            "superadmin" => Role::Superadmin,
            _ => Role::Custom(trimmed.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic authorizable action code, e.g. `user.read`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Creates a validated permission code
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AuthError::InvalidIdentifier(
                "permission code must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_CODE_LEN {
            return Err(AuthError::InvalidIdentifier(format!(
                "permission code length must be <= {}",
                MAX_CODE_LEN
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '_' | '-'))
        {
            return Err(AuthError::InvalidIdentifier(format!(
                "permission code '{}' contains invalid characters",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PermissionCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PermissionCode {
    type Error = AuthError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PermissionCode> for String {
    fn from(code: PermissionCode) -> Self {
        code.0
    }
}

/// Emails are unique case-insensitively; lookups use this form
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An authenticable identity.
///
/// Principals are never deleted; deactivation flips `is_active` so audit
/// entries keep pointing at a real record.
#[derive(Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// PHC-format digest, algorithm tag included
    pub password_hash: String,
    pub is_active: bool,
    pub is_superadmin: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Principal {
    /// Creates an active, non-superadmin principal
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: PrincipalId::new(),
            email: normalize_email(&email.into()),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: password_hash.into(),
            is_active: true,
            is_superadmin: false,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn superadmin(mut self) -> Self {
        self.is_superadmin = true;
        self
    }

    /// "First Last", or the email when no name is recorded
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    /// Soft-deactivate the principal
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("is_superadmin", &self.is_superadmin)
            .field("created_at", &self.created_at)
            .finish()
    }
}
