//! Tenants and the principal-to-tenant membership relation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::auth::user::{PrincipalId, Role};

/// Tenant identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TenantId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An isolated organizational scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Unique subdomain slug
    pub subdomain: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Back-reference to the creating principal, not an ownership edge
    pub created_by: Option<PrincipalId>,
}

impl Tenant {
    pub fn new(name: impl Into<String>, subdomain: impl Into<String>) -> Self {
        Self {
            id: TenantId::new(),
            name: name.into(),
            subdomain: subdomain.into().trim().to_ascii_lowercase(),
            is_active: true,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    pub fn created_by(mut self, principal: PrincipalId) -> Self {
        self.created_by = Some(principal);
        self
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

/// (principal, tenant, role) relation granting scoped access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub principal_id: PrincipalId,
    pub tenant_id: TenantId,
    pub role: Role,
}

impl Membership {
    pub fn new(principal_id: PrincipalId, tenant_id: TenantId, role: impl Into<Role>) -> Self {
        Self {
            principal_id,
            tenant_id,
            role: role.into(),
        }
    }

    /// Composite key of the relation
    pub fn key(&self) -> (PrincipalId, TenantId) {
        (self.principal_id, self.tenant_id)
    }
}

/// Tenant named by a login request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantHint {
    Id(TenantId),
    Subdomain(String),
}

impl From<TenantId> for TenantHint {
    fn from(id: TenantId) -> Self {
        TenantHint::Id(id)
    }
}

impl fmt::Display for TenantHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantHint::Id(id) => write!(f, "id:{}", id),
            TenantHint::Subdomain(slug) => write!(f, "subdomain:{}", slug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_is_normalized() {
        let tenant = Tenant::new("Acme", "  Acme-Corp ");
        assert_eq!(tenant.subdomain, "acme-corp");
        assert!(tenant.is_active);
        assert!(tenant.created_by.is_none());
    }

    #[test]
    fn test_membership_key() {
        let principal = PrincipalId::new();
        let tenant = TenantId::new();
        let membership = Membership::new(principal, tenant, "owner");
        assert_eq!(membership.key(), (principal, tenant));
        assert_eq!(membership.role, Role::Owner);
    }
}
