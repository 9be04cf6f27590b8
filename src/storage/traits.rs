//! Abstract storage interfaces for pluggable backends
//!
//! The core only reads through these traits. Implementations report any
//! backend failure as `AuthError::StorageUnavailable` so callers can retry.

use async_trait::async_trait;

use crate::auth::tenant::{Membership, Tenant, TenantId};
use crate::auth::user::{PermissionCode, Principal, PrincipalId, Role};
use crate::error::Result;

/// Principal lookup
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Find a principal by normalized email
    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>>;
}

/// Tenant lookup
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn find_tenant(&self, tenant: TenantId) -> Result<Option<Tenant>>;

    /// Find a tenant by its unique subdomain slug
    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>>;
}

/// Membership lookup
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// All memberships of a principal, in any order
    async fn memberships_of(&self, principal: PrincipalId) -> Result<Vec<Membership>>;

    /// The membership for one (principal, tenant) pair.
    ///
    /// The default scans `memberships_of`; keyed backends should override it.
    async fn find_membership(
        &self,
        principal: PrincipalId,
        tenant: TenantId,
    ) -> Result<Option<Membership>> {
        Ok(self
            .memberships_of(principal)
            .await?
            .into_iter()
            .find(|membership| membership.tenant_id == tenant))
    }
}

/// Role grant lookup
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Permission codes granted to a role; empty when nothing is granted
    async fn permissions_of_role(&self, role: &Role) -> Result<Vec<PermissionCode>>;
}

/// Everything the authentication service reads
pub trait AuthStore: PrincipalStore + TenantStore + MembershipStore + PermissionStore {}

impl<T> AuthStore for T where T: PrincipalStore + TenantStore + MembershipStore + PermissionStore {}
