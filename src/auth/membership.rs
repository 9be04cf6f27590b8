//! Tenant membership resolution
//!
//! Answers which tenants a principal belongs to and with which role. Only
//! active tenants count; a membership in a deactivated tenant behaves as if
//! it did not exist.

use std::sync::Arc;

use crate::auth::tenant::{Membership, Tenant, TenantHint, TenantId};
use crate::auth::user::{PrincipalId, Role};
use crate::error::{AuthError, Result};
use crate::storage::{MembershipStore, TenantStore};

pub struct MembershipResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for MembershipResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> MembershipResolver<S>
where
    S: MembershipStore + TenantStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Memberships of a principal in active tenants, possibly empty
    pub async fn memberships_of(&self, principal: PrincipalId) -> Result<Vec<Membership>> {
        let memberships = self.store.memberships_of(principal).await?;

        let mut active = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if self.active_tenant(membership.tenant_id).await?.is_some() {
                active.push(membership);
            }
        }
        Ok(active)
    }

    /// Current role of a principal in a tenant
    pub async fn role_of(&self, principal: PrincipalId, tenant: TenantId) -> Result<Role> {
        let membership = self
            .store
            .find_membership(principal, tenant)
            .await?
            .ok_or(AuthError::NoSuchTenantMembership)?;

        if self.active_tenant(tenant).await?.is_none() {
            log::debug!("Membership of {} in inactive tenant {} ignored", principal, tenant);
            return Err(AuthError::NoSuchTenantMembership);
        }

        Ok(membership.role)
    }

    /// Resolve a login hint to an active tenant
    pub async fn resolve_tenant(&self, hint: &TenantHint) -> Result<Option<Tenant>> {
        let tenant = match hint {
            TenantHint::Id(id) => self.store.find_tenant(*id).await?,
            TenantHint::Subdomain(slug) => self.store.find_tenant_by_subdomain(slug).await?,
        };
        Ok(tenant.filter(|tenant| tenant.is_active))
    }

    async fn active_tenant(&self, tenant: TenantId) -> Result<Option<Tenant>> {
        self.resolve_tenant(&TenantHint::Id(tenant)).await
    }
}
