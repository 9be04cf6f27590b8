//! In-memory storage implementation for development and testing
//!
//! Keeps principals, tenants, memberships and role grants in maps behind
//! tokio `RwLock`s. Writes are visible to the next read, which is all the
//! authorization path requires.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{MembershipStore, PermissionStore, PrincipalStore, TenantStore};
use crate::auth::tenant::{Membership, Tenant, TenantId};
use crate::auth::user::{normalize_email, PermissionCode, Principal, PrincipalId, Role};
use crate::error::{AuthError, Result};

/// In-memory store implementing every storage trait
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    principals: RwLock<HashMap<PrincipalId, Principal>>,
    emails: RwLock<HashMap<String, PrincipalId>>,
    tenants: RwLock<HashMap<TenantId, Tenant>>,
    subdomains: RwLock<HashMap<String, TenantId>>,
    memberships: RwLock<HashMap<(PrincipalId, TenantId), Role>>,
    grants: RwLock<HashMap<Role, HashSet<PermissionCode>>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage; every read fails while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::StorageUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Register a principal; emails are unique
    pub async fn insert_principal(&self, principal: Principal) -> Result<PrincipalId> {
        let email = normalize_email(&principal.email);
        let id = principal.id;

        let mut emails = self.inner.emails.write().await;
        if emails.contains_key(&email) {
            return Err(AuthError::InvalidIdentifier(format!(
                "email {} already used",
                email
            )));
        }
        emails.insert(email, id);
        self.inner.principals.write().await.insert(id, principal);

        Ok(id)
    }

    /// Replace a principal's password hash (password change)
    pub async fn update_password_hash(&self, principal: PrincipalId, hash: String) -> Result<()> {
        let mut principals = self.inner.principals.write().await;
        let record = principals
            .get_mut(&principal)
            .ok_or_else(|| AuthError::InvalidIdentifier(format!("unknown principal {}", principal)))?;
        record.password_hash = hash;
        Ok(())
    }

    /// Soft-deactivate a principal
    pub async fn deactivate_principal(&self, principal: PrincipalId) -> Result<()> {
        let mut principals = self.inner.principals.write().await;
        let record = principals
            .get_mut(&principal)
            .ok_or_else(|| AuthError::InvalidIdentifier(format!("unknown principal {}", principal)))?;
        record.deactivate();
        Ok(())
    }

    /// Register a tenant; subdomains are unique
    pub async fn insert_tenant(&self, tenant: Tenant) -> Result<TenantId> {
        let id = tenant.id;

        let mut subdomains = self.inner.subdomains.write().await;
        if subdomains.contains_key(&tenant.subdomain) {
            return Err(AuthError::InvalidIdentifier(format!(
                "subdomain {} already used",
                tenant.subdomain
            )));
        }
        subdomains.insert(tenant.subdomain.clone(), id);
        self.inner.tenants.write().await.insert(id, tenant);

        Ok(id)
    }

    pub async fn deactivate_tenant(&self, tenant: TenantId) -> Result<()> {
        let mut tenants = self.inner.tenants.write().await;
        let record = tenants
            .get_mut(&tenant)
            .ok_or_else(|| AuthError::InvalidIdentifier(format!("unknown tenant {}", tenant)))?;
        record.deactivate();
        Ok(())
    }

    /// Set the role of a principal in a tenant, replacing any previous role
    pub async fn set_membership(
        &self,
        principal: PrincipalId,
        tenant: TenantId,
        role: impl Into<Role>,
    ) -> Result<()> {
        if !self.inner.principals.read().await.contains_key(&principal) {
            return Err(AuthError::InvalidIdentifier(format!(
                "unknown principal {}",
                principal
            )));
        }
        if !self.inner.tenants.read().await.contains_key(&tenant) {
            return Err(AuthError::InvalidIdentifier(format!("unknown tenant {}", tenant)));
        }

        self.inner
            .memberships
            .write()
            .await
            .insert((principal, tenant), role.into());
        Ok(())
    }

    /// Remove a membership; returns whether one existed
    pub async fn revoke_membership(&self, principal: PrincipalId, tenant: TenantId) -> bool {
        self.inner
            .memberships
            .write()
            .await
            .remove(&(principal, tenant))
            .is_some()
    }

    /// Grant a permission to a role (idempotent)
    pub async fn grant(&self, role: impl Into<Role>, permission: PermissionCode) {
        self.inner
            .grants
            .write()
            .await
            .entry(role.into())
            .or_default()
            .insert(permission);
    }

    /// Withdraw a permission from a role; returns whether it was granted
    pub async fn revoke_grant(&self, role: &Role, permission: &PermissionCode) -> bool {
        self.inner
            .grants
            .write()
            .await
            .get_mut(role)
            .map(|codes| codes.remove(permission))
            .unwrap_or(false)
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>> {
        self.ensure_available()?;
        let id = match self.inner.emails.read().await.get(&normalize_email(email)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.inner.principals.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn find_tenant(&self, tenant: TenantId) -> Result<Option<Tenant>> {
        self.ensure_available()?;
        Ok(self.inner.tenants.read().await.get(&tenant).cloned())
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>> {
        self.ensure_available()?;
        let slug = subdomain.trim().to_ascii_lowercase();
        let id = match self.inner.subdomains.read().await.get(&slug) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.inner.tenants.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn memberships_of(&self, principal: PrincipalId) -> Result<Vec<Membership>> {
        self.ensure_available()?;
        let memberships = self.inner.memberships.read().await;
        Ok(memberships
            .iter()
            .filter(|((owner, _), _)| *owner == principal)
            .map(|((owner, tenant), role)| Membership::new(*owner, *tenant, role.clone()))
            .collect())
    }

    async fn find_membership(
        &self,
        principal: PrincipalId,
        tenant: TenantId,
    ) -> Result<Option<Membership>> {
        self.ensure_available()?;
        Ok(self
            .inner
            .memberships
            .read()
            .await
            .get(&(principal, tenant))
            .map(|role| Membership::new(principal, tenant, role.clone())))
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn permissions_of_role(&self, role: &Role) -> Result<Vec<PermissionCode>> {
        self.ensure_available()?;
        Ok(self
            .inner
            .grants
            .read()
            .await
            .get(role)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(value: &str) -> PermissionCode {
        PermissionCode::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_principal_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let id = store
            .insert_principal(Principal::new("Bob@X.com", "hash"))
            .await
            .unwrap();

        let found = store.find_principal_by_email(" bob@x.COM").await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert!(store.find_principal_by_email("alice@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.insert_principal(Principal::new("bob@x.com", "h1")).await.unwrap();
        let result = store.insert_principal(Principal::new("BOB@x.com", "h2")).await;
        assert!(matches!(result, Err(AuthError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_duplicate_subdomain_rejected() {
        let store = MemoryStore::new();
        store.insert_tenant(Tenant::new("Acme", "acme")).await.unwrap();
        let result = store.insert_tenant(Tenant::new("Acme 2", "ACME")).await;
        assert!(matches!(result, Err(AuthError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_one_role_per_pair() {
        let store = MemoryStore::new();
        let principal = store.insert_principal(Principal::new("bob@x.com", "h")).await.unwrap();
        let tenant = store.insert_tenant(Tenant::new("Acme", "acme")).await.unwrap();

        store.set_membership(principal, tenant, Role::Finder).await.unwrap();
        store.set_membership(principal, tenant, Role::Owner).await.unwrap();

        let memberships = store.memberships_of(principal).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].role, Role::Owner);
    }

    #[tokio::test]
    async fn test_membership_requires_known_parties() {
        let store = MemoryStore::new();
        let tenant = store.insert_tenant(Tenant::new("Acme", "acme")).await.unwrap();
        let result = store.set_membership(PrincipalId::new(), tenant, Role::Owner).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_grants_are_sets() {
        let store = MemoryStore::new();
        store.grant(Role::Owner, code("user.read")).await;
        store.grant(Role::Owner, code("user.read")).await;
        store.grant(Role::Owner, code("user.write")).await;

        let codes = store.permissions_of_role(&Role::Owner).await.unwrap();
        assert_eq!(codes.len(), 2);
        assert!(store.permissions_of_role(&Role::Finder).await.unwrap().is_empty());

        assert!(store.revoke_grant(&Role::Owner, &code("user.write")).await);
        assert!(!store.revoke_grant(&Role::Finder, &code("user.write")).await);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let result = store.find_principal_by_email("bob@x.com").await;
        assert!(matches!(result, Err(AuthError::StorageUnavailable(_))));
        store.set_unavailable(false);
        assert!(store.find_principal_by_email("bob@x.com").await.unwrap().is_none());
    }
}
