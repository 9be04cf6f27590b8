#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tenant_gate::auth::{PermissionCode, Principal, PrincipalId, Tenant, TenantId};
use tenant_gate::{AuthConfig, AuthService, HashingConfig, MemoryAuditLog, MemoryStore};

pub const SECRET: &str = "k9$Vx2mQ7!rT4wZp8#Lc3nB6@hJ1yF5dQ";

/// Config with cheap hashing and no failure padding so tests stay fast
pub fn config() -> AuthConfig {
    AuthConfig::new(SECRET)
        .unwrap()
        .with_hashing(HashingConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .with_min_login_duration(Duration::ZERO)
}

pub fn code(value: &str) -> PermissionCode {
    PermissionCode::new(value).unwrap()
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub audit: Arc<MemoryAuditLog>,
    pub service: Arc<AuthService<MemoryStore, MemoryAuditLog>>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(MemoryAuditLog::new());
        let service =
            AuthService::new(&config, Arc::clone(&store), Arc::clone(&audit)).unwrap();
        Self {
            store,
            audit,
            service: Arc::new(service),
        }
    }

    pub async fn principal(&self, email: &str, secret: &str) -> PrincipalId {
        let hash = self.service.hash_secret(secret).unwrap();
        self.store
            .insert_principal(Principal::new(email, hash))
            .await
            .unwrap()
    }

    pub async fn superadmin(&self, email: &str, secret: &str) -> PrincipalId {
        let hash = self.service.hash_secret(secret).unwrap();
        self.store
            .insert_principal(Principal::new(email, hash).superadmin())
            .await
            .unwrap()
    }

    pub async fn tenant(&self, name: &str, subdomain: &str) -> TenantId {
        self.store
            .insert_tenant(Tenant::new(name, subdomain))
            .await
            .unwrap()
    }
}
