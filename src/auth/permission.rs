//! Role to permission resolution with a per-role cache
//!
//! Grant sets are materialized once per role and kept in a bounded LRU with
//! a time-to-live. Callers that change grants invalidate the affected role.

use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::auth::user::{PermissionCode, Role};
use crate::config::AuthConfig;
use crate::error::Result;
use crate::storage::PermissionStore;

pub type PermissionSet = Arc<HashSet<PermissionCode>>;

#[derive(Clone)]
struct CachedGrant {
    permissions: PermissionSet,
    loaded_at: Instant,
}

struct GrantCache {
    entries: LruCache<Role, CachedGrant>,
    /// Bumped by every invalidation; a load only fills the cache if it is unchanged
    generation: u64,
}

pub struct PermissionResolver<S> {
    store: Arc<S>,
    cache: Option<Mutex<GrantCache>>,
    ttl: Duration,
}

impl<S: PermissionStore> PermissionResolver<S> {
    /// Create a resolver; a capacity of zero disables caching
    pub fn new(store: Arc<S>, capacity: usize, ttl: Duration) -> Self {
        let cache = NonZeroUsize::new(capacity).map(|cap| {
            Mutex::new(GrantCache {
                entries: LruCache::new(cap),
                generation: 0,
            })
        });
        Self { store, cache, ttl }
    }

    pub fn from_config(store: Arc<S>, config: &AuthConfig) -> Self {
        Self::new(store, config.permission_cache_size, config.permission_cache_ttl)
    }

    /// Permission codes granted to a role; empty when nothing is granted
    pub async fn permissions_of(&self, role: &Role) -> Result<PermissionSet> {
        let mut generation = None;
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().await;
            let fresh = cache
                .entries
                .get(role)
                .filter(|cached| cached.loaded_at.elapsed() < self.ttl)
                .map(|cached| Arc::clone(&cached.permissions));
            match fresh {
                Some(permissions) => return Ok(permissions),
                // Stale or absent
                None => {
                    cache.entries.pop(role);
                    generation = Some(cache.generation);
                }
            }
        }

        // Lock released while the store is queried
        let permissions: PermissionSet =
            Arc::new(self.store.permissions_of_role(role).await?.into_iter().collect());

        if let (Some(cache), Some(started)) = (&self.cache, generation) {
            let mut cache = cache.lock().await;
            if cache.generation == started {
                cache.entries.put(
                    role.clone(),
                    CachedGrant {
                        permissions: Arc::clone(&permissions),
                        loaded_at: Instant::now(),
                    },
                );
            } else {
                log::debug!("Discarding grant set for role {} loaded across an invalidation", role);
            }
        }

        Ok(permissions)
    }

    /// Whether `role` is granted `permission`
    pub async fn authorize(&self, role: &Role, permission: &PermissionCode) -> Result<bool> {
        Ok(self.permissions_of(role).await?.contains(permission))
    }

    /// Drop the cached grant set of one role
    pub async fn invalidate_role(&self, role: &Role) {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().await;
            cache.generation = cache.generation.wrapping_add(1);
            cache.entries.pop(role);
        }
    }

    pub async fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            let mut cache = cache.lock().await;
            cache.generation = cache.generation.wrapping_add(1);
            cache.entries.clear();
        }
    }
}
