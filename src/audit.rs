//! Audit trail of authentication and authorization events
//!
//! The service hands every login outcome and every superadmin bypass to an
//! [`AuditRecorder`]. Recording is best effort: the service logs a failed
//! write and carries on with the outcome it already decided.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::auth::tenant::TenantId;
use crate::auth::user::PrincipalId;
use crate::constants::DEFAULT_MAX_AUDIT_ENTRIES;
use crate::error::{AuthError, Result};

/// What was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Authorize,
    SuperadminBypass,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Authorize => "authorize",
            AuditAction::SuperadminBypass => "superadmin_bypass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// One append-only audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub principal_id: Option<PrincipalId>,
    pub tenant_id: Option<TenantId>,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    /// Failure reason; the error's display text, never a secret
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: AuditAction, outcome: AuditOutcome) -> Self {
        Self {
            principal_id: None,
            tenant_id: None,
            action,
            outcome,
            reason: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    pub fn success(action: AuditAction) -> Self {
        Self::new(action, AuditOutcome::Success)
    }

    pub fn failure(action: AuditAction, reason: impl Into<String>) -> Self {
        let mut entry = Self::new(action, AuditOutcome::Failure);
        entry.reason = Some(reason.into());
        entry
    }

    pub fn principal(mut self, principal: Option<PrincipalId>) -> Self {
        self.principal_id = principal;
        self
    }

    pub fn tenant(mut self, tenant: Option<TenantId>) -> Self {
        self.tenant_id = tenant;
        self
    }

    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    fn counter_key(&self) -> String {
        let outcome = match self.outcome {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
        };
        format!("{}_{}", self.action.as_str(), outcome)
    }
}

/// Write-only sink for audit entries
#[async_trait]
pub trait AuditRecorder: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<()>;
}

/// Bounded in-memory audit log.
///
/// Oldest entries are dropped once `max_entries` is reached. Repeated
/// failures of the same kind raise a `SECURITY ALERT` log line.
pub struct MemoryAuditLog {
    entries: RwLock<VecDeque<AuditEntry>>,
    counts: RwLock<HashMap<String, usize>>,
    alert_thresholds: HashMap<String, usize>,
    max_entries: usize,
    failing: AtomicBool,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_AUDIT_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        let mut alert_thresholds = HashMap::new();
        alert_thresholds.insert("login_failure".to_string(), 5);
        alert_thresholds.insert("authorize_failure".to_string(), 20);
        alert_thresholds.insert("superadmin_bypass_success".to_string(), 1);

        Self {
            entries: RwLock::new(VecDeque::new()),
            counts: RwLock::new(HashMap::new()),
            alert_thresholds,
            max_entries: max_entries.max(1),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `record` fail with `AuditFailure`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the retained entries, oldest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn bump_counter(&self, entry: &AuditEntry) {
        let key = entry.counter_key();
        let mut counts = self.counts.write().await;
        let count = counts.entry(key.clone()).or_insert(0);
        *count += 1;

        if let Some(&threshold) = self.alert_thresholds.get(&key) {
            if *count >= threshold {
                log::error!("SECURITY ALERT: {} events of type '{}' recorded", count, key);
                *count = 0;
            }
        }
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditRecorder for MemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthError::AuditFailure("audit log unavailable".to_string()));
        }

        self.bump_counter(&entry).await;

        let mut entries = self.entries.write().await;
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
        Ok(())
    }
}

/// Recorder writing entries through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditRecorder;

#[async_trait]
impl AuditRecorder for LogAuditRecorder {
    async fn record(&self, entry: AuditEntry) -> Result<()> {
        match entry.outcome {
            AuditOutcome::Success => log::info!(
                "SECURITY: {} succeeded - Principal: {:?}, Tenant: {:?}, IP: {:?}",
                entry.action.as_str(),
                entry.principal_id,
                entry.tenant_id,
                entry.ip_address
            ),
            AuditOutcome::Failure => log::warn!(
                "SECURITY: {} failed - Principal: {:?}, Tenant: {:?}, IP: {:?}, Reason: {}",
                entry.action.as_str(),
                entry.principal_id,
                entry.tenant_id,
                entry.ip_address,
                entry.reason.as_deref().unwrap_or("unspecified")
            ),
        }
        Ok(())
    }
}
