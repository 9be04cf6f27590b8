//! Tenant Gate - multi-tenant credential and authorization core
//!
//! Verifies principals' secrets, issues and validates signed session tokens,
//! and resolves what a principal may do inside a specific tenant.

pub mod audit;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod security;
pub mod storage;

// Re-export main components
pub use audit::{AuditAction, AuditEntry, AuditOutcome, AuditRecorder, LogAuditRecorder, MemoryAuditLog};
pub use auth::{
    AuthService, AuthorizedPrincipal, LoginRequest, LoginResponse, PermissionCode, Principal,
    PrincipalId, Role, Tenant, TenantHint, TenantId,
};
pub use config::{AuthConfig, HashingConfig, SuperadminPolicy};
pub use error::{AuthError, Result};
pub use storage::MemoryStore;
