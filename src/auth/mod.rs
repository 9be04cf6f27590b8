//! Credential verification, session tokens, tenant membership and permissions

pub mod membership;
pub mod password;
pub mod permission;
pub mod service;
pub mod tenant;
pub mod token;
pub mod user;

// Re-export main components
pub use membership::MembershipResolver;
pub use password::CredentialVerifier;
pub use permission::{PermissionResolver, PermissionSet};
pub use service::{AuthService, AuthorizedPrincipal, LoginRequest, LoginResponse, PrincipalProfile};
pub use tenant::{Membership, Tenant, TenantHint, TenantId};
pub use token::{extract_bearer_token, SessionClaims, TokenCodec};
pub use user::{normalize_email, PermissionCode, Principal, PrincipalId, Role};
