//! Authentication service
//!
//! Orchestrates login (credential check, tenant selection, token minting,
//! audit) and per-request authorization (token decode, principal re-read,
//! current role lookup, permission check).
//!
//! Authorization never trusts the role embedded in a token: the role is
//! re-read for every call so revocations apply before the token expires.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::{AuditAction, AuditEntry, AuditRecorder};
use crate::auth::membership::MembershipResolver;
use crate::auth::password::CredentialVerifier;
use crate::auth::permission::PermissionResolver;
use crate::auth::tenant::{TenantHint, TenantId};
use crate::auth::token::TokenCodec;
use crate::auth::user::{normalize_email, PermissionCode, Principal, PrincipalId, Role};
use crate::config::{AuthConfig, SuperadminPolicy};
use crate::error::{AuthError, Result};
use crate::security::timing::AuthTimer;
use crate::storage::AuthStore;

/// Credentials presented at login
#[derive(Clone)]
pub struct LoginRequest {
    pub email: String,
    pub secret: String,
    /// Tenant to log into; may be omitted when the principal has one membership
    pub tenant: Option<TenantHint>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
            tenant: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn for_tenant(mut self, hint: impl Into<TenantHint>) -> Self {
        self.tenant = Some(hint.into());
        self
    }

    pub fn from_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("tenant", &self.tenant)
            .field("ip_address", &self.ip_address)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Minimal profile returned on login; never carries the hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalProfile {
    pub id: PrincipalId,
    pub name: String,
    pub email: String,
}

impl From<&Principal> for PrincipalProfile {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            name: principal.display_name(),
            email: principal.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub subject: String,
    pub role: Role,
    pub tenant: Option<TenantId>,
    pub expires_at: DateTime<Utc>,
    pub profile: PrincipalProfile,
}

/// Outcome of a successful authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedPrincipal {
    pub principal_id: PrincipalId,
    pub email: String,
    pub tenant: Option<TenantId>,
    /// Role read from storage for this call
    pub role: Role,
    /// Granted through the superadmin branch rather than a membership
    pub superadmin_bypass: bool,
}

struct LoginGrant {
    principal: Principal,
    tenant: Option<TenantId>,
    role: Role,
}

/// Who and where a login attempt got to before it ended, for the audit entry
#[derive(Default)]
struct LoginTrace {
    principal: Option<PrincipalId>,
    tenant: Option<TenantId>,
}

pub struct AuthService<S, A> {
    store: Arc<S>,
    audit: Arc<A>,
    verifier: CredentialVerifier,
    codec: TokenCodec,
    memberships: MembershipResolver<S>,
    permissions: PermissionResolver<S>,
    superadmin: SuperadminPolicy,
    min_login_duration: Duration,
}

impl<S, A> AuthService<S, A>
where
    S: AuthStore,
    A: AuditRecorder,
{
    /// Build the service; fails on unusable secret or hashing parameters
    pub fn new(config: &AuthConfig, store: Arc<S>, audit: Arc<A>) -> Result<Self> {
        let verifier = CredentialVerifier::from_config(config)?;
        let codec = TokenCodec::from_config(config)?;

        if config.superadmin.bypass_tenant_scoping {
            log::warn!("SECURITY: Superadmin bypass of tenant scoping is enabled");
        }

        Ok(Self {
            memberships: MembershipResolver::new(Arc::clone(&store)),
            permissions: PermissionResolver::from_config(Arc::clone(&store), config),
            store,
            audit,
            verifier,
            codec,
            superadmin: config.superadmin,
            min_login_duration: config.min_login_duration,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub fn memberships(&self) -> &MembershipResolver<S> {
        &self.memberships
    }

    /// Permission resolver; invalidate through it after changing grants
    pub fn permissions(&self) -> &PermissionResolver<S> {
        &self.permissions
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Hash a secret with the configured cost and pepper
    pub fn hash_secret(&self, plain_secret: &str) -> Result<String> {
        self.verifier.hash(plain_secret)
    }

    /// Authenticate a principal and issue a tenant-scoped session token
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let timer = AuthTimer::start(self.min_login_duration);
        let mut trace = LoginTrace::default();

        let result = self.try_login(&request, &mut trace).await;

        let entry = match &result {
            Ok(_) => AuditEntry::success(AuditAction::Login),
            Err(error) => {
                log::warn!(
                    "SECURITY: Authentication failed - Principal: {:?}, IP: {:?}, Reason: {}",
                    trace.principal,
                    request.ip_address,
                    error
                );
                AuditEntry::failure(AuditAction::Login, error.to_string())
            }
        };
        self.record(
            entry
                .principal(trace.principal)
                .tenant(trace.tenant)
                .client(request.ip_address.clone(), request.user_agent.clone()),
        )
        .await;

        if result.is_err() {
            timer.wait().await;
        }
        result
    }

    async fn try_login(&self, request: &LoginRequest, trace: &mut LoginTrace) -> Result<LoginResponse> {
        let grant = self.authenticate(request, trace).await?;
        trace.tenant = grant.tenant;

        let issued_at = Utc::now().trunc_subsecs(0);
        let ttl = self.codec.default_ttl();
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::ConfigurationError("token ttl overflows the clock".to_string())
        })?;
        let subject = grant.principal.email.as_str();
        let token = match grant.tenant {
            Some(tenant) => self
                .codec
                .mint_for_tenant(subject, tenant, &grant.role, issued_at, ttl)?,
            None => self.codec.mint(subject, issued_at, ttl)?,
        };

        log::info!(
            "SECURITY: Authentication success - Principal: {}, Tenant: {:?}, Role: {}",
            grant.principal.id,
            grant.tenant,
            grant.role
        );

        Ok(LoginResponse {
            token,
            subject: grant.principal.email.clone(),
            role: grant.role,
            tenant: grant.tenant,
            expires_at,
            profile: PrincipalProfile::from(&grant.principal),
        })
    }

    async fn authenticate(&self, request: &LoginRequest, trace: &mut LoginTrace) -> Result<LoginGrant> {
        let email = normalize_email(&request.email);

        let principal = match self.store.find_principal_by_email(&email).await? {
            Some(principal) => principal,
            None => {
                // Same hashing work as a real mismatch
                self.verifier.verify_dummy(&request.secret);
                return Err(AuthError::InvalidCredentials);
            }
        };
        trace.principal = Some(principal.id);

        let secret_ok = self.verifier.verify(&request.secret, &principal.password_hash);
        if !secret_ok || !principal.is_active {
            if secret_ok {
                log::debug!("Login refused for inactive principal {}", principal.id);
            }
            return Err(AuthError::InvalidCredentials);
        }

        if self.bypasses_tenant_scoping(&principal) {
            let tenant = match &request.tenant {
                Some(hint) => Some(
                    self.memberships
                        .resolve_tenant(hint)
                        .await?
                        .ok_or(AuthError::NoSuchTenantMembership)?
                        .id,
                ),
                None => None,
            };
            self.record_bypass(
                &principal,
                tenant,
                AuditAction::Login,
                request.ip_address.clone(),
                request.user_agent.clone(),
            )
            .await;
            return Ok(LoginGrant {
                principal,
                tenant,
                role: Role::Superadmin,
            });
        }

        let (tenant, role) = match &request.tenant {
            Some(hint) => {
                let tenant = self
                    .memberships
                    .resolve_tenant(hint)
                    .await?
                    .ok_or(AuthError::NoSuchTenantMembership)?;
                trace.tenant = Some(tenant.id);
                let role = self.memberships.role_of(principal.id, tenant.id).await?;
                (tenant.id, role)
            }
            None => {
                let mut memberships = self.memberships.memberships_of(principal.id).await?;
                match memberships.len() {
                    0 => return Err(AuthError::NoSuchTenantMembership),
                    1 => {
                        let membership = memberships.remove(0);
                        (membership.tenant_id, membership.role)
                    }
                    _ => return Err(AuthError::TenantSelectionRequired),
                }
            }
        };

        Ok(LoginGrant {
            principal,
            tenant: Some(tenant),
            role,
        })
    }

    /// Authorize a request in the tenant its token was issued for
    pub async fn authorize(&self, token: &str, permission: &PermissionCode) -> Result<AuthorizedPrincipal> {
        let claims = self.codec.decode(token)?;
        let principal = self.current_principal(&claims.sub, claims.tenant).await?;
        self.authorize_principal(principal, claims.tenant, permission).await
    }

    /// Authorize a request in an explicit tenant context
    pub async fn authorize_in(
        &self,
        token: &str,
        tenant: TenantId,
        permission: &PermissionCode,
    ) -> Result<AuthorizedPrincipal> {
        let claims = self.codec.decode(token)?;
        let principal = self.current_principal(&claims.sub, Some(tenant)).await?;
        self.authorize_principal(principal, Some(tenant), permission).await
    }

    async fn current_principal(&self, subject: &str, tenant: Option<TenantId>) -> Result<Principal> {
        match self.store.find_principal_by_email(subject).await? {
            Some(principal) if principal.is_active => Ok(principal),
            other => {
                log::warn!("SECURITY: Token presented for disabled or unknown principal");
                let error = AuthError::AccountDisabled;
                self.record_denial(other.map(|principal| principal.id), tenant, &error)
                    .await;
                Err(error)
            }
        }
    }

    async fn authorize_principal(
        &self,
        principal: Principal,
        tenant: Option<TenantId>,
        permission: &PermissionCode,
    ) -> Result<AuthorizedPrincipal> {
        if self.bypasses_tenant_scoping(&principal) {
            if let Some(tenant) = tenant {
                if self.memberships.resolve_tenant(&TenantHint::Id(tenant)).await?.is_none() {
                    let error = AuthError::NoSuchTenantMembership;
                    self.record_denial(Some(principal.id), Some(tenant), &error).await;
                    return Err(error);
                }
            }
            self.record_bypass(&principal, tenant, AuditAction::Authorize, None, None)
                .await;

            return Ok(AuthorizedPrincipal {
                principal_id: principal.id,
                email: principal.email,
                tenant,
                role: Role::Superadmin,
                superadmin_bypass: true,
            });
        }

        let tenant = match tenant {
            Some(tenant) => tenant,
            None => {
                let error = AuthError::TenantSelectionRequired;
                self.record_denial(Some(principal.id), None, &error).await;
                return Err(error);
            }
        };
        let role = match self.memberships.role_of(principal.id, tenant).await {
            Ok(role) => role,
            Err(error) => {
                if !error.is_retryable() {
                    self.record_denial(Some(principal.id), Some(tenant), &error).await;
                }
                return Err(error);
            }
        };

        if !self.permissions.authorize(&role, permission).await? {
            let error = AuthError::InsufficientPermission(permission.to_string());
            log::warn!(
                "SECURITY: Permission denied - Principal: {}, Tenant: {}, Role: {}, Permission: {}",
                principal.id,
                tenant,
                role,
                permission
            );
            self.record_denial(Some(principal.id), Some(tenant), &error).await;
            return Err(error);
        }

        Ok(AuthorizedPrincipal {
            principal_id: principal.id,
            email: principal.email,
            tenant: Some(tenant),
            role,
            superadmin_bypass: false,
        })
    }

    fn bypasses_tenant_scoping(&self, principal: &Principal) -> bool {
        principal.is_superadmin && self.superadmin.bypass_tenant_scoping
    }

    async fn record_bypass(
        &self,
        principal: &Principal,
        tenant: Option<TenantId>,
        action: AuditAction,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) {
        log::warn!(
            "SECURITY: Superadmin bypass - Principal: {}, Tenant: {:?}, Action: {}",
            principal.id,
            tenant,
            action.as_str()
        );
        let entry = AuditEntry::success(AuditAction::SuperadminBypass)
            .principal(Some(principal.id))
            .tenant(tenant.filter(|_| self.superadmin.audit_tenant_scoped))
            .client(ip_address, user_agent);
        self.record(entry).await;
    }

    async fn record_denial(
        &self,
        principal: Option<PrincipalId>,
        tenant: Option<TenantId>,
        error: &AuthError,
    ) {
        let entry = AuditEntry::failure(AuditAction::Authorize, error.to_string())
            .principal(principal)
            .tenant(tenant);
        self.record(entry).await;
    }

    // Audit writes never change the outcome handed to the caller.
    async fn record(&self, entry: AuditEntry) {
        if let Err(error) = self.audit.record(entry).await {
            log::error!("Failed to record audit entry: {}", error);
        }
    }
}
