//! Account lifecycle: registration, verification, login, invitations and
//! password reset.
//!
//! Every store and gateway call is bounded by a timeout. Uniqueness pre-checks
//! only produce friendlier errors; the store's constraints decide, and a
//! violation reported at write time maps to the same conflict.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    models::{Account, AccountSummary, Redemption, Role, Tenant, TokenPurpose},
    services::{
        authorization, metrics, AccountRepository, LinkBuilder, Notification, NotificationGateway,
        NotificationKind, ServiceError, SessionClaims, SessionTokenCodec, TokenIssuer, TokenStore,
    },
    utils::{
        dummy_password_hash, generate_temporary_password, hash_password, is_valid_subdomain, normalize_email,
        verify_password, Password, PasswordHashString,
    },
};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Roles allowed to invite users.
pub const INVITER_ROLES: &[Role] = &[Role::SuperAdmin, Role::OrgAdmin];

#[derive(Debug, Clone, Copy)]
pub struct AuthTimeouts {
    pub store: Duration,
    pub notification: Duration,
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self {
            store: Duration::from_secs(5),
            notification: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub access_token: String,
    pub user: AccountSummary,
}

#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    tokens: TokenIssuer,
    notifier: Arc<dyn NotificationGateway>,
    codec: SessionTokenCodec,
    links: LinkBuilder,
    timeouts: AuthTimeouts,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        token_store: Arc<dyn TokenStore>,
        notifier: Arc<dyn NotificationGateway>,
        codec: SessionTokenCodec,
        links: LinkBuilder,
        timeouts: AuthTimeouts,
    ) -> Self {
        Self {
            accounts,
            tokens: TokenIssuer::new(token_store),
            notifier,
            codec,
            links,
            timeouts,
        }
    }

    pub fn codec(&self) -> &SessionTokenCodec {
        &self.codec
    }

    #[tracing::instrument(skip_all)]
    pub async fn register_independent(
        &self,
        email: &str,
        password: Password,
        full_name: &str,
    ) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        check_password(&password)?;

        if self.find_account(&email).await?.is_some() {
            return Err(ServiceError::EmailInUse);
        }

        let password_hash = hash(password).await?;
        let account = Account::new(email, password_hash, full_name.to_string(), Role::Independent, None);

        self.bounded(self.timeouts.store, "insert_account", self.accounts.insert_account(&account))
            .await?;

        metrics::record_registration("independent");
        tracing::info!(account_id = %account.account_id, "Independent account registered");

        self.issue_and_deliver(&account, TokenPurpose::EmailVerification).await
    }

    #[tracing::instrument(skip_all, fields(subdomain = %subdomain))]
    pub async fn register_org(
        &self,
        email: &str,
        password: Password,
        full_name: &str,
        org_name: &str,
        subdomain: &str,
    ) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        check_password(&password)?;
        if !is_valid_subdomain(subdomain) {
            return Err(ServiceError::Validation(
                "subdomain must be lowercase letters and digits separated by single hyphens".to_string(),
            ));
        }

        if self.find_account(&email).await?.is_some() {
            return Err(ServiceError::EmailInUse);
        }

        let existing_tenant = self
            .bounded(
                self.timeouts.store,
                "find_tenant_by_subdomain",
                self.accounts.find_tenant_by_subdomain(subdomain),
            )
            .await?;
        if existing_tenant.is_some() {
            return Err(ServiceError::SubdomainInUse);
        }

        let password_hash = hash(password).await?;
        let tenant = Tenant::new(org_name.to_string(), subdomain.to_string());
        let admin = Account::new(
            email,
            password_hash,
            full_name.to_string(),
            Role::OrgAdmin,
            Some(tenant.tenant_id),
        );

        self.bounded(
            self.timeouts.store,
            "insert_tenant_with_admin",
            self.accounts.insert_tenant_with_admin(&tenant, &admin),
        )
        .await?;

        metrics::record_registration("organization");
        tracing::info!(
            account_id = %admin.account_id,
            tenant_id = %tenant.tenant_id,
            subdomain = %tenant.subdomain,
            "Organization registered"
        );

        self.issue_and_deliver(&admin, TokenPurpose::EmailVerification).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<(), ServiceError> {
        let account_id = self
            .bounded(
                self.timeouts.store,
                "redeem_token",
                self.tokens.consume_valid(token, &Redemption::VerifyEmail),
            )
            .await?;

        tracing::info!(%account_id, "Email verified");
        Ok(())
    }

    /// Unknown and already-verified emails are acknowledged without sending anything.
    #[tracing::instrument(skip_all)]
    pub async fn resend_verification_email(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        let Some(account) = self.find_account(&email).await? else {
            tracing::debug!("Verification resend requested for unknown email");
            return Ok(());
        };

        if account.is_verified {
            tracing::debug!(account_id = %account.account_id, "Verification resend for verified account ignored");
            return Ok(());
        }

        self.issue_and_deliver(&account, TokenPurpose::EmailVerification).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn login(&self, email: &str, password: Password) -> Result<LoginResult, ServiceError> {
        let email = normalize_email(email);

        let Some(account) = self.find_account(&email).await? else {
            verify_unknown_account(password).await?;
            metrics::record_login("invalid_credentials");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify(password, account.password_hash.clone()).await? {
            metrics::record_login("invalid_credentials");
            tracing::info!(account_id = %account.account_id, "Login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !account.is_verified {
            metrics::record_login("unverified");
            return Err(ServiceError::EmailNotVerified);
        }

        let access_token = self.codec.issue(&account)?;

        metrics::record_login("success");
        tracing::info!(account_id = %account.account_id, role = %account.role, "Login succeeded");

        Ok(LoginResult {
            access_token,
            user: account.summary(),
        })
    }

    /// Create an unverified account in the inviter's tenant and send it an
    /// accept-invite link. The temporary password is never disclosed.
    #[tracing::instrument(skip_all, fields(inviter = %inviter.sub, role = %role))]
    pub async fn invite_user(
        &self,
        inviter: &SessionClaims,
        email: &str,
        full_name: &str,
        role: Role,
    ) -> Result<(), ServiceError> {
        authorization::authorize(INVITER_ROLES, inviter.role)?;
        if !inviter.role.can_grant(role) {
            tracing::warn!(inviter = %inviter.sub, requested_role = %role, "Invite rejected: role not grantable");
            return Err(ServiceError::InsufficientPermissions);
        }

        let email = normalize_email(email);
        if self.find_account(&email).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let password_hash = hash(generate_temporary_password()).await?;
        let account = Account::new(email, password_hash, full_name.to_string(), role, inviter.tenant_id);

        self.bounded(self.timeouts.store, "insert_account", self.accounts.insert_account(&account))
            .await
            .map_err(|e| match e {
                ServiceError::EmailInUse => ServiceError::UserAlreadyExists,
                other => other,
            })?;

        tracing::info!(
            account_id = %account.account_id,
            inviter = %inviter.sub,
            role = %role,
            "User invited"
        );

        self.issue_and_deliver(&account, TokenPurpose::Invite).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn accept_invite(&self, token: &str, password: Password) -> Result<(), ServiceError> {
        check_password(&password)?;
        let password_hash = hash(password).await?;

        let account_id = self
            .bounded(
                self.timeouts.store,
                "redeem_token",
                self.tokens
                    .consume_valid(token, &Redemption::AcceptInvite { password_hash }),
            )
            .await?;

        tracing::info!(%account_id, "Invite accepted");
        Ok(())
    }

    /// Unknown emails are acknowledged the same way as known ones.
    #[tracing::instrument(skip_all)]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        let Some(account) = self.find_account(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        self.issue_and_deliver(&account, TokenPurpose::PasswordReset).await
    }

    /// Replace the password. Verification state is left untouched.
    #[tracing::instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, password: Password) -> Result<(), ServiceError> {
        check_password(&password)?;
        let password_hash = hash(password).await?;

        let account_id = self
            .bounded(
                self.timeouts.store,
                "redeem_token",
                self.tokens
                    .consume_valid(token, &Redemption::ResetPassword { password_hash }),
            )
            .await?;

        tracing::info!(%account_id, "Password reset");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.bounded(self.timeouts.store, "health_check", self.accounts.health_check())
            .await
    }

    pub async fn purge_expired_tokens(&self) -> Result<u64, ServiceError> {
        self.bounded(self.timeouts.store, "purge_expired_tokens", self.tokens.purge_expired())
            .await
    }

    async fn find_account(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        self.bounded(
            self.timeouts.store,
            "find_account_by_email",
            self.accounts.find_account_by_email(email),
        )
        .await
    }

    /// Persist a token first, then deliver its link. A failed delivery fails
    /// the operation even though the token (and any new account) is stored;
    /// the resend and reset endpoints are the recovery path.
    async fn issue_and_deliver(&self, account: &Account, purpose: TokenPurpose) -> Result<(), ServiceError> {
        let token = self
            .bounded(
                self.timeouts.store,
                "issue_token",
                self.tokens.issue(account.account_id, purpose),
            )
            .await?;

        let kind = match purpose {
            TokenPurpose::EmailVerification => NotificationKind::EmailVerification,
            TokenPurpose::Invite => NotificationKind::Invite,
            TokenPurpose::PasswordReset => NotificationKind::PasswordReset,
        };

        let notification = Notification {
            to: account.email.clone(),
            recipient_name: account.full_name.clone(),
            kind,
            link: self.links.link(kind, &token),
        };

        match self
            .bounded(
                self.timeouts.notification,
                "deliver_notification",
                self.notifier.deliver(&notification),
            )
            .await
        {
            Ok(()) => {
                metrics::record_notification(kind.as_str(), "success");
                tracing::info!(account_id = %account.account_id, kind = kind.as_str(), "Notification delivered");
                Ok(())
            }
            Err(e) => {
                metrics::record_notification(kind.as_str(), "failure");
                tracing::error!(
                    account_id = %account.account_id,
                    kind = kind.as_str(),
                    error = %e,
                    "Notification delivery failed"
                );
                Err(e)
            }
        }
    }

    async fn bounded<T, E, F>(&self, limit: Duration, operation: &'static str, fut: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<ServiceError>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "Operation timed out");
                Err(ServiceError::Timeout(operation))
            }
        }
    }
}

fn check_password(password: &Password) -> Result<(), ServiceError> {
    if password.as_str().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Argon2 is CPU bound; keep it off the async workers.
async fn hash(password: Password) -> Result<PasswordHashString, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing error: {}", e)))
}

async fn verify(password: Password, password_hash: PasswordHashString) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password verification task failed: {}", e)))
}

/// Runs a full verify against the dummy hash and discards the result.
async fn verify_unknown_account(password: Password) -> Result<(), ServiceError> {
    tokio::task::spawn_blocking(move || {
        verify_password(&password, dummy_password_hash());
    })
    .await
    .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password verification task failed: {}", e)))
}
