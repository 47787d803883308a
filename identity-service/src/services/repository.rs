//! Storage seams for accounts, tenants and ephemeral tokens.
//!
//! Uniqueness of emails, subdomains and token values is owned by the store,
//! not by the callers' pre-checks. Implementations report a violated
//! constraint as [`StoreError::UniqueViolation`] so the service can map a
//! lost race to the same conflict a pre-check would have produced.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, EphemeralToken, Redemption, Tenant};

/// Which uniqueness constraint a write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Email,
    Subdomain,
    Token,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0:?}")]
    UniqueViolation(UniqueKey),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Lookup by normalized email.
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError>;

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Create the tenant and its first administrator as one unit of work.
    /// Either both rows exist afterwards or neither does.
    async fn insert_tenant_with_admin(&self, tenant: &Tenant, admin: &Account) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(&self, token: &EphemeralToken) -> Result<(), StoreError>;

    /// Atomically delete `token` if it carries the redemption's purpose and is
    /// still valid at `now`, and apply the redemption to the owning account in
    /// the same unit of work. Returns the account id on success and `None` when
    /// the token is unknown, expired, already used or issued for another
    /// purpose. Among concurrent callers at most one receives `Some`.
    async fn redeem_token(
        &self,
        token: &str,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Remove tokens whose expiry is at or before `now`. Returns the number removed.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
