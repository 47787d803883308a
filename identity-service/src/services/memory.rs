//! In-process store with the same semantics as the PostgreSQL one.
//!
//! One mutex guards all tables so every check-and-mutate runs as a single
//! critical section, which is what makes uniqueness and single-use redemption
//! hold under concurrent callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{Account, EphemeralToken, Redemption, Tenant};
use crate::services::repository::{AccountRepository, StoreError, TokenStore, UniqueKey};

#[derive(Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    tenants: HashMap<Uuid, Tenant>,
    tokens: HashMap<String, EphemeralToken>,
}

impl Tables {
    fn email_taken(&self, email: &str) -> bool {
        self.accounts.values().any(|a| a.email == email)
    }

    fn subdomain_taken(&self, subdomain: &str) -> bool {
        self.tenants.values().any(|t| t.subdomain == subdomain)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }

    /// Number of stored accounts with this email. Used by tests asserting uniqueness.
    pub fn count_accounts_with_email(&self, email: &str) -> usize {
        self.lock()
            .map(|t| t.accounts.values().filter(|a| a.email == email).count())
            .unwrap_or(0)
    }

    pub fn count_tenants_with_subdomain(&self, subdomain: &str) -> usize {
        self.lock()
            .map(|t| t.tenants.values().filter(|x| x.subdomain == subdomain).count())
            .unwrap_or(0)
    }

    pub fn token_count(&self) -> usize {
        self.lock().map(|t| t.tokens.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.accounts.get(&account_id).cloned())
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.tenants.values().find(|t| t.subdomain == subdomain).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.email_taken(&account.email) {
            return Err(StoreError::UniqueViolation(UniqueKey::Email));
        }
        tables.accounts.insert(account.account_id, account.clone());
        Ok(())
    }

    async fn insert_tenant_with_admin(&self, tenant: &Tenant, admin: &Account) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.subdomain_taken(&tenant.subdomain) {
            return Err(StoreError::UniqueViolation(UniqueKey::Subdomain));
        }
        if tables.email_taken(&admin.email) {
            return Err(StoreError::UniqueViolation(UniqueKey::Email));
        }
        tables.tenants.insert(tenant.tenant_id, tenant.clone());
        tables.accounts.insert(admin.account_id, admin.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, token: &EphemeralToken) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.tokens.contains_key(&token.token) {
            return Err(StoreError::UniqueViolation(UniqueKey::Token));
        }
        tables.tokens.insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn redeem_token(
        &self,
        token: &str,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut tables = self.lock()?;

        let redeemable = tables
            .tokens
            .get(token)
            .is_some_and(|t| t.purpose == redemption.purpose() && t.is_valid_at(now));
        if !redeemable {
            return Ok(None);
        }

        let Some(stored) = tables.tokens.remove(token) else {
            return Ok(None);
        };

        let Some(account) = tables.accounts.get_mut(&stored.account_id) else {
            // Token outlived its account; nothing to apply.
            return Ok(None);
        };

        match redemption {
            Redemption::VerifyEmail => account.is_verified = true,
            Redemption::AcceptInvite { password_hash } => {
                account.password_hash = password_hash.clone();
                account.is_verified = true;
            }
            Redemption::ResetPassword { password_hash } => {
                account.password_hash = password_hash.clone();
            }
        }
        account.updated_utc = now;

        Ok(Some(stored.account_id))
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut tables = self.lock()?;
        let before = tables.tokens.len();
        tables.tokens.retain(|_, t| t.is_valid_at(now));
        Ok((before - tables.tokens.len()) as u64)
    }
}
