//! PostgreSQL store for identity-service.
//!
//! Uniqueness is enforced by the schema (see `migrations/`): a unique index on
//! `lower(email)`, a unique subdomain constraint and the token primary key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{Account, EphemeralToken, Redemption, Role, Tenant};
use crate::services::repository::{AccountRepository, StoreError, TokenStore, UniqueKey};
use crate::utils::PasswordHashString;

const USERS_EMAIL_CONSTRAINT: &str = "users_email_lower_key";
const TENANTS_SUBDOMAIN_CONSTRAINT: &str = "tenants_subdomain_key";
const TOKENS_PKEY_CONSTRAINT: &str = "ephemeral_tokens_pkey";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

#[derive(FromRow)]
struct AccountRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    full_name: String,
    role_code: String,
    tenant_id: Option<Uuid>,
    email_verified: bool,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role: Role = row.role_code.parse().map_err(StoreError::Internal)?;
        Ok(Account {
            account_id: row.user_id,
            email: row.email,
            password_hash: PasswordHashString::new(row.password_hash),
            full_name: row.full_name,
            role,
            tenant_id: row.tenant_id,
            is_verified: row.email_verified,
            created_utc: row.created_utc,
            updated_utc: row.updated_utc,
        })
    }
}

/// Translate a unique violation into the key it guards; pass everything else through.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let key = match db_err.constraint() {
                Some(USERS_EMAIL_CONSTRAINT) => Some(UniqueKey::Email),
                Some(TENANTS_SUBDOMAIN_CONSTRAINT) => Some(UniqueKey::Subdomain),
                Some(TOKENS_PKEY_CONSTRAINT) => Some(UniqueKey::Token),
                _ => None,
            };
            if let Some(key) = key {
                return StoreError::UniqueViolation(key);
            }
        }
    }
    StoreError::Database(err)
}

impl Database {
    /// Create a new database wrapper from a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_account_with<'e, E>(executor: E, account: &Account) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, password_hash, full_name, role_code, tenant_id, email_verified, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(account.account_id)
        .bind(&account.email)
        .bind(account.password_hash.as_str())
        .bind(&account.full_name)
        .bind(account.role.as_str())
        .bind(account.tenant_id)
        .bind(account.is_verified)
        .bind(account.created_utc)
        .bind(account.updated_utc)
        .execute(executor)
        .await
        .map_err(classify)?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for Database {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_tenant_by_subdomain(&self, subdomain: &str) -> Result<Option<Tenant>, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE subdomain = $1")
            .bind(subdomain)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        Self::insert_account_with(&self.pool, account).await
    }

    async fn insert_tenant_with_admin(&self, tenant: &Tenant, admin: &Account) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tenants (tenant_id, tenant_label, subdomain, logo_url, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant.tenant_id)
        .bind(&tenant.tenant_label)
        .bind(&tenant.subdomain)
        .bind(&tenant.logo_url)
        .bind(tenant.created_utc)
        .bind(tenant.updated_utc)
        .execute(&mut *tx)
        .await
        .map_err(classify)?;

        Self::insert_account_with(&mut *tx, admin).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            StoreError::Database(e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for Database {
    async fn insert_token(&self, token: &EphemeralToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ephemeral_tokens (token, user_id, purpose_code, expiry_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&token.token)
        .bind(token.account_id)
        .bind(token.purpose.as_str())
        .bind(token.expiry_utc)
        .bind(token.created_utc)
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(())
    }

    async fn redeem_token(
        &self,
        token: &str,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // The conditional delete is the single point of truth for "valid and unused":
        // concurrent callers serialize on the row and only one sees it returned.
        let account_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            DELETE FROM ephemeral_tokens
            WHERE token = $1 AND purpose_code = $2 AND expiry_utc > $3
            RETURNING user_id
            "#,
        )
        .bind(token)
        .bind(redemption.purpose().as_str())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(account_id) = account_id else {
            tx.rollback().await?;
            return Ok(None);
        };

        let updated = match redemption {
            Redemption::VerifyEmail => {
                sqlx::query("UPDATE users SET email_verified = TRUE, updated_utc = $2 WHERE user_id = $1")
                    .bind(account_id)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?
            }
            Redemption::AcceptInvite { password_hash } => {
                sqlx::query(
                    "UPDATE users SET password_hash = $2, email_verified = TRUE, updated_utc = $3 WHERE user_id = $1",
                )
                .bind(account_id)
                .bind(password_hash.as_str())
                .bind(now)
                .execute(&mut *tx)
                .await?
            }
            Redemption::ResetPassword { password_hash } => {
                sqlx::query("UPDATE users SET password_hash = $2, updated_utc = $3 WHERE user_id = $1")
                    .bind(account_id)
                    .bind(password_hash.as_str())
                    .bind(now)
                    .execute(&mut *tx)
                    .await?
            }
        };

        if updated.rows_affected() == 0 {
            // Token outlived its account; still consumed.
            tx.commit().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(account_id))
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM ephemeral_tokens WHERE expiry_utc <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
