//! Ephemeral token issuance and single-use redemption.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{EphemeralToken, Redemption, TokenPurpose, EPHEMERAL_TOKEN_TTL_MINUTES};
use crate::services::error::ServiceError;
use crate::services::metrics;
use crate::services::repository::TokenStore;

const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct TokenIssuer {
    store: Arc<dyn TokenStore>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            ttl: Duration::minutes(EPHEMERAL_TOKEN_TTL_MINUTES),
        }
    }

    /// Opaque token value: 256 bits from the thread CSPRNG, hex encoded.
    fn generate_value() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    pub async fn issue(&self, account_id: Uuid, purpose: TokenPurpose) -> Result<String, ServiceError> {
        self.issue_at(account_id, purpose, Utc::now()).await
    }

    /// Persist a fresh token for `account_id` and return its raw value.
    pub async fn issue_at(
        &self,
        account_id: Uuid,
        purpose: TokenPurpose,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let token = EphemeralToken::new(Self::generate_value(), account_id, purpose, now, self.ttl);
        self.store.insert_token(&token).await?;

        metrics::record_token_issued(purpose.as_str());
        tracing::debug!(%account_id, purpose = %purpose, expiry_utc = %token.expiry_utc, "Ephemeral token issued");

        Ok(token.token)
    }

    pub async fn consume_valid(&self, token: &str, redemption: &Redemption) -> Result<Uuid, ServiceError> {
        self.consume_valid_at(token, redemption, Utc::now()).await
    }

    /// Redeem `token` exactly once. Unknown, expired, reused and wrong-purpose
    /// tokens are all reported as [`ServiceError::TokenInvalid`].
    pub async fn consume_valid_at(
        &self,
        token: &str,
        redemption: &Redemption,
        now: DateTime<Utc>,
    ) -> Result<Uuid, ServiceError> {
        let purpose = redemption.purpose();
        match self.store.redeem_token(token, redemption, now).await? {
            Some(account_id) => {
                metrics::record_token_redeemed(purpose.as_str(), "success");
                Ok(account_id)
            }
            None => {
                metrics::record_token_redeemed(purpose.as_str(), "invalid");
                Err(ServiceError::TokenInvalid)
            }
        }
    }

    /// Drop expired tokens. Validity is always rechecked at redemption, so this
    /// only reclaims space.
    pub async fn purge_expired(&self) -> Result<u64, ServiceError> {
        let removed = self.store.purge_expired_tokens(Utc::now()).await?;
        tracing::info!(removed, "Purged expired ephemeral tokens");
        Ok(removed)
    }
}
