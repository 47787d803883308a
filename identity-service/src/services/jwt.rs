use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, Role};

/// Absolute lifetime of a session bearer token.
pub const SESSION_TTL_MINUTES: i64 = 60;

#[derive(Error, Debug)]
pub enum SessionTokenError {
    #[error("Session token expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),

    #[error("Failed to encode session token: {0}")]
    Encoding(String),
}

/// Claims carried by a session bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (account ID)
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(rename = "tenantId")]
    pub tenant_id: Option<Uuid>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl SessionClaims {
    pub fn for_account(account: &Account, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: account.account_id,
            email: account.email.clone(),
            role: account.role,
            tenant_id: account.tenant_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Signs and verifies session bearer tokens (HS256, process-wide secret).
#[derive(Clone)]
pub struct SessionTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokenCodec {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            ttl: Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    /// Token lifetime in seconds (for client info)
    pub fn expiry_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, account: &Account) -> Result<String, SessionTokenError> {
        self.issue_at(account, Utc::now())
    }

    pub fn issue_at(&self, account: &Account, now: DateTime<Utc>) -> Result<String, SessionTokenError> {
        let claims = SessionClaims::for_account(account, now, self.ttl);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionTokenError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify signature and shape, then fail closed once `now >= exp`.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionTokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below without leeway; the library check allows `now == exp`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| SessionTokenError::Invalid(e.to_string()))?;

        if now.timestamp() >= token_data.claims.exp {
            return Err(SessionTokenError::Expired);
        }

        Ok(token_data.claims)
    }
}
