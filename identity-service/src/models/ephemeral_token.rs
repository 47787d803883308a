//! Ephemeral tokens - single-use, short-lived secrets delivered by email.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::PasswordHashString;

/// Lifetime of every ephemeral token.
pub const EPHEMERAL_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
    Invite,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "EMAIL_VERIFICATION",
            TokenPurpose::PasswordReset => "PASSWORD_RESET",
            TokenPurpose::Invite => "INVITE",
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMAIL_VERIFICATION" => Ok(TokenPurpose::EmailVerification),
            "PASSWORD_RESET" => Ok(TokenPurpose::PasswordReset),
            "INVITE" => Ok(TokenPurpose::Invite),
            _ => Err(format!("Invalid token purpose: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EphemeralToken {
    pub token: String,
    pub account_id: Uuid,
    pub purpose: TokenPurpose,
    pub expiry_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl EphemeralToken {
    pub fn new(token: String, account_id: Uuid, purpose: TokenPurpose, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token,
            account_id,
            purpose,
            expiry_utc: now + ttl,
            created_utc: now,
        }
    }

    /// A token is usable strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry_utc
    }
}

/// Account change applied in the same unit of work that deletes the token.
#[derive(Debug, Clone)]
pub enum Redemption {
    /// Mark the account verified.
    VerifyEmail,
    /// Set the invitee's password and mark the account verified.
    AcceptInvite { password_hash: PasswordHashString },
    /// Replace the account password.
    ResetPassword { password_hash: PasswordHashString },
}

impl Redemption {
    /// The only purpose a token may carry to be redeemed this way.
    pub fn purpose(&self) -> TokenPurpose {
        match self {
            Redemption::VerifyEmail => TokenPurpose::EmailVerification,
            Redemption::AcceptInvite { .. } => TokenPurpose::Invite,
            Redemption::ResetPassword { .. } => TokenPurpose::PasswordReset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_invalid_at_exact_expiry() {
        let now = Utc::now();
        let token = EphemeralToken::new(
            "abc".to_string(),
            Uuid::new_v4(),
            TokenPurpose::Invite,
            now,
            Duration::minutes(EPHEMERAL_TOKEN_TTL_MINUTES),
        );

        assert!(token.is_valid_at(now + Duration::minutes(29)));
        assert!(!token.is_valid_at(token.expiry_utc));
        assert!(!token.is_valid_at(now + Duration::minutes(31)));
    }

    #[test]
    fn redemption_is_bound_to_one_purpose() {
        let hash = PasswordHashString::new("$argon2id$stub".to_string());
        assert_eq!(Redemption::VerifyEmail.purpose(), TokenPurpose::EmailVerification);
        assert_eq!(
            Redemption::AcceptInvite { password_hash: hash.clone() }.purpose(),
            TokenPurpose::Invite
        );
        assert_eq!(
            Redemption::ResetPassword { password_hash: hash }.purpose(),
            TokenPurpose::PasswordReset
        );
    }

    #[test]
    fn purpose_parses_storage_code() {
        assert_eq!("INVITE".parse::<TokenPurpose>().unwrap(), TokenPurpose::Invite);
        assert!("REFRESH".parse::<TokenPurpose>().is_err());
    }
}
