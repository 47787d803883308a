//! Account model - identity records, optionally bound to a tenant.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Role;
use crate::utils::PasswordHashString;

/// Account entity. `email` is stored normalized and is unique system-wide.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: Uuid,
    pub email: String,
    pub password_hash: PasswordHashString,
    pub full_name: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub is_verified: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Account {
    /// Create a new, unverified account.
    pub fn new(
        email: String,
        password_hash: PasswordHashString,
        full_name: String,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            account_id: Uuid::new_v4(),
            email,
            password_hash,
            full_name,
            role,
            tenant_id,
            is_verified: false,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Public view of the account; never carries the password hash.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.account_id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
            tenant_id: self.tenant_id,
        }
    }
}

/// Account summary returned by login.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "Alice")]
    pub full_name: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accounts_start_unverified() {
        let account = Account::new(
            "alice@example.com".to_string(),
            PasswordHashString::new("$argon2id$stub".to_string()),
            "Alice".to_string(),
            Role::Independent,
            None,
        );
        assert!(!account.is_verified);
        assert_eq!(account.created_utc, account.updated_utc);
    }

    #[test]
    fn summary_serializes_camel_case_without_hash() {
        let tenant_id = Uuid::new_v4();
        let account = Account::new(
            "bob@acme.io".to_string(),
            PasswordHashString::new("$argon2id$stub".to_string()),
            "Bob".to_string(),
            Role::OrgAdmin,
            Some(tenant_id),
        );

        let json = serde_json::to_value(account.summary()).unwrap();
        assert_eq!(json["fullName"], "Bob");
        assert_eq!(json["role"], "ORG_ADMIN");
        assert_eq!(json["tenantId"], tenant_id.to_string());
        assert!(!json.to_string().contains("argon2"));
    }
}
