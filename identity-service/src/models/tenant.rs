//! Tenant model - organization boundary addressed by its subdomain.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Tenant entity.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tenant {
    pub tenant_id: Uuid,
    pub tenant_label: String,
    pub subdomain: String,
    pub logo_url: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant.
    pub fn new(tenant_label: String, subdomain: String) -> Self {
        let now = Utc::now();
        Self {
            tenant_id: Uuid::new_v4(),
            tenant_label,
            subdomain,
            logo_url: None,
            created_utc: now,
            updated_utc: now,
        }
    }
}
