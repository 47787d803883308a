use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{AccountSummary, Role};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIndependentRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret1", min_length = 6)]
    pub password: String,

    #[validate(length(min = 1, message = "Full name is required"))]
    #[schema(example = "Alice")]
    pub full_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOrgRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "founder@acme.io")]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret1", min_length = 6)]
    pub password: String,

    #[validate(length(min = 1, message = "Full name is required"))]
    #[schema(example = "Ada Founder")]
    pub full_name: String,

    #[validate(length(min = 1, message = "Organization name is required"))]
    #[schema(example = "Acme Corp")]
    pub org_name: String,

    /// Lowercase letters and digits separated by single hyphens.
    #[validate(length(min = 1, max = 63, message = "Subdomain must be 1-63 characters"))]
    #[schema(example = "acme-corp", pattern = "^[a-z0-9]+(-[a-z0-9]+)*$")]
    pub subdomain: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    #[schema(example = "3f1c9a0b7d")]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "alice@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret1")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: AccountSummary,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "employee@acme.io")]
    pub email: String,

    pub role: Role,

    #[validate(length(min = 1, message = "Full name is required"))]
    #[schema(example = "Eve Employee")]
    pub full_name: String,
}

/// Body for both accept-invite and reset-password.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "newSecret1", min_length = 6)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    #[schema(example = "ok")]
    pub status: String,
}
