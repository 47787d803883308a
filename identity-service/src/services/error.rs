use service_core::error::AppError;
use thiserror::Error;

use crate::services::jwt::SessionTokenError;
use crate::services::notification::NotificationError;
use crate::services::repository::{StoreError, UniqueKey};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Email is already registered")]
    EmailInUse,

    #[error("Subdomain is already taken")]
    SubdomainInUse,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Failed to deliver notification: {0}")]
    NotificationDeliveryFailed(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Operation timed out: {0}")]
    Timeout(&'static str),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    /// A unique violation that slipped past a pre-check is the same conflict
    /// the pre-check reports. Token collisions are not a caller error.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(UniqueKey::Email) => ServiceError::EmailInUse,
            StoreError::UniqueViolation(UniqueKey::Subdomain) => ServiceError::SubdomainInUse,
            other => ServiceError::Store(other),
        }
    }
}

impl From<NotificationError> for ServiceError {
    fn from(err: NotificationError) -> Self {
        ServiceError::NotificationDeliveryFailed(err.to_string())
    }
}

impl From<SessionTokenError> for ServiceError {
    fn from(err: SessionTokenError) -> Self {
        ServiceError::Internal(anyhow::anyhow!(err))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::EmailInUse
            | ServiceError::SubdomainInUse
            | ServiceError::UserAlreadyExists => AppError::Conflict(anyhow::anyhow!(err.to_string())),
            ServiceError::InvalidCredentials | ServiceError::EmailNotVerified => {
                AppError::AuthError(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::TokenInvalid | ServiceError::Validation(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::InsufficientPermissions => AppError::Forbidden(anyhow::anyhow!(err.to_string())),
            ServiceError::NotificationDeliveryFailed(_) => {
                AppError::BadGateway("Failed to deliver notification email".to_string())
            }
            ServiceError::Timeout(_) => {
                AppError::ServiceUnavailable("Upstream dependency timed out, retry later".to_string())
            }
            ServiceError::Store(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::http::StatusCode;

    #[test]
    fn unique_violations_become_conflicts() {
        let email: ServiceError = StoreError::UniqueViolation(UniqueKey::Email).into();
        let subdomain: ServiceError = StoreError::UniqueViolation(UniqueKey::Subdomain).into();
        let token: ServiceError = StoreError::UniqueViolation(UniqueKey::Token).into();

        assert!(matches!(email, ServiceError::EmailInUse));
        assert!(matches!(subdomain, ServiceError::SubdomainInUse));
        assert!(matches!(token, ServiceError::Store(_)));
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (ServiceError::EmailInUse, StatusCode::CONFLICT),
            (ServiceError::UserAlreadyExists, StatusCode::CONFLICT),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::EmailNotVerified, StatusCode::UNAUTHORIZED),
            (ServiceError::TokenInvalid, StatusCode::BAD_REQUEST),
            (ServiceError::InsufficientPermissions, StatusCode::FORBIDDEN),
            (
                ServiceError::NotificationDeliveryFailed("smtp down".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (ServiceError::Timeout("store"), StatusCode::SERVICE_UNAVAILABLE),
            (
                ServiceError::Store(StoreError::Internal("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status_code(), status);
        }
    }
}
