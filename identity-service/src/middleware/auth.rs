use service_core::axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{services::SessionClaims, AppState};

/// Middleware to require a valid session bearer token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header")))?;

    let claims = state.auth_service.codec().decode(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    // Store claims in request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor to easily get claims in handlers
pub struct AuthUser(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<SessionClaims>()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authentication required")))?;

        Ok(AuthUser(claims.clone()))
    }
}
