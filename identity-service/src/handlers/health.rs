use service_core::{
    axum::{extract::State, Json},
    error::AppError,
};

use crate::{dtos::auth::HealthCheckResponse, AppState};

/// Liveness check for the auth routes
#[utoipa::path(
    get,
    path = "/auth/health-check",
    responses(
        (status = 200, description = "Service is up", body = HealthCheckResponse)
    ),
    tag = "Observability"
)]
pub async fn auth_health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Service health check including the account store
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Account store unreachable"),
        (status = 503, description = "Account store timed out")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.auth_service.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Account store health check failed");
        AppError::from(e)
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "database": "up"
        }
    })))
}
