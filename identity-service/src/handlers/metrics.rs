use service_core::axum::response::IntoResponse;

/// Prometheus metrics
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus exposition format", body = String)
    ),
    tag = "Observability"
)]
pub async fn metrics() -> impl IntoResponse {
    crate::services::metrics::get_metrics()
}
