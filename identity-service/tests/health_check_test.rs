//! Health, metrics and API document endpoints.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{test_config, TestApp};
use http_body_util::BodyExt;
use identity_service::config::{Environment, SwaggerMode};
use tower::util::ServiceExt;

#[tokio::test]
async fn auth_health_check_returns_ok() {
    let app = TestApp::new();

    let (status, body) = app.get("/auth/health-check").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn deep_health_check_reports_store() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "identity-service-test");
    assert_eq!(body["checks"]["database"], "up");
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/health-check")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let _ = identity_service::services::metrics::init_metrics();
    let app = TestApp::new();

    // Generate at least one counter sample.
    app.post_json(
        "/auth/login",
        serde_json::json!({ "email": "nobody@example.com", "password": "secret1" }),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("identity_logins_total"));
}

#[tokio::test]
async fn openapi_document_lists_auth_routes() {
    let app = TestApp::new();

    let (status, body) = app.get("/.well-known/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().expect("paths object");
    for path in [
        "/auth/health-check",
        "/auth/register-independent",
        "/auth/register-org",
        "/auth/verify-email",
        "/auth/resend-verification",
        "/auth/login",
        "/auth/invite",
        "/auth/accept-invite",
        "/auth/request-password-reset",
        "/auth/reset-password",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(body["components"]["securitySchemes"]["bearer_auth"].is_object());
    assert!(body["components"]["schemas"]["ErrorResponse"].is_object());
    assert_eq!(
        body["paths"]["/auth/invite"]["post"]["responses"]["401"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/ErrorResponse"
    );
}

#[tokio::test]
async fn docs_are_hidden_in_prod_when_disabled() {
    let mut config = test_config();
    config.environment = Environment::Prod;
    config.swagger.enabled = SwaggerMode::Disabled;
    let app = TestApp::with_config(config);

    let (docs_status, _) = app.get("/docs/").await;
    let (spec_status, _) = app.get("/.well-known/openapi.json").await;

    assert_eq!(docs_status, StatusCode::NOT_FOUND);
    assert_eq!(spec_status, StatusCode::OK);
}
