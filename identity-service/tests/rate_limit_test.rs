//! Per-route IP rate limiting.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{test_config, TestApp};
use tower::util::ServiceExt;

fn login_from(ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(
            r#"{"email":"nobody@example.com","password":"secret1"}"#,
        ))
        .unwrap()
}

#[tokio::test]
async fn login_is_limited_per_ip() {
    let mut config = test_config();
    config.rate_limit.login_attempts = 2;
    config.rate_limit.login_window_seconds = 3600;
    let app = TestApp::with_config(config);

    for _ in 0..2 {
        let response = app.router.clone().oneshot(login_from("203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let limited = app.router.clone().oneshot(login_from("203.0.113.7")).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(header::RETRY_AFTER));

    // Another client is unaffected.
    let other = app.router.clone().oneshot(login_from("203.0.113.8")).await.unwrap();
    assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_limit_does_not_apply_to_other_routes() {
    let mut config = test_config();
    config.rate_limit.login_attempts = 1;
    let app = TestApp::with_config(config);

    app.router.clone().oneshot(login_from("198.51.100.1")).await.unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/health-check")
                .header("x-forwarded-for", "198.51.100.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
