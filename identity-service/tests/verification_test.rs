//! Email verification and resend integration tests.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use identity_service::{models::Role, services::NotificationKind};
use serde_json::json;

async fn register(app: &TestApp, email: &str) {
    let (status, _) = app
        .post_json(
            "/auth/register-independent",
            json!({ "email": email, "password": "secret1", "fullName": "Test" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn verify_email_marks_account_verified_once() {
    let app = TestApp::new();
    register(&app, "carol@example.com").await;
    let token = app.last_token("carol@example.com", NotificationKind::EmailVerification);

    let (status, body) = app
        .post_json("/auth/verify-email", json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email verified successfully");
    assert!(app.account("carol@example.com").await.unwrap().is_verified);

    let (status, body) = app
        .post_json("/auth/verify-email", json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn verify_email_rejects_unknown_token() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json("/auth/verify-email", json!({ "token": "deadbeef" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verify_email_rejects_token_issued_for_another_purpose() {
    let app = TestApp::new();
    app.seed_account("dave@example.com", "secret1", Role::Independent, None, false)
        .await;

    let (status, _) = app
        .post_json("/auth/request-password-reset", json!({ "email": "dave@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset_token = app.last_token("dave@example.com", NotificationKind::PasswordReset);

    let (status, _) = app
        .post_json("/auth/verify-email", json!({ "token": reset_token }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!app.account("dave@example.com").await.unwrap().is_verified);

    // The reset token survives the mismatched attempt.
    let (status, _) = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": reset_token, "password": "newsecret" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn resend_issues_a_fresh_token_and_old_one_stays_valid() {
    let app = TestApp::new();
    register(&app, "erin@example.com").await;
    let first = app.last_token("erin@example.com", NotificationKind::EmailVerification);

    let (status, _) = app
        .post_json("/auth/resend-verification", json!({ "email": "erin@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let second = app.last_token("erin@example.com", NotificationKind::EmailVerification);
    assert_ne!(first, second);
    assert_eq!(app.notifier.sent().len(), 2);

    let (status, _) = app
        .post_json("/auth/verify-email", json!({ "token": first }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn resend_is_silent_for_unknown_and_verified_emails() {
    let app = TestApp::new();
    app.seed_account("verified@example.com", "secret1", Role::Independent, None, true)
        .await;

    let (unknown_status, unknown_body) = app
        .post_json("/auth/resend-verification", json!({ "email": "ghost@example.com" }))
        .await;
    let (verified_status, verified_body) = app
        .post_json("/auth/resend-verification", json!({ "email": "verified@example.com" }))
        .await;

    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(verified_status, StatusCode::OK);
    assert_eq!(unknown_body, verified_body);
    assert!(app.notifier.sent().is_empty());
}
