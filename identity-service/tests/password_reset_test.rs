//! Password reset integration tests.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use identity_service::{models::Role, services::NotificationKind};
use serde_json::json;

#[tokio::test]
async fn reset_flow_replaces_password() {
    let app = TestApp::new();
    app.register_verified_independent("judy@example.com", "oldpass1")
        .await;

    let (status, body) = app
        .post_json("/auth/request-password-reset", json!({ "email": "judy@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "If your email is registered, you will receive a password reset link shortly."
    );

    let token = app.last_token("judy@example.com", NotificationKind::PasswordReset);
    let (status, body) = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": token, "password": "newpass1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password has been reset. You can now log in.");

    let (status, _) = app
        .post_json("/auth/login", json!({ "email": "judy@example.com", "password": "oldpass1" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    app.login_token("judy@example.com", "newpass1").await;

    let (status, _) = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": token, "password": "third-pass" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_request_for_unknown_email_looks_identical() {
    let app = TestApp::new();
    app.seed_account("known@example.com", "secret1", Role::Independent, None, true)
        .await;

    let (known_status, known_body) = app
        .post_json("/auth/request-password-reset", json!({ "email": "known@example.com" }))
        .await;
    let (unknown_status, unknown_body) = app
        .post_json("/auth/request-password-reset", json!({ "email": "unknown@example.com" }))
        .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body, unknown_body);
    assert_eq!(app.notifier.sent().len(), 1);
}

#[tokio::test]
async fn reset_does_not_change_verification_state() {
    let app = TestApp::new();
    app.seed_account("kim@example.com", "secret1", Role::Independent, None, false)
        .await;

    app.post_json("/auth/request-password-reset", json!({ "email": "kim@example.com" }))
        .await;
    let token = app.last_token("kim@example.com", NotificationKind::PasswordReset);

    let (status, _) = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": token, "password": "newpass1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.account("kim@example.com").await.unwrap().is_verified);

    let (status, body) = app
        .post_json("/auth/login", json!({ "email": "kim@example.com", "password": "newpass1" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Email address has not been verified");
}

#[tokio::test]
async fn reset_rejects_invite_token() {
    let app = TestApp::new();
    let admin = app
        .seed_account("admin@example.com", "secret1", Role::SuperAdmin, None, true)
        .await;
    let bearer = app.auth_service.codec().issue(&admin).unwrap();
    let (status, _) = app
        .post_json_with_token(
            "/auth/invite",
            json!({ "email": "invitee@example.com", "role": "EMPLOYEE", "fullName": "Inv" }),
            &bearer,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let invite_token = app.last_token("invitee@example.com", NotificationKind::Invite);

    let (status, _) = app
        .post_json(
            "/auth/reset-password",
            json!({ "token": invite_token, "password": "newpass1" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_password_validates_length() {
    let app = TestApp::new();

    let (status, _) = app
        .post_json("/auth/reset-password", json!({ "token": "abc", "password": "short" }))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
