//! Test helpers for identity-service integration tests.
//!
//! Builds the real router over the in-memory store and a recording
//! notification gateway, and drives it with `oneshot` requests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use identity_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, IdentityConfig, JwtConfig, NotificationConfig, NotificationProvider,
        RateLimitConfig, SecurityConfig, SwaggerConfig, SwaggerMode,
    },
    models::{Account, Role},
    services::{
        AccountRepository, AuthService, AuthTimeouts, LinkBuilder, MemoryStore, MockNotificationGateway,
        NotificationKind, SessionTokenCodec,
    },
    utils::{hash_password, Password},
    AppState,
};
use secrecy::SecretString;
use serde_json::Value;
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-signing-secret-0123456789abcdef";
pub const FRONTEND_URL: &str = "https://app.example.com";

pub fn test_config() -> IdentityConfig {
    IdentityConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://localhost/identity_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        jwt: JwtConfig {
            secret: SecretString::new(TEST_SECRET.to_string()),
        },
        frontend_url: FRONTEND_URL.to_string(),
        notification: NotificationConfig {
            provider: NotificationProvider::Smtp,
            from: "Identity <no-reply@example.com>".to_string(),
            timeout_seconds: 5,
            smtp: None,
            resend: None,
        },
        store_timeout_seconds: 5,
        request_timeout_seconds: 30,
        security: SecurityConfig {
            allowed_origins: vec![FRONTEND_URL.to_string()],
        },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Public,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            register_attempts: 100,
            register_window_seconds: 60,
            password_reset_attempts: 100,
            password_reset_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub notifier: MockNotificationGateway,
    pub auth_service: AuthService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: IdentityConfig) -> Self {
        let store = MemoryStore::new();
        let notifier = MockNotificationGateway::new();
        let auth_service = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(notifier.clone()),
            SessionTokenCodec::new(&config.jwt.secret),
            LinkBuilder::new(&config.frontend_url),
            AuthTimeouts::default(),
        );

        let state = AppState {
            login_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.login_attempts,
                config.rate_limit.login_window_seconds,
            ),
            register_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.register_attempts,
                config.rate_limit.register_window_seconds,
            ),
            password_reset_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.password_reset_attempts,
                config.rate_limit.password_reset_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.global_ip_limit,
                config.rate_limit.global_ip_window_seconds,
            ),
            config: Arc::new(config),
            auth_service: auth_service.clone(),
        };

        let router = build_router(state).expect("Failed to build router");

        Self {
            router,
            store,
            notifier,
            auth_service,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(path, body, None)).await
    }

    pub async fn post_json_with_token(&self, path: &str, body: Value, token: &str) -> (StatusCode, Value) {
        self.send(json_request(path, body, Some(token))).await
    }

    /// Insert an account directly into the store, bypassing registration.
    pub async fn seed_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        tenant_id: Option<Uuid>,
        verified: bool,
    ) -> Account {
        let hash = hash_password(&Password::new(password.to_string())).expect("Failed to hash password");
        let mut account = Account::new(email.to_string(), hash, "Seeded User".to_string(), role, tenant_id);
        account.is_verified = verified;
        self.store
            .insert_account(&account)
            .await
            .expect("Failed to seed account");
        account
    }

    pub async fn account(&self, email: &str) -> Option<Account> {
        self.store
            .find_account_by_email(email)
            .await
            .expect("Failed to read account")
    }

    pub fn last_token(&self, email: &str, kind: NotificationKind) -> String {
        self.notifier
            .last_token(email, kind)
            .unwrap_or_else(|| panic!("No {:?} notification sent to {}", kind, email))
    }

    /// Register an independent account, then redeem its verification token.
    pub async fn register_verified_independent(&self, email: &str, password: &str) {
        let (status, _) = self
            .post_json(
                "/auth/register-independent",
                serde_json::json!({ "email": email, "password": password, "fullName": "Test User" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let token = self.last_token(email, NotificationKind::EmailVerification);
        let (status, _) = self
            .post_json("/auth/verify-email", serde_json::json!({ "token": token }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post_json(
                "/auth/login",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["accessToken"]
            .as_str()
            .expect("accessToken missing")
            .to_string()
    }
}

pub fn json_request(path: &str, body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
