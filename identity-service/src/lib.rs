pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Environment, IdentityConfig, SwaggerMode};
use crate::services::AuthService;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::auth_health_check,
        handlers::health::health_check,
        handlers::metrics::metrics,
        handlers::auth::registration::register_independent,
        handlers::auth::registration::register_org,
        handlers::auth::registration::verify_email,
        handlers::auth::registration::resend_verification,
        handlers::auth::session::login,
        handlers::auth::invitation::invite_user,
        handlers::auth::invitation::accept_invite,
        handlers::auth::password::request_password_reset,
        handlers::auth::password::reset_password,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterIndependentRequest,
            dtos::auth::RegisterOrgRequest,
            dtos::auth::TokenRequest,
            dtos::auth::EmailRequest,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::InviteRequest,
            dtos::auth::TokenPasswordRequest,
            dtos::auth::HealthCheckResponse,
            models::AccountSummary,
            models::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, verification, login and password reset"),
        (name = "Invitations", description = "Inviting users into a tenant"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IdentityConfig>,
    pub auth_service: AuthService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub password_reset_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // Login route with rate limiting
    let login_route = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Both registration routes share one limiter
    let register_routes = Router::new()
        .route(
            "/auth/register-independent",
            post(handlers::auth::register_independent),
        )
        .route("/auth/register-org", post(handlers::auth::register_org))
        .layer(from_fn_with_state(
            state.register_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Routes that send email on demand
    let email_request_routes = Router::new()
        .route(
            "/auth/request-password-reset",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/auth/resend-verification",
            post(handlers::auth::resend_verification),
        )
        .layer(from_fn_with_state(
            state.password_reset_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Bearer-protected routes; roles are checked per route after the token
    let protected_routes = Router::new()
        .route("/auth/invite", post(handlers::auth::invite_user))
        .route_layer(from_fn(middleware::rbac_middleware))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/auth/health-check", get(handlers::health::auth_health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    let swagger_enabled = state.config.environment == Environment::Dev
        || state.config.swagger.enabled == SwaggerMode::Public;

    if swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Keep the document reachable for clients generating code against it
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .security
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect::<Vec<HeaderValue>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = app
        .route("/auth/verify-email", post(handlers::auth::verify_email))
        .route("/auth/accept-invite", post(handlers::auth::accept_invite))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .merge(login_route)
        .merge(register_routes)
        .merge(email_request_routes)
        .merge(protected_routes)
        .with_state(state.clone())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors);

    Ok(app)
}
