use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

#[allow(unused_imports)]
use crate::dtos::ErrorResponse;
use crate::{
    dtos::{
        auth::{EmailRequest, RegisterIndependentRequest, RegisterOrgRequest, TokenRequest},
        MessageResponse,
    },
    utils::{Password, ValidatedJson},
    AppState,
};

/// Register an independent (tenant-less) account
#[utoipa::path(
    post,
    path = "/auth/register-independent",
    request_body = RegisterIndependentRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = MessageResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 502, description = "Verification email could not be delivered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register_independent(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterIndependentRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .register_independent(&req.email, Password::new(req.password), &req.full_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created. Please verify your email.")),
    ))
}

/// Register an organization together with its first administrator
#[utoipa::path(
    post,
    path = "/auth/register-org",
    request_body = RegisterOrgRequest,
    responses(
        (status = 201, description = "Organization created, verification email sent", body = MessageResponse),
        (status = 400, description = "Malformed subdomain", body = ErrorResponse),
        (status = 409, description = "Email or subdomain already taken", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 502, description = "Verification email could not be delivered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register_org(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterOrgRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .register_org(
            &req.email,
            Password::new(req.password),
            &req.full_name,
            &req.org_name,
            &req.subdomain,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Organization registered. Please verify your email.")),
    ))
}

/// Verify an email address with the emailed token
#[utoipa::path(
    post,
    path = "/auth/verify-email",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.verify_email(&req.token).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Email verified successfully"))))
}

/// Send a fresh verification email
#[utoipa::path(
    post,
    path = "/auth/resend-verification",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request received", body = MessageResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 502, description = "Verification email could not be delivered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.resend_verification_email(&req.email).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "If the account exists and is not yet verified, a new verification email has been sent.",
        )),
    ))
}
