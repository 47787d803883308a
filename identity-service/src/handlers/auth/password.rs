use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

#[allow(unused_imports)]
use crate::dtos::ErrorResponse;
use crate::{
    dtos::{
        auth::{EmailRequest, TokenPasswordRequest},
        MessageResponse,
    },
    utils::{Password, ValidatedJson},
    AppState,
};

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/auth/request-password-reset",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request received", body = MessageResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 502, description = "Reset email could not be delivered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_password_reset(&req.email).await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "If your email is registered, you will receive a password reset link shortly.",
        )),
    ))
}

/// Set a new password with the emailed reset token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = TokenPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .reset_password(&req.token, Password::new(req.password))
        .await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password has been reset. You can now log in.")),
    ))
}
