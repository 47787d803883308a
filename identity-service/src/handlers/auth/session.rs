use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

#[allow(unused_imports)]
use crate::dtos::ErrorResponse;
use crate::{
    dtos::auth::{LoginRequest, LoginResponse},
    utils::{Password, ValidatedJson},
    AppState,
};

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials or email not verified", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .auth_service
        .login(&req.email, Password::new(req.password))
        .await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token: result.access_token,
            user: result.user,
        }),
    ))
}
