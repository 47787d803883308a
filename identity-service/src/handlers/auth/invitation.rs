use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

#[allow(unused_imports)]
use crate::dtos::ErrorResponse;
use crate::{
    dtos::{
        auth::{InviteRequest, TokenPasswordRequest},
        MessageResponse,
    },
    middleware::AuthUser,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Invite a user into the caller's tenant
#[utoipa::path(
    post,
    path = "/auth/invite",
    request_body = InviteRequest,
    responses(
        (status = 200, description = "Invite sent", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 403, description = "Caller may not invite this role", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 502, description = "Invite email could not be delivered", body = ErrorResponse)
    ),
    tag = "Invitations",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn invite_user(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<InviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .invite_user(&claims, &req.email, &req.full_name, req.role)
        .await?;

    Ok((StatusCode::OK, Json(MessageResponse::new("Invite sent."))))
}

/// Accept an invite and choose a password
#[utoipa::path(
    post,
    path = "/auth/accept-invite",
    request_body = TokenPasswordRequest,
    responses(
        (status = 200, description = "Invite accepted", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Invitations"
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .accept_invite(&req.token, Password::new(req.password))
        .await?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Invite accepted. You can now log in.")),
    ))
}
