/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/register` - register a new user
/// - `GET  /api/v1/auth/verify-email/:token` - consume a verification token
/// - `POST /api/v1/auth/resend-verification` - re-issue a verification token
/// - `POST /api/v1/auth/login` - open a session
/// - `POST /api/v1/auth/refresh` - rotate a refresh token
/// - `POST /api/v1/auth/logout` - close the session (authenticated)
/// - `GET  /api/v1/auth/me` - current user (authenticated)
/// - `POST /api/v1/auth/change-password` - change password (authenticated)
/// - `POST /api/v1/auth/forgot-password` - request a reset token
/// - `POST /api/v1/auth/reset-password/:token` - consume a reset token

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskcamp_shared::auth::password;
use taskcamp_shared::auth::session::{LoginOutcome, Registration, TokenPair};
use taskcamp_shared::models::user::UserProfile;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub full_name: Option<String>,
}

/// Register response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserProfile,
    pub message: &'static str,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Email-only request body (resend verification, forgot password)
#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Change-password request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Reset-password request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn check_password_strength(password: &str) -> ApiResult<()> {
    password::validate_password_strength(password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })
}

/// `POST /api/v1/auth/register`
///
/// Creates an unverified account and emails a verification link. The
/// response never includes tokens; a session requires a verified email.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate().map_err(ApiError::from_validation)?;
    check_password_strength(&req.password)?;

    let user = state
        .sessions
        .register(Registration {
            email: req.email,
            username: req.username.to_lowercase(),
            password: req.password,
            full_name: req.full_name,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "registered successfully, please verify your email",
        }),
    ))
}

/// `GET /api/v1/auth/verify-email/:token`
pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<RegisterResponse>> {
    let user = state.sessions.verify_email(&token).await?;

    Ok(Json(RegisterResponse {
        user,
        message: "email verified successfully",
    }))
}

/// `POST /api/v1/auth/resend-verification`
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    state.sessions.resend_verification(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "verification email sent",
    }))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginOutcome>> {
    req.validate().map_err(ApiError::from_validation)?;

    let outcome = state.sessions.login(&req.email, &req.password).await?;

    Ok(Json(outcome))
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let tokens = state.sessions.refresh(&req.refresh_token).await?;

    Ok(Json(tokens))
}

/// `POST /api/v1/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<MessageResponse>> {
    state.sessions.logout(user.id).await?;

    Ok(Json(MessageResponse {
        message: "logged out successfully",
    }))
}

/// `GET /api/v1/auth/me`
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<UserProfile> {
    Json(user)
}

/// `POST /api/v1/auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    check_password_strength(&req.new_password)?;

    state
        .sessions
        .change_password(
            user.id,
            &req.old_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "password changed successfully",
    }))
}

/// `POST /api/v1/auth/forgot-password`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    req.validate().map_err(ApiError::from_validation)?;

    state.sessions.request_password_reset(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "password reset email sent",
    }))
}

/// `POST /api/v1/auth/reset-password/:token`
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    check_password_strength(&req.new_password)?;

    state
        .sessions
        .reset_password(&token, &req.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "password reset successfully",
    }))
}
