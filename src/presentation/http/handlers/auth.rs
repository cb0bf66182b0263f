//! Authentication Handlers

use axum::extract::{Query, State};
use axum_extra::{headers::UserAgent, TypedHeader};

use super::ApiResult;
use crate::application::dto::request::{
    ChangePasswordRequest, EmailQuery, LoginRequest, RefreshTokenRequest, RegisterRequest,
};
use crate::application::dto::response::{AuthResponse, EmailAvailabilityDto, TokenResponse};
use crate::application::services::AuthService;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

/// Register a new student account
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let (user, tokens) = state.auth_service().register(body).await?;

    Ok(ServiceResult::created(
        AuthResponse {
            user: user.into(),
            tokens: tokens.into(),
        },
        "Registration successful",
    ))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let user_agent = user_agent.map(|TypedHeader(ua)| ua.as_str().to_owned());
    let (user, tokens) = state
        .auth_service()
        .login(&body.email, &body.password, user_agent)
        .await?;

    Ok(ServiceResult::success(AuthResponse {
        user: user.into(),
        tokens: tokens.into(),
    }))
}

/// Rotate a refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<TokenResponse> {
    let tokens = state.auth_service().refresh(&body.refresh_token).await?;
    Ok(ServiceResult::success(tokens.into()))
}

/// Logout (revoke refresh token)
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<()> {
    state.auth_service().logout(&body.refresh_token).await?;
    Ok(ServiceResult::message("You have been logged out successfully."))
}

pub async fn email_available(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<EmailAvailabilityDto> {
    let available = state.auth_service().is_email_available(&query.email).await?;
    Ok(ServiceResult::success(EmailAvailabilityDto {
        email: query.email,
        available,
    }))
}

/// Change the caller's password; all sessions are revoked.
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    state
        .auth_service()
        .change_password(user.user_id, &body.current_password, &body.new_password)
        .await?;
    Ok(ServiceResult::message("Password changed successfully"))
}
