//! Notification handlers

use axum::extract::{Path, State};

use super::ApiResult;
use crate::application::dto::response::{NotificationDto, UnreadCountDto};
use crate::application::services::NotificationService;
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<NotificationDto>> {
    let notifications = state.notification_service().list(user.user_id).await?;
    Ok(ServiceResult::success(notifications))
}

pub async fn unread_count(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<UnreadCountDto> {
    let unread = state
        .notification_service()
        .unread_count(user.user_id)
        .await?;
    Ok(ServiceResult::success(UnreadCountDto { unread }))
}

pub async fn mark_as_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state
        .notification_service()
        .mark_as_read(user.user_id, id)
        .await?;
    Ok(ServiceResult::message("Notification marked as read"))
}

pub async fn mark_all_as_read(State(state): State<AppState>, user: AuthUser) -> ApiResult<()> {
    let updated = state
        .notification_service()
        .mark_all_as_read(user.user_id)
        .await?;
    Ok(ServiceResult::message(format!(
        "{} notifications marked as read",
        updated
    )))
}
