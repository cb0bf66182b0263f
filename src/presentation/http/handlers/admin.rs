//! Admin area: user accounts and course moderation
//!
//! Category and skill management live in their own handler modules.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use super::ApiResult;
use crate::application::dto::request::{
    EmailQuery, LockUserRequest, SetRolesRequest, UserListParams,
};
use crate::application::dto::response::{CourseSummaryDto, UserDto};
use crate::application::services::{CourseService, UserService};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::pagination::PagedResult;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

/// Users ordered by first name, optionally filtered by `?role=`
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> ApiResult<PagedResult<UserDto>> {
    let page = state
        .user_service()
        .list_users(params.role(), params.page())
        .await?;
    Ok(ServiceResult::success(page))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserDto> {
    let profile = state.user_service().get_profile(id).await?;
    Ok(ServiceResult::success(profile.user))
}

/// Look an account up by email address
pub async fn find_user_by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<UserDto> {
    let user = state.user_service().get_by_email(&query.email).await?;
    Ok(ServiceResult::success(user))
}

pub async fn set_roles(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<SetRolesRequest>,
) -> ApiResult<UserDto> {
    let user = state.user_service().set_roles(id, body.roles).await?;
    Ok(ServiceResult::success_with_message(user, "Roles updated successfully"))
}

/// Lock until the given time, or indefinitely without a body
pub async fn lock_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<LockUserRequest>>,
) -> ApiResult<UserDto> {
    let until = body.and_then(|Json(request)| request.until);
    let user = state.user_service().lock(id, until).await?;
    Ok(ServiceResult::success_with_message(user, "User locked successfully"))
}

pub async fn unlock_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserDto> {
    let user = state.user_service().unlock(id).await?;
    Ok(ServiceResult::success_with_message(user, "User unlocked successfully"))
}

pub async fn delete_user(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.user_service().delete_user(admin.user_id, id).await?;
    Ok(ServiceResult::message("User deleted successfully"))
}

/// Every course, published or not
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state.course_service().get_all().await?;
    Ok(ServiceResult::success(courses))
}

pub async fn delete_course(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.course_service().admin_delete(admin.user_id, id).await?;
    Ok(ServiceResult::message("Course deleted successfully"))
}
