//! Category handlers: public reads and admin management

use axum::extract::{Path, Query, State};

use super::ApiResult;
use crate::application::dto::request::{CategoryRequest, PageParams};
use crate::application::dto::response::{CategoryDto, CategoryWithCoursesDto};
use crate::application::services::{folders, CategoryService, FilePolicy, FileService};
use crate::presentation::http::extractors::{UploadedFile, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::pagination::PagedResult;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

/// All categories with course counts (cached)
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryDto>> {
    let categories = state.category_service().get_all().await?;
    Ok(ServiceResult::success(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<CategoryDto> {
    let category = state.category_service().get(id).await?;
    Ok(ServiceResult::success(category))
}

pub async fn category_courses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<CategoryWithCoursesDto> {
    let category = state.category_service().get_with_courses(id).await?;
    Ok(ServiceResult::success(category))
}

// ============================================================================
// Admin
// ============================================================================

pub async fn admin_list_categories(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<PagedResult<CategoryDto>> {
    let page = state.category_service().get_paged(params.page()).await?;
    Ok(ServiceResult::success(page))
}

pub async fn create_category(
    State(state): State<AppState>,
    admin: AuthUser,
    ValidatedJson(body): ValidatedJson<CategoryRequest>,
) -> ApiResult<CategoryDto> {
    let category = state
        .category_service()
        .create(admin.user_id, body.into())
        .await?;
    Ok(ServiceResult::created(category, "Category created successfully"))
}

pub async fn update_category(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<CategoryRequest>,
) -> ApiResult<CategoryDto> {
    let category = state
        .category_service()
        .update(admin.user_id, id, body.into())
        .await?;
    Ok(ServiceResult::success_with_message(category, "Category updated successfully"))
}

pub async fn delete_category(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.category_service().delete(admin.user_id, id).await?;
    Ok(ServiceResult::message("Category deleted successfully"))
}

pub async fn upload_category_icon(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    file: UploadedFile,
) -> ApiResult<CategoryDto> {
    let files = state.file_service();
    let stored = files
        .upload(folders::CATEGORIES, &file.file_name, &file.bytes, FilePolicy::IMAGE)
        .await?;

    let (category, previous) = match state
        .category_service()
        .set_icon(admin.user_id, id, stored.path.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            files.discard(Some(stored.path)).await;
            return Err(e.into());
        }
    };
    files.discard(previous).await;

    Ok(ServiceResult::success_with_message(category, "File uploaded successfully"))
}
