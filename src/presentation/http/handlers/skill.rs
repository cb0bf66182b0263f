//! Skill handlers

use axum::extract::{Path, Query, State};

use super::ApiResult;
use crate::application::dto::request::{CountParams, PageParams, SkillRequest};
use crate::application::dto::response::SkillDto;
use crate::application::services::SkillService;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::pagination::PagedResult;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

pub async fn list_skills(State(state): State<AppState>) -> ApiResult<Vec<SkillDto>> {
    let skills = state.skill_service().get_all().await?;
    Ok(ServiceResult::success(skills))
}

/// Skills ordered by how many courses use them
pub async fn popular_skills(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<Vec<SkillDto>> {
    let skills = state.skill_service().get_popular(params.count()).await?;
    Ok(ServiceResult::success(skills))
}

pub async fn admin_list_skills(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<PagedResult<SkillDto>> {
    let page = state.skill_service().get_paged(params.page()).await?;
    Ok(ServiceResult::success(page))
}

pub async fn create_skill(
    State(state): State<AppState>,
    admin: AuthUser,
    ValidatedJson(body): ValidatedJson<SkillRequest>,
) -> ApiResult<SkillDto> {
    let skill = state
        .skill_service()
        .create(admin.user_id, body.into())
        .await?;
    Ok(ServiceResult::created(skill, "Skill created successfully"))
}

pub async fn update_skill(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<SkillRequest>,
) -> ApiResult<SkillDto> {
    let skill = state
        .skill_service()
        .update(admin.user_id, id, body.into())
        .await?;
    Ok(ServiceResult::success_with_message(skill, "Skill updated successfully"))
}

pub async fn delete_skill(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.skill_service().delete(admin.user_id, id).await?;
    Ok(ServiceResult::message("Skill deleted successfully"))
}
