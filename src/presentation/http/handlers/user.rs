//! Current user handlers (`/me`)

use axum::extract::{Path, State};

use super::ApiResult;
use crate::application::dto::request::{AddSkillsRequest, UpdateProfileRequest};
use crate::application::dto::response::{ProfileDto, UserDto, UserSkillDto};
use crate::application::services::{folders, FilePolicy, FileService, UserService};
use crate::presentation::http::extractors::{UploadedFile, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> ApiResult<ProfileDto> {
    let profile = state.user_service().get_profile(user.user_id).await?;
    Ok(ServiceResult::success(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<UserDto> {
    let updated = state.user_service().update_profile(user.user_id, body).await?;
    Ok(ServiceResult::success_with_message(updated, "Profile updated successfully"))
}

pub async fn get_my_skills(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<UserSkillDto>> {
    let skills = state.user_service().get_user_skills(user.user_id).await?;
    Ok(ServiceResult::success(skills))
}

pub async fn add_my_skills(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<AddSkillsRequest>,
) -> ApiResult<Vec<UserSkillDto>> {
    let skills = state
        .user_service()
        .add_user_skills(user.user_id, &body.skill_ids)
        .await?;
    Ok(ServiceResult::success_with_message(skills, "Skills added successfully"))
}

pub async fn remove_my_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(skill_id): Path<i64>,
) -> ApiResult<()> {
    state
        .user_service()
        .remove_user_skill(user.user_id, skill_id)
        .await?;
    Ok(ServiceResult::message("Skill removed successfully"))
}

/// Replace the profile picture; the previous file is removed afterwards.
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    user: AuthUser,
    file: UploadedFile,
) -> ApiResult<UserDto> {
    let files = state.file_service();
    let stored = files
        .upload(folders::PROFILES, &file.file_name, &file.bytes, FilePolicy::IMAGE)
        .await?;

    let (updated, previous) = match state
        .user_service()
        .set_profile_picture(user.user_id, stored.path.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            files.discard(Some(stored.path)).await;
            return Err(e.into());
        }
    };
    files.discard(previous).await;

    Ok(ServiceResult::success_with_message(updated, "File uploaded successfully"))
}
