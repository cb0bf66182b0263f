//! Enrollment and lesson progress handlers

use axum::extract::{Path, State};

use super::ApiResult;
use crate::application::dto::request::{EnrollRequest, LessonProgressRequest};
use crate::application::dto::response::{
    CourseProgressDto, EnrollmentDetailsDto, EnrollmentDto, EnrollmentStateDto, LessonProgressDto,
    ProgressResultDto,
};
use crate::application::services::EnrollmentService;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

pub async fn enroll(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<EnrollRequest>,
) -> ApiResult<EnrollmentDto> {
    let enrollment = state
        .enrollment_service()
        .enroll(user.user_id, body.course_id)
        .await?;
    Ok(ServiceResult::created(
        enrollment,
        "You have successfully enrolled in this course!",
    ))
}

pub async fn my_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<EnrollmentDto>> {
    let enrollments = state
        .enrollment_service()
        .get_user_enrollments(user.user_id)
        .await?;
    Ok(ServiceResult::success(enrollments))
}

pub async fn completed(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<EnrollmentDto>> {
    let enrollments = state.enrollment_service().get_completed(user.user_id).await?;
    Ok(ServiceResult::success(enrollments))
}

pub async fn in_progress(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<EnrollmentDto>> {
    let enrollments = state
        .enrollment_service()
        .get_in_progress(user.user_id)
        .await?;
    Ok(ServiceResult::success(enrollments))
}

/// Whether the caller is enrolled in a course
pub async fn is_enrolled(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
) -> ApiResult<bool> {
    let enrolled = state
        .enrollment_service()
        .is_enrolled(user.user_id, course_id)
        .await?;
    Ok(ServiceResult::success(enrolled))
}

/// Course structure with the caller's per-lesson progress
pub async fn get_enrollment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<EnrollmentDetailsDto> {
    let details = state.enrollment_service().get_details(user.user_id, id).await?;
    Ok(ServiceResult::success(details))
}

pub async fn unenroll(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.enrollment_service().unenroll(user.user_id, id).await?;
    Ok(ServiceResult::message(
        "You have successfully unenrolled from this course.",
    ))
}

pub async fn progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<CourseProgressDto> {
    let progress = state
        .enrollment_service()
        .calculate_progress(user.user_id, id)
        .await?;
    Ok(ServiceResult::success(progress))
}

pub async fn update_lesson_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, lesson_id)): Path<(i64, i64)>,
    ValidatedJson(body): ValidatedJson<LessonProgressRequest>,
) -> ApiResult<ProgressResultDto> {
    let result = state
        .enrollment_service()
        .update_lesson_progress(
            user.user_id,
            id,
            lesson_id,
            body.is_completed,
            body.watched_seconds,
        )
        .await?;

    let message = if result.course_completed_now {
        "Congratulations! You have completed this course."
    } else {
        "Progress updated successfully"
    };
    Ok(ServiceResult::success_with_message(result, message))
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, lesson_id)): Path<(i64, i64)>,
) -> ApiResult<LessonProgressDto> {
    let progress = state
        .enrollment_service()
        .mark_lesson_complete(user.user_id, id, lesson_id)
        .await?;
    Ok(ServiceResult::success_with_message(progress, "Progress updated successfully"))
}

/// Force an enrollment to completed
pub async fn complete_enrollment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<EnrollmentStateDto> {
    let result = state
        .enrollment_service()
        .mark_enrollment_complete(user.user_id, id)
        .await?;
    Ok(ServiceResult::success_with_message(
        result,
        "Congratulations! You have completed this course.",
    ))
}
