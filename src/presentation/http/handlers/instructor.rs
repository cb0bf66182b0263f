//! Instructor area: course authoring, content and enrollments
//!
//! Every operation is scoped to courses owned by the caller; ownership is
//! checked in the course and enrollment services.

use axum::extract::{Path, State};

use super::ApiResult;
use crate::application::dto::request::{CourseRequest, LessonRequest, SectionRequest};
use crate::application::dto::response::{
    CourseDetailsDto, CourseDto, CourseSummaryDto, EnrollmentDto, LessonDto, SectionDto,
};
use crate::application::services::{
    folders, CourseService, EnrollmentService, FilePolicy, FileService,
};
use crate::presentation::http::extractors::{UploadedFile, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

// ============================================================================
// Courses
// ============================================================================

pub async fn my_courses(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state
        .course_service()
        .get_by_instructor(user.user_id)
        .await?;
    Ok(ServiceResult::success(courses))
}

/// Full course structure, published or not
pub async fn get_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<CourseDetailsDto> {
    let details = state
        .course_service()
        .get_owned_details(user.user_id, id)
        .await?;
    Ok(ServiceResult::success(details))
}

pub async fn create_course(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CourseRequest>,
) -> ApiResult<CourseDto> {
    let (input, skill_ids) = body.into_parts();
    let course = state
        .course_service()
        .create(user.user_id, input, skill_ids)
        .await?;
    Ok(ServiceResult::created(course, "Course created successfully"))
}

pub async fn update_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<CourseRequest>,
) -> ApiResult<CourseDto> {
    let (input, skill_ids) = body.into_parts();
    let course = state
        .course_service()
        .update(user.user_id, id, input, skill_ids)
        .await?;
    Ok(ServiceResult::success_with_message(course, "Course updated successfully"))
}

pub async fn delete_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.course_service().delete(user.user_id, id).await?;
    Ok(ServiceResult::message("Course deleted successfully"))
}

pub async fn publish_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.course_service().publish(user.user_id, id).await?;
    Ok(ServiceResult::message("Course published successfully"))
}

pub async fn unpublish_course(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.course_service().unpublish(user.user_id, id).await?;
    Ok(ServiceResult::message("Course unpublished successfully"))
}

pub async fn upload_thumbnail(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    file: UploadedFile,
) -> ApiResult<CourseDto> {
    let files = state.file_service();
    let stored = files
        .upload(folders::THUMBNAILS, &file.file_name, &file.bytes, FilePolicy::IMAGE)
        .await?;

    let (course, previous) = match state
        .course_service()
        .set_thumbnail(user.user_id, id, stored.path.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            files.discard(Some(stored.path)).await;
            return Err(e.into());
        }
    };
    files.discard(previous).await;

    Ok(ServiceResult::success_with_message(course, "File uploaded successfully"))
}

// ============================================================================
// Enrollments
// ============================================================================

pub async fn course_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Vec<EnrollmentDto>> {
    let enrollments = state
        .enrollment_service()
        .get_course_enrollments(user.user_id, id)
        .await?;
    Ok(ServiceResult::success(enrollments))
}

/// Enrollments across all of the caller's courses
pub async fn all_enrollments(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<EnrollmentDto>> {
    let enrollments = state
        .enrollment_service()
        .get_instructor_enrollments(user.user_id)
        .await?;
    Ok(ServiceResult::success(enrollments))
}

// ============================================================================
// Sections & lessons
// ============================================================================

pub async fn add_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(course_id): Path<i64>,
    ValidatedJson(body): ValidatedJson<SectionRequest>,
) -> ApiResult<SectionDto> {
    let section = state
        .course_service()
        .add_section(user.user_id, course_id, body.into())
        .await?;
    Ok(ServiceResult::created(section, "Section added successfully"))
}

pub async fn update_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<SectionRequest>,
) -> ApiResult<SectionDto> {
    let section = state
        .course_service()
        .update_section(user.user_id, id, body.into())
        .await?;
    Ok(ServiceResult::success_with_message(section, "Section updated successfully"))
}

pub async fn delete_section(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.course_service().delete_section(user.user_id, id).await?;
    Ok(ServiceResult::message("Section deleted successfully"))
}

pub async fn add_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path(section_id): Path<i64>,
    ValidatedJson(body): ValidatedJson<LessonRequest>,
) -> ApiResult<LessonDto> {
    let lesson = state
        .course_service()
        .add_lesson(user.user_id, section_id, body.into())
        .await?;
    Ok(ServiceResult::created(lesson, "Lesson added successfully"))
}

pub async fn update_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<LessonRequest>,
) -> ApiResult<LessonDto> {
    let lesson = state
        .course_service()
        .update_lesson(user.user_id, id, body.into())
        .await?;
    Ok(ServiceResult::success_with_message(lesson, "Lesson updated successfully"))
}

pub async fn delete_lesson(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.course_service().delete_lesson(user.user_id, id).await?;
    Ok(ServiceResult::message("Lesson deleted successfully"))
}

/// Upload a video or PDF as the lesson's content
pub async fn upload_lesson_content(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    file: UploadedFile,
) -> ApiResult<LessonDto> {
    let files = state.file_service();
    let stored = files
        .upload(
            folders::LESSONS,
            &file.file_name,
            &file.bytes,
            FilePolicy::LESSON_MEDIA,
        )
        .await?;

    let (lesson, previous) = match state
        .course_service()
        .set_lesson_content(user.user_id, id, stored.path.clone())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            files.discard(Some(stored.path)).await;
            return Err(e.into());
        }
    };
    files.discard(previous).await;

    Ok(ServiceResult::success_with_message(lesson, "File uploaded successfully"))
}
