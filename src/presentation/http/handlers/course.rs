//! Public catalogue handlers

use axum::{
    extract::{Path, Query, State},
    Extension,
};

use super::ApiResult;
use crate::application::dto::request::{CountParams, CourseSearchParams};
use crate::application::dto::response::{
    CourseDetailsDto, CourseRatingDto, CourseSummaryDto, ReviewDto, SkillDto,
};
use crate::application::services::{CourseService, ReviewService, SkillService};
use crate::presentation::middleware::AuthUser;
use crate::shared::pagination::PagedResult;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

/// Published catalogue with search, filters, sorting and paging
pub async fn search_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseSearchParams>,
) -> ApiResult<PagedResult<CourseSummaryDto>> {
    let page = state.course_service().search_paged(params.to_query()).await?;
    Ok(ServiceResult::success(page))
}

/// Every published course, newest first
pub async fn published(State(state): State<AppState>) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state.course_service().get_published().await?;
    Ok(ServiceResult::success(courses))
}

pub async fn by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state.course_service().get_by_category(category_id).await?;
    Ok(ServiceResult::success(courses))
}

pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state.course_service().get_top_rated(params.count()).await?;
    Ok(ServiceResult::success(courses))
}

pub async fn most_enrolled(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state
        .course_service()
        .get_most_enrolled(params.count())
        .await?;
    Ok(ServiceResult::success(courses))
}

pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> ApiResult<Vec<CourseSummaryDto>> {
    let courses = state.course_service().get_recent(params.count()).await?;
    Ok(ServiceResult::success(courses))
}

/// Published course with sections, lessons, skills and rating
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<CourseDetailsDto> {
    let details = state.course_service().get_details(id).await?;
    Ok(ServiceResult::success(details))
}

pub async fn course_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<ReviewDto>> {
    let reviews = state.review_service().get_course_reviews(id).await?;
    Ok(ServiceResult::success(reviews))
}

pub async fn course_skills(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<SkillDto>> {
    let skills = state.skill_service().get_course_skills(id).await?;
    Ok(ServiceResult::success(skills))
}

/// Average rating; signed-in callers also learn whether they reviewed it
pub async fn course_rating(
    State(state): State<AppState>,
    user: Option<Extension<AuthUser>>,
    Path(id): Path<i64>,
) -> ApiResult<CourseRatingDto> {
    let reviews = state.review_service();
    let summary = reviews.get_average_rating(id).await?;
    let has_reviewed = match user {
        Some(Extension(user)) => Some(reviews.has_reviewed(user.user_id, id).await?),
        None => None,
    };
    Ok(ServiceResult::success(CourseRatingDto {
        summary,
        has_reviewed,
    }))
}
