//! Review handlers

use axum::extract::{Path, State};

use super::ApiResult;
use crate::application::dto::request::{CreateReviewRequest, UpdateReviewRequest};
use crate::application::dto::response::ReviewDto;
use crate::application::services::ReviewService;
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::response::ServiceResult;
use crate::startup::AppState;

pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateReviewRequest>,
) -> ApiResult<ReviewDto> {
    let review = state
        .review_service()
        .create(user.user_id, body.course_id, body.rating, body.comment)
        .await?;
    Ok(ServiceResult::created(review, "Thank you for your review!"))
}

pub async fn update_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(body): ValidatedJson<UpdateReviewRequest>,
) -> ApiResult<ReviewDto> {
    let review = state
        .review_service()
        .update(user.user_id, id, body.rating, body.comment)
        .await?;
    Ok(ServiceResult::success_with_message(review, "Review updated successfully"))
}

pub async fn delete_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    state.review_service().delete(user.user_id, id).await?;
    Ok(ServiceResult::message("Review deleted successfully"))
}

pub async fn my_reviews(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<ReviewDto>> {
    let reviews = state.review_service().get_user_reviews(user.user_id).await?;
    Ok(ServiceResult::success(reviews))
}
