//! Review entity and repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::shared::error::AppError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Maps to the `reviews` table, unique on `(user_id, course_id)` among non-deleted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: i64,
    pub user_id: Uuid,
    pub course_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    pub audit: AuditInfo,
}

impl Review {
    pub fn is_valid_rating(rating: i32) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&rating)
    }
}

/// Review joined with the author's name and the course title.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDetails {
    pub review: Review,
    pub user_name: String,
    pub course_title: String,
}

/// Review count and mean rating over a set of courses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingStats {
    pub review_count: i64,
    pub average_rating: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, AppError>;

    /// Reviews of a course, newest first.
    async fn find_by_course(&self, course_id: i64) -> Result<Vec<ReviewDetails>, AppError>;

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewDetails>, AppError>;

    /// Latest reviews across an instructor's courses.
    async fn find_recent_for_instructor(
        &self,
        instructor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ReviewDetails>, AppError>;

    async fn exists(&self, user_id: Uuid, course_id: i64) -> Result<bool, AppError>;

    /// Insert a review. A duplicate pair yields `AppError::Conflict`.
    async fn create(
        &self,
        user_id: Uuid,
        course_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, AppError>;

    async fn update(
        &self,
        id: i64,
        rating: i32,
        comment: Option<String>,
        actor: Uuid,
    ) -> Result<Option<Review>, AppError>;

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError>;

    async fn stats_for_course(&self, course_id: i64) -> Result<RatingStats, AppError>;

    async fn stats_for_instructor(&self, instructor_id: Uuid) -> Result<RatingStats, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => false)]
    #[test_case(1 => true)]
    #[test_case(3 => true)]
    #[test_case(5 => true)]
    #[test_case(6 => false)]
    fn test_rating_bounds(rating: i32) -> bool {
        Review::is_valid_rating(rating)
    }
}
