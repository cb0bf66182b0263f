//! Review Service
//!
//! One review per user and course, limited to enrolled users.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::dto::response::{round2, RatingSummaryDto, ReviewDto};
use crate::domain::{CourseRepository, EnrollmentRepository, Review, ReviewRepository};
use crate::shared::error::AppError;

/// Review service trait
#[async_trait]
pub trait ReviewService: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        course_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<ReviewDto, ReviewError>;

    async fn update(
        &self,
        user_id: Uuid,
        review_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<ReviewDto, ReviewError>;

    async fn delete(&self, user_id: Uuid, review_id: i64) -> Result<(), ReviewError>;

    async fn get_course_reviews(&self, course_id: i64) -> Result<Vec<ReviewDto>, ReviewError>;

    async fn get_user_reviews(&self, user_id: Uuid) -> Result<Vec<ReviewDto>, ReviewError>;

    /// Average rating of a course, 0 when it has no reviews
    async fn get_average_rating(&self, course_id: i64) -> Result<RatingSummaryDto, ReviewError>;

    async fn has_reviewed(&self, user_id: Uuid, course_id: i64) -> Result<bool, ReviewError>;
}

/// Review service errors
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Review not found")]
    NotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("You must be enrolled in the course to leave a review")]
    NotEnrolled,

    #[error("You have already reviewed this course")]
    AlreadyReviewed,

    #[error("You are not authorized to modify this review")]
    NotOwner,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::NotFound | ReviewError::CourseNotFound => {
                AppError::NotFound(err.to_string())
            }
            ReviewError::InvalidRating => AppError::BadRequest(err.to_string()),
            ReviewError::NotEnrolled | ReviewError::NotOwner => AppError::Forbidden(err.to_string()),
            ReviewError::AlreadyReviewed => AppError::Conflict(err.to_string()),
            ReviewError::Repository(e) => e,
        }
    }
}

/// ReviewService implementation
pub struct ReviewServiceImpl<R, C, E>
where
    R: ReviewRepository,
    C: CourseRepository,
    E: EnrollmentRepository,
{
    review_repo: Arc<R>,
    course_repo: Arc<C>,
    enrollment_repo: Arc<E>,
}

impl<R, C, E> ReviewServiceImpl<R, C, E>
where
    R: ReviewRepository,
    C: CourseRepository,
    E: EnrollmentRepository,
{
    pub fn new(review_repo: Arc<R>, course_repo: Arc<C>, enrollment_repo: Arc<E>) -> Self {
        Self {
            review_repo,
            course_repo,
            enrollment_repo,
        }
    }

    async fn load_owned(&self, user_id: Uuid, review_id: i64) -> Result<Review, ReviewError> {
        let review = self
            .review_repo
            .find_by_id(review_id)
            .await?
            .ok_or(ReviewError::NotFound)?;
        if review.user_id != user_id {
            return Err(ReviewError::NotOwner);
        }
        Ok(review)
    }
}

fn clean_comment(comment: Option<String>) -> Option<String> {
    comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

#[async_trait]
impl<R, C, E> ReviewService for ReviewServiceImpl<R, C, E>
where
    R: ReviewRepository + 'static,
    C: CourseRepository + 'static,
    E: EnrollmentRepository + 'static,
{
    #[instrument(skip(self, comment))]
    async fn create(
        &self,
        user_id: Uuid,
        course_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<ReviewDto, ReviewError> {
        if !Review::is_valid_rating(rating) {
            return Err(ReviewError::InvalidRating);
        }
        if self.course_repo.find_by_id(course_id).await?.is_none() {
            return Err(ReviewError::CourseNotFound);
        }
        if self
            .enrollment_repo
            .find_by_user_and_course(user_id, course_id)
            .await?
            .is_none()
        {
            return Err(ReviewError::NotEnrolled);
        }
        if self.review_repo.exists(user_id, course_id).await? {
            return Err(ReviewError::AlreadyReviewed);
        }

        let review = self
            .review_repo
            .create(user_id, course_id, rating, clean_comment(comment))
            .await?;

        info!(review_id = review.id, course_id, rating, "Review created");
        Ok(ReviewDto::from(review))
    }

    async fn update(
        &self,
        user_id: Uuid,
        review_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<ReviewDto, ReviewError> {
        if !Review::is_valid_rating(rating) {
            return Err(ReviewError::InvalidRating);
        }
        self.load_owned(user_id, review_id).await?;

        self.review_repo
            .update(review_id, rating, clean_comment(comment), user_id)
            .await?
            .map(ReviewDto::from)
            .ok_or(ReviewError::NotFound)
    }

    async fn delete(&self, user_id: Uuid, review_id: i64) -> Result<(), ReviewError> {
        self.load_owned(user_id, review_id).await?;
        self.review_repo.soft_delete(review_id, user_id).await?;
        Ok(())
    }

    async fn get_course_reviews(&self, course_id: i64) -> Result<Vec<ReviewDto>, ReviewError> {
        let reviews = self.review_repo.find_by_course(course_id).await?;
        Ok(reviews.into_iter().map(ReviewDto::from).collect())
    }

    async fn get_user_reviews(&self, user_id: Uuid) -> Result<Vec<ReviewDto>, ReviewError> {
        let reviews = self.review_repo.find_by_user(user_id).await?;
        Ok(reviews.into_iter().map(ReviewDto::from).collect())
    }

    async fn get_average_rating(&self, course_id: i64) -> Result<RatingSummaryDto, ReviewError> {
        let stats = self.review_repo.stats_for_course(course_id).await?;
        Ok(RatingSummaryDto {
            course_id,
            review_count: stats.review_count,
            average_rating: round2(stats.average_rating),
        })
    }

    async fn has_reviewed(&self, user_id: Uuid, course_id: i64) -> Result<bool, ReviewError> {
        Ok(self.review_repo.exists(user_id, course_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AuditInfo, Course, CourseLevel, Enrollment, MockCourseRepository,
        MockEnrollmentRepository, MockReviewRepository, RatingStats,
    };
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use test_case::test_case;

    fn course(id: i64) -> Course {
        Course {
            id,
            title: "Figma Basics".into(),
            description: "Design".into(),
            short_description: None,
            thumbnail_path: None,
            level: CourseLevel::Beginner,
            is_published: true,
            price: None,
            duration_in_hours: 3,
            category_id: 3,
            instructor_id: Uuid::now_v7(),
            audit: AuditInfo::default(),
        }
    }

    fn enrollment(user_id: Uuid, course_id: i64) -> Enrollment {
        Enrollment {
            id: 1,
            user_id,
            course_id,
            enrolled_at: Utc::now(),
            progress_percent: Decimal::ZERO,
            is_completed: false,
            completed_at: None,
        }
    }

    fn review(id: i64, user_id: Uuid) -> Review {
        Review {
            id,
            user_id,
            course_id: 2,
            rating: 4,
            comment: None,
            audit: AuditInfo::new(Some(user_id)),
        }
    }

    fn service(
        reviews: MockReviewRepository,
        courses: MockCourseRepository,
        enrollments: MockEnrollmentRepository,
    ) -> ReviewServiceImpl<MockReviewRepository, MockCourseRepository, MockEnrollmentRepository>
    {
        ReviewServiceImpl::new(Arc::new(reviews), Arc::new(courses), Arc::new(enrollments))
    }

    #[test_case(0 ; "below range")]
    #[test_case(6 ; "above range")]
    #[test_case(-3 ; "negative")]
    #[tokio::test]
    async fn test_rating_out_of_range(rating: i32) {
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().never();

        let err = service(
            MockReviewRepository::new(),
            courses,
            MockEnrollmentRepository::new(),
        )
        .create(Uuid::now_v7(), 2, rating, None)
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Rating must be between 1 and 5");
    }

    #[tokio::test]
    async fn test_review_requires_enrollment() {
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().returning(|id| Ok(Some(course(id))));
        let mut enrollments = MockEnrollmentRepository::new();
        enrollments
            .expect_find_by_user_and_course()
            .returning(|_, _| Ok(None));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_create().never();

        let result = service(reviews, courses, enrollments)
            .create(Uuid::now_v7(), 2, 5, None)
            .await;
        assert!(matches!(result, Err(ReviewError::NotEnrolled)));
    }

    #[tokio::test]
    async fn test_second_review_rejected() {
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().returning(|id| Ok(Some(course(id))));
        let mut enrollments = MockEnrollmentRepository::new();
        enrollments
            .expect_find_by_user_and_course()
            .returning(|user, course| Ok(Some(enrollment(user, course))));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_exists().returning(|_, _| Ok(true));
        reviews.expect_create().never();

        let result = service(reviews, courses, enrollments)
            .create(Uuid::now_v7(), 2, 5, Some("Great".into()))
            .await;
        assert!(matches!(result, Err(ReviewError::AlreadyReviewed)));
    }

    #[tokio::test]
    async fn test_create_trims_comment() {
        let mut courses = MockCourseRepository::new();
        courses.expect_find_by_id().returning(|id| Ok(Some(course(id))));
        let mut enrollments = MockEnrollmentRepository::new();
        enrollments
            .expect_find_by_user_and_course()
            .returning(|user, course| Ok(Some(enrollment(user, course))));
        let mut reviews = MockReviewRepository::new();
        reviews.expect_exists().returning(|_, _| Ok(false));
        reviews
            .expect_create()
            .withf(|_, _, rating, comment| *rating == 5 && comment.as_deref() == Some("Great"))
            .returning(|user, course, rating, comment| {
                Ok(Review {
                    course_id: course,
                    rating,
                    comment,
                    ..review(9, user)
                })
            });

        let dto = service(reviews, courses, enrollments)
            .create(Uuid::now_v7(), 2, 5, Some("  Great ".into()))
            .await
            .unwrap();
        assert_eq!(dto.rating, 5);
        assert_eq!(dto.comment.as_deref(), Some("Great"));
    }

    #[tokio::test]
    async fn test_update_by_other_user_forbidden() {
        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_find_by_id()
            .returning(|id| Ok(Some(review(id, Uuid::now_v7()))));
        reviews.expect_update().never();

        let result = service(
            reviews,
            MockCourseRepository::new(),
            MockEnrollmentRepository::new(),
        )
        .update(Uuid::now_v7(), 1, 3, None)
        .await;
        assert!(matches!(result, Err(ReviewError::NotOwner)));
    }

    #[tokio::test]
    async fn test_average_rating_rounded() {
        let mut reviews = MockReviewRepository::new();
        reviews.expect_stats_for_course().returning(|_| {
            Ok(RatingStats {
                review_count: 3,
                average_rating: 4.666_666,
            })
        });

        let summary = service(
            reviews,
            MockCourseRepository::new(),
            MockEnrollmentRepository::new(),
        )
        .get_average_rating(2)
        .await
        .unwrap();
        assert_eq!(summary.average_rating, 4.67);
        assert_eq!(summary.review_count, 3);
    }
}
