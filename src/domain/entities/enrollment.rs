//! Enrollment entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::LessonProgress;
use crate::shared::error::AppError;

/// A student's registration in a course.
///
/// Maps to the `enrollments` table, unique on `(user_id, course_id)`.
/// `progress_percent` is a cache of completed/total lessons, NUMERIC(5,2).
#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: i64,
    pub user_id: Uuid,
    pub course_id: i64,
    pub enrolled_at: DateTime<Utc>,
    pub progress_percent: Decimal,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    /// Store a recomputed percentage.
    ///
    /// Reaching 100 flips the enrollment to completed and stamps `completed_at`
    /// the first time only. Returns true when this call completed it.
    pub fn apply_progress(&mut self, percent: Decimal, now: DateTime<Utc>) -> bool {
        self.progress_percent = percent;
        if percent >= Decimal::ONE_HUNDRED && !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(now);
            return true;
        }
        false
    }

    /// Force completion regardless of lesson progress.
    pub fn mark_complete(&mut self, now: DateTime<Utc>) {
        self.progress_percent = Decimal::ONE_HUNDRED;
        if !self.is_completed {
            self.is_completed = true;
            self.completed_at = Some(now);
        }
    }
}

/// Enrollment joined with display data for list views and dashboards.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentSummary {
    pub enrollment: Enrollment,
    pub user_name: String,
    pub course_title: String,
    pub course_thumbnail: Option<String>,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

/// Conjunctive filter for enrollment lists. Results are newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrollmentFilter {
    pub user_id: Option<Uuid>,
    pub course_id: Option<i64>,
    /// Enrollments in courses taught by this instructor
    pub instructor_id: Option<Uuid>,
    pub completed: Option<bool>,
}

/// One lesson progress write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub user_id: Uuid,
    pub enrollment_id: i64,
    pub lesson_id: i64,
    pub is_completed: bool,
    pub watched_seconds: i32,
    pub at: DateTime<Utc>,
}

/// Result of a transactional progress write.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressOutcome {
    pub progress: LessonProgress,
    pub enrollment: Enrollment,
    /// The enrollment crossed 100% during this write
    pub newly_completed: bool,
}

/// What a progress write did. The rejections are decided under the
/// enrollment lock, so nothing is written for them.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressWrite {
    Recorded(ProgressOutcome),
    /// The enrollment belongs to another user
    NotOwner,
    /// The lesson is missing, deleted or part of another course
    LessonNotInCourse,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>, AppError>;

    async fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: i64,
    ) -> Result<Option<Enrollment>, AppError>;

    async fn find_summaries(
        &self,
        filter: EnrollmentFilter,
        limit: Option<i64>,
    ) -> Result<Vec<EnrollmentSummary>, AppError>;

    /// Insert with zero progress. A duplicate pair yields `AppError::Conflict`.
    async fn create(&self, user_id: Uuid, course_id: i64) -> Result<Enrollment, AppError>;

    /// Remove the enrollment and its progress rows.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Check ownership and lesson membership, upsert the lesson progress row,
    /// recompute the enrollment percentage and apply completion, all in one
    /// transaction. A missing enrollment yields `AppError::NotFound`.
    async fn record_lesson_progress(
        &self,
        update: ProgressUpdate,
    ) -> Result<ProgressWrite, AppError>;

    async fn mark_complete(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Enrollment>, AppError>;

    async fn count(&self, filter: EnrollmentFilter) -> Result<i64, AppError>;
}
