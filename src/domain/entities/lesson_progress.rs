//! Per-lesson progress record and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::error::AppError;

/// Maps to the `lesson_progress` table, unique on `(enrollment_id, lesson_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonProgress {
    pub id: i64,
    pub enrollment_id: i64,
    pub lesson_id: i64,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub watched_seconds: i32,
}

impl LessonProgress {
    pub fn new(enrollment_id: i64, lesson_id: i64) -> Self {
        Self {
            id: 0,
            enrollment_id,
            lesson_id,
            is_completed: false,
            completed_at: None,
            watched_seconds: 0,
        }
    }

    /// Apply a progress write. A completed write stamps `completed_at`;
    /// an incomplete one keeps whatever was there.
    pub fn apply(&mut self, is_completed: bool, watched_seconds: i32, now: DateTime<Utc>) {
        self.is_completed = is_completed;
        self.watched_seconds = watched_seconds.max(0);
        if is_completed {
            self.completed_at = Some(now);
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonProgressRepository: Send + Sync {
    async fn find_by_enrollment(&self, enrollment_id: i64)
        -> Result<Vec<LessonProgress>, AppError>;

    /// Completed lessons of an enrollment, ignoring lessons deleted since.
    async fn count_completed(&self, enrollment_id: i64) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_apply_completed_stamps_time() {
        let mut p = LessonProgress::new(1, 2);
        let now = Utc::now();
        p.apply(true, 120, now);

        assert!(p.is_completed);
        assert_eq!(p.completed_at, Some(now));
        assert_eq!(p.watched_seconds, 120);
    }

    #[test]
    fn test_apply_incomplete_keeps_previous_stamp() {
        let mut p = LessonProgress::new(1, 2);
        let first = Utc::now();
        p.apply(true, 60, first);
        p.apply(false, 30, first + Duration::minutes(3));

        assert!(!p.is_completed);
        assert_eq!(p.completed_at, Some(first));
    }

    #[test]
    fn test_negative_watch_time_clamps() {
        let mut p = LessonProgress::new(1, 2);
        p.apply(false, -5, Utc::now());
        assert_eq!(p.watched_seconds, 0);
    }
}
