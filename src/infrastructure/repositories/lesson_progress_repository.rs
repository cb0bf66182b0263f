//! Lesson Progress Repository Implementation
//!
//! Read side only; writes go through `PgEnrollmentRepository::record_lesson_progress`.

use async_trait::async_trait;
use sqlx::PgPool;

use super::enrollment_repository::LessonProgressRow;
use crate::domain::{LessonProgress, LessonProgressRepository};
use crate::shared::error::AppError;

#[derive(Clone)]
pub struct PgLessonProgressRepository {
    pool: PgPool,
}

impl PgLessonProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LessonProgressRepository for PgLessonProgressRepository {
    async fn find_by_enrollment(
        &self,
        enrollment_id: i64,
    ) -> Result<Vec<LessonProgress>, AppError> {
        let rows = sqlx::query_as::<_, LessonProgressRow>(
            r#"
            SELECT id, enrollment_id, lesson_id, is_completed, completed_at, watched_seconds
            FROM lesson_progress
            WHERE enrollment_id = $1
            ORDER BY lesson_id
            "#,
        )
        .bind(enrollment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_progress()).collect())
    }

    async fn count_completed(&self, enrollment_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM lesson_progress lp
            JOIN lessons l ON l.id = lp.lesson_id
            JOIN sections s ON s.id = l.section_id
            WHERE lp.enrollment_id = $1 AND lp.is_completed = TRUE
              AND l.is_deleted = FALSE AND s.is_deleted = FALSE
            "#,
        )
        .bind(enrollment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
