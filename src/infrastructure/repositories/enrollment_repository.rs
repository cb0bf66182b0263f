//! Enrollment Repository Implementation
//!
//! Lesson progress writes run in one transaction. The ownership and lesson
//! checks, the progress upsert, the percentage recompute and the completion
//! flip all happen under the enrollment row lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::services::progress_percent;
use crate::domain::{
    Enrollment, EnrollmentFilter, EnrollmentRepository, EnrollmentSummary, LessonProgress,
    ProgressOutcome, ProgressUpdate, ProgressWrite,
};
use crate::infrastructure::database::{conflict_on_unique, with_transaction};
use crate::shared::error::AppError;

const ENROLLMENT_COLUMNS: &str =
    "e.id, e.user_id, e.course_id, e.enrolled_at, e.progress_percent, e.is_completed, e.completed_at";

/// Shared filter; binds $1..$4 in `EnrollmentFilter` field order.
const FILTER_CLAUSE: &str = r#"
    c.is_deleted = FALSE
    AND ($1::UUID IS NULL OR e.user_id = $1)
    AND ($2::BIGINT IS NULL OR e.course_id = $2)
    AND ($3::UUID IS NULL OR c.instructor_id = $3)
    AND ($4::BOOLEAN IS NULL OR e.is_completed = $4)
"#;

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    id: i64,
    user_id: Uuid,
    course_id: i64,
    enrolled_at: DateTime<Utc>,
    progress_percent: Decimal,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentRow {
    fn into_enrollment(self) -> Enrollment {
        Enrollment {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            enrolled_at: self.enrolled_at,
            progress_percent: self.progress_percent,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentSummaryRow {
    #[sqlx(flatten)]
    enrollment: EnrollmentRow,
    user_name: String,
    course_title: String,
    course_thumbnail: Option<String>,
    total_lessons: i64,
    completed_lessons: i64,
}

impl EnrollmentSummaryRow {
    fn into_summary(self) -> EnrollmentSummary {
        EnrollmentSummary {
            enrollment: self.enrollment.into_enrollment(),
            user_name: self.user_name,
            course_title: self.course_title,
            course_thumbnail: self.course_thumbnail,
            total_lessons: self.total_lessons,
            completed_lessons: self.completed_lessons,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct LessonProgressRow {
    id: i64,
    enrollment_id: i64,
    lesson_id: i64,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    watched_seconds: i32,
}

impl LessonProgressRow {
    pub(super) fn into_progress(self) -> LessonProgress {
        LessonProgress {
            id: self.id,
            enrollment_id: self.enrollment_id,
            lesson_id: self.lesson_id,
            is_completed: self.is_completed,
            completed_at: self.completed_at,
            watched_seconds: self.watched_seconds,
        }
    }
}

async fn lock_enrollment(conn: &mut PgConnection, id: i64) -> Result<Enrollment, AppError> {
    let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
        "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|r| r.into_enrollment())
        .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))
}

async fn save_enrollment_state(conn: &mut PgConnection, e: &Enrollment) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE enrollments
        SET progress_percent = $2, is_completed = $3, completed_at = $4
        WHERE id = $1
        "#,
    )
    .bind(e.id)
    .bind(e.progress_percent)
    .bind(e.is_completed)
    .bind(e.completed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// PostgreSQL enrollment repository implementation.
#[derive(Clone)]
pub struct PgEnrollmentRepository {
    pool: PgPool,
}

impl PgEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentRepository for PgEnrollmentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Enrollment>, AppError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_enrollment()))
    }

    async fn find_by_user_and_course(
        &self,
        user_id: Uuid,
        course_id: i64,
    ) -> Result<Option<Enrollment>, AppError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.user_id = $1 AND e.course_id = $2"
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_enrollment()))
    }

    async fn find_summaries(
        &self,
        filter: EnrollmentFilter,
        limit: Option<i64>,
    ) -> Result<Vec<EnrollmentSummary>, AppError> {
        let rows = sqlx::query_as::<_, EnrollmentSummaryRow>(&format!(
            r#"
            SELECT {ENROLLMENT_COLUMNS},
                   TRIM(u.first_name || ' ' || u.last_name) AS user_name,
                   c.title AS course_title,
                   c.thumbnail_path AS course_thumbnail,
                   (SELECT COUNT(*) FROM lessons l
                    JOIN sections s ON s.id = l.section_id
                    WHERE s.course_id = c.id AND l.is_deleted = FALSE
                      AND s.is_deleted = FALSE) AS total_lessons,
                   (SELECT COUNT(*) FROM lesson_progress lp
                    JOIN lessons l ON l.id = lp.lesson_id
                    JOIN sections s ON s.id = l.section_id
                    WHERE lp.enrollment_id = e.id AND lp.is_completed = TRUE
                      AND l.is_deleted = FALSE AND s.is_deleted = FALSE) AS completed_lessons
            FROM enrollments e
            JOIN users u ON u.id = e.user_id
            JOIN courses c ON c.id = e.course_id
            WHERE {FILTER_CLAUSE}
            ORDER BY e.enrolled_at DESC, e.id DESC
            LIMIT $5
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.course_id)
        .bind(filter.instructor_id)
        .bind(filter.completed)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_summary()).collect())
    }

    async fn create(&self, user_id: Uuid, course_id: i64) -> Result<Enrollment, AppError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            r#"
            INSERT INTO enrollments AS e (user_id, course_id, enrolled_at, progress_percent, is_completed)
            VALUES ($1, $2, NOW(), 0, FALSE)
            RETURNING {ENROLLMENT_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "You are already enrolled in this course"))?;

        Ok(row.into_enrollment())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        // lesson_progress rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_lesson_progress(
        &self,
        update: ProgressUpdate,
    ) -> Result<ProgressWrite, AppError> {
        with_transaction(&self.pool, |mut ctx| async move {
            let mut enrollment = lock_enrollment(ctx.conn(), update.enrollment_id).await?;
            if !enrollment.is_owned_by(update.user_id) {
                return Ok((ProgressWrite::NotOwner, ctx));
            }

            // FOR SHARE holds off a concurrent soft delete until commit
            let lesson_live = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT l.id
                FROM lessons l
                JOIN sections s ON s.id = l.section_id
                WHERE l.id = $1 AND s.course_id = $2
                  AND l.is_deleted = FALSE AND s.is_deleted = FALSE
                FOR SHARE OF l
                "#,
            )
            .bind(update.lesson_id)
            .bind(enrollment.course_id)
            .fetch_optional(ctx.conn())
            .await?;
            if lesson_live.is_none() {
                return Ok((ProgressWrite::LessonNotInCourse, ctx));
            }

            let existing = sqlx::query_as::<_, LessonProgressRow>(
                r#"
                SELECT id, enrollment_id, lesson_id, is_completed, completed_at, watched_seconds
                FROM lesson_progress
                WHERE enrollment_id = $1 AND lesson_id = $2
                "#,
            )
            .bind(update.enrollment_id)
            .bind(update.lesson_id)
            .fetch_optional(ctx.conn())
            .await?;

            let mut progress = existing
                .map(|r| r.into_progress())
                .unwrap_or_else(|| LessonProgress::new(update.enrollment_id, update.lesson_id));
            progress.apply(update.is_completed, update.watched_seconds, update.at);

            let saved = sqlx::query_as::<_, LessonProgressRow>(
                r#"
                INSERT INTO lesson_progress (enrollment_id, lesson_id, is_completed, completed_at, watched_seconds)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (enrollment_id, lesson_id) DO UPDATE
                SET is_completed = EXCLUDED.is_completed,
                    completed_at = EXCLUDED.completed_at,
                    watched_seconds = EXCLUDED.watched_seconds
                RETURNING id, enrollment_id, lesson_id, is_completed, completed_at, watched_seconds
                "#,
            )
            .bind(progress.enrollment_id)
            .bind(progress.lesson_id)
            .bind(progress.is_completed)
            .bind(progress.completed_at)
            .bind(progress.watched_seconds)
            .fetch_one(ctx.conn())
            .await?
            .into_progress();

            let (total, completed) = sqlx::query_as::<_, (i64, i64)>(
                r#"
                SELECT COUNT(*) AS total,
                       COUNT(lp.id) FILTER (WHERE lp.is_completed = TRUE) AS completed
                FROM lessons l
                JOIN sections s ON s.id = l.section_id
                LEFT JOIN lesson_progress lp
                       ON lp.lesson_id = l.id AND lp.enrollment_id = $2
                WHERE s.course_id = $1 AND l.is_deleted = FALSE AND s.is_deleted = FALSE
                "#,
            )
            .bind(enrollment.course_id)
            .bind(enrollment.id)
            .fetch_one(ctx.conn())
            .await?;

            let newly_completed =
                enrollment.apply_progress(progress_percent(completed, total), update.at);
            save_enrollment_state(ctx.conn(), &enrollment).await?;

            let outcome = ProgressOutcome {
                progress: saved,
                enrollment,
                newly_completed,
            };
            Ok::<_, AppError>((ProgressWrite::Recorded(outcome), ctx))
        })
        .await
    }

    async fn mark_complete(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<Enrollment>, AppError> {
        let result = with_transaction(&self.pool, |mut ctx| async move {
            let mut enrollment = lock_enrollment(ctx.conn(), id).await?;
            enrollment.mark_complete(at);
            save_enrollment_state(ctx.conn(), &enrollment).await?;
            Ok::<_, AppError>((enrollment, ctx))
        })
        .await;

        match result {
            Ok(enrollment) => Ok(Some(enrollment)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn count(&self, filter: EnrollmentFilter) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            r#"
            SELECT COUNT(*)
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE {FILTER_CLAUSE}
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.course_id)
        .bind(filter.instructor_id)
        .bind(filter.completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
