//! Lesson Repository Implementation
//!
//! Lessons hang off sections; course-level queries join through `sections`
//! and ignore lessons whose section was soft-deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuditInfo, ContentType, Lesson, LessonInput, LessonRepository};
use crate::shared::error::AppError;

const LESSON_COLUMNS: &str = r#"
    l.id, l.section_id, l.title, l.description, l.content_type, l.content_path,
    l.external_url, l.duration_in_minutes, l.sort_order, l.is_free,
    l.created_by, l.created_on, l.last_modified_by, l.last_modified_on
"#;

#[derive(Debug, sqlx::FromRow)]
struct LessonRow {
    id: i64,
    section_id: i64,
    title: String,
    description: Option<String>,
    content_type: i16,
    content_path: Option<String>,
    external_url: Option<String>,
    duration_in_minutes: i32,
    sort_order: i32,
    is_free: bool,
    created_by: Option<Uuid>,
    created_on: DateTime<Utc>,
    last_modified_by: Option<Uuid>,
    last_modified_on: DateTime<Utc>,
}

impl LessonRow {
    fn into_lesson(self) -> Lesson {
        Lesson {
            id: self.id,
            section_id: self.section_id,
            title: self.title,
            description: self.description,
            content_type: ContentType::from_i16(self.content_type).unwrap_or_default(),
            content_path: self.content_path,
            external_url: self.external_url,
            duration_in_minutes: self.duration_in_minutes,
            order: self.sort_order,
            is_free: self.is_free,
            audit: AuditInfo {
                created_by: self.created_by,
                created_on: self.created_on,
                last_modified_by: self.last_modified_by,
                last_modified_on: self.last_modified_on,
            },
        }
    }
}

/// PostgreSQL lesson repository implementation.
#[derive(Clone)]
pub struct PgLessonRepository {
    pool: PgPool,
}

impl PgLessonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LessonRepository for PgLessonRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Lesson>, AppError> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            "SELECT {LESSON_COLUMNS} FROM lessons l WHERE l.id = $1 AND l.is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_lesson()))
    }

    async fn find_course_id(&self, lesson_id: i64) -> Result<Option<i64>, AppError> {
        let course_id = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT s.course_id
            FROM lessons l
            JOIN sections s ON s.id = l.section_id
            WHERE l.id = $1 AND l.is_deleted = FALSE AND s.is_deleted = FALSE
            "#,
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course_id)
    }

    async fn find_by_section(&self, section_id: i64) -> Result<Vec<Lesson>, AppError> {
        let rows = sqlx::query_as::<_, LessonRow>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM lessons l
            WHERE l.section_id = $1 AND l.is_deleted = FALSE
            ORDER BY l.sort_order, l.id
            "#
        ))
        .bind(section_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_lesson()).collect())
    }

    async fn find_by_course(&self, course_id: i64) -> Result<Vec<Lesson>, AppError> {
        let rows = sqlx::query_as::<_, LessonRow>(&format!(
            r#"
            SELECT {LESSON_COLUMNS}
            FROM lessons l
            JOIN sections s ON s.id = l.section_id
            WHERE s.course_id = $1 AND l.is_deleted = FALSE AND s.is_deleted = FALSE
            ORDER BY s.sort_order, s.id, l.sort_order, l.id
            "#
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_lesson()).collect())
    }

    async fn count_by_section(&self, section_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lessons WHERE section_id = $1 AND is_deleted = FALSE",
        )
        .bind(section_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_by_course(&self, course_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM lessons l
            JOIN sections s ON s.id = l.section_id
            WHERE s.course_id = $1 AND l.is_deleted = FALSE AND s.is_deleted = FALSE
            "#,
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn create(
        &self,
        section_id: i64,
        input: &LessonInput,
        actor: Uuid,
    ) -> Result<Lesson, AppError> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            r#"
            INSERT INTO lessons AS l (section_id, title, description, content_type, content_path,
                                      external_url, duration_in_minutes, sort_order, is_free,
                                      created_by, last_modified_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    COALESCE($8, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM lessons
                                  WHERE section_id = $1 AND is_deleted = FALSE)),
                    $9, $10, $10)
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(section_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.content_type.as_i16())
        .bind(&input.content_path)
        .bind(&input.external_url)
        .bind(input.duration_in_minutes)
        .bind(input.order)
        .bind(input.is_free)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_lesson())
    }

    async fn update(
        &self,
        id: i64,
        input: &LessonInput,
        actor: Uuid,
    ) -> Result<Option<Lesson>, AppError> {
        let row = sqlx::query_as::<_, LessonRow>(&format!(
            r#"
            UPDATE lessons AS l
            SET title = $2,
                description = $3,
                content_type = $4,
                content_path = COALESCE($5, l.content_path),
                external_url = $6,
                duration_in_minutes = $7,
                sort_order = COALESCE($8, l.sort_order),
                is_free = $9,
                last_modified_by = $10,
                last_modified_on = NOW()
            WHERE l.id = $1 AND l.is_deleted = FALSE
            RETURNING {LESSON_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.content_type.as_i16())
        .bind(&input.content_path)
        .bind(&input.external_url)
        .bind(input.duration_in_minutes)
        .bind(input.order)
        .bind(input.is_free)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_lesson()))
    }

    async fn set_content_path(&self, id: i64, path: &str, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE lessons
            SET content_path = $2, last_modified_by = $3, last_modified_on = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(path)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE lessons
            SET is_deleted = TRUE, last_modified_by = $2, last_modified_on = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
