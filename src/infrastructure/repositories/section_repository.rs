//! Section Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuditInfo, Section, SectionInput, SectionRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct SectionRow {
    id: i64,
    course_id: i64,
    title: String,
    description: Option<String>,
    sort_order: i32,
    created_by: Option<Uuid>,
    created_on: DateTime<Utc>,
    last_modified_by: Option<Uuid>,
    last_modified_on: DateTime<Utc>,
}

impl SectionRow {
    fn into_section(self) -> Section {
        Section {
            id: self.id,
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            order: self.sort_order,
            audit: AuditInfo {
                created_by: self.created_by,
                created_on: self.created_on,
                last_modified_by: self.last_modified_by,
                last_modified_on: self.last_modified_on,
            },
        }
    }
}

/// PostgreSQL section repository implementation.
#[derive(Clone)]
pub struct PgSectionRepository {
    pool: PgPool,
}

impl PgSectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SectionRepository for PgSectionRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Section>, AppError> {
        let row = sqlx::query_as::<_, SectionRow>(
            r#"
            SELECT id, course_id, title, description, sort_order, created_by, created_on,
                   last_modified_by, last_modified_on
            FROM sections
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_section()))
    }

    async fn find_by_course(&self, course_id: i64) -> Result<Vec<Section>, AppError> {
        let rows = sqlx::query_as::<_, SectionRow>(
            r#"
            SELECT id, course_id, title, description, sort_order, created_by, created_on,
                   last_modified_by, last_modified_on
            FROM sections
            WHERE course_id = $1 AND is_deleted = FALSE
            ORDER BY sort_order, id
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_section()).collect())
    }

    async fn create(
        &self,
        course_id: i64,
        input: &SectionInput,
        actor: Uuid,
    ) -> Result<Section, AppError> {
        // Without an explicit order the section goes after the current last one
        let row = sqlx::query_as::<_, SectionRow>(
            r#"
            INSERT INTO sections (course_id, title, description, sort_order, created_by, last_modified_by)
            VALUES ($1, $2, $3,
                    COALESCE($4, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM sections
                                  WHERE course_id = $1 AND is_deleted = FALSE)),
                    $5, $5)
            RETURNING id, course_id, title, description, sort_order, created_by, created_on,
                      last_modified_by, last_modified_on
            "#,
        )
        .bind(course_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.order)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_section())
    }

    async fn update(
        &self,
        id: i64,
        input: &SectionInput,
        actor: Uuid,
    ) -> Result<Option<Section>, AppError> {
        let row = sqlx::query_as::<_, SectionRow>(
            r#"
            UPDATE sections
            SET title = $2,
                description = $3,
                sort_order = COALESCE($4, sort_order),
                last_modified_by = $5,
                last_modified_on = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING id, course_id, title, description, sort_order, created_by, created_on,
                      last_modified_by, last_modified_on
            "#,
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.order)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_section()))
    }

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE sections
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

    async fn count_by_course(&self, course_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sections WHERE course_id = $1 AND is_deleted = FALSE",
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
