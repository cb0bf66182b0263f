//! Category Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuditInfo, Category, CategoryInput, CategoryRepository, CategoryWithCount};
use crate::infrastructure::database::conflict_on_unique;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

const DUPLICATE_NAME: &str = "Category name already exists";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
    icon_path: Option<String>,
    created_by: Option<Uuid>,
    created_on: DateTime<Utc>,
    last_modified_by: Option<Uuid>,
    last_modified_on: DateTime<Utc>,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            description: self.description,
            icon_path: self.icon_path,
            audit: AuditInfo {
                created_by: self.created_by,
                created_on: self.created_on,
                last_modified_by: self.last_modified_by,
                last_modified_on: self.last_modified_on,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryCountRow {
    #[sqlx(flatten)]
    category: CategoryRow,
    course_count: i64,
}

impl CategoryCountRow {
    fn into_with_count(self) -> CategoryWithCount {
        CategoryWithCount {
            category: self.category.into_category(),
            course_count: self.course_count,
        }
    }
}

const WITH_COUNT_SELECT: &str = r#"
    SELECT c.id, c.name, c.description, c.icon_path, c.created_by, c.created_on,
           c.last_modified_by, c.last_modified_on,
           (SELECT COUNT(*) FROM courses co
            WHERE co.category_id = c.id AND co.is_deleted = FALSE) AS course_count
    FROM categories c
    WHERE c.is_deleted = FALSE
    ORDER BY c.name
"#;

/// PostgreSQL category repository implementation.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, description, icon_path, created_by, created_on,
                   last_modified_by, last_modified_on
            FROM categories
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_category()))
    }

    async fn find_all_with_counts(&self) -> Result<Vec<CategoryWithCount>, AppError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(WITH_COUNT_SELECT)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_with_count()).collect())
    }

    async fn find_paged(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<CategoryWithCount>, i64), AppError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(&format!(
            "{WITH_COUNT_SELECT} LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;

        Ok((rows.into_iter().map(|r| r.into_with_count()).collect(), total))
    }

    async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM categories
                WHERE LOWER(name) = LOWER($1)
                  AND is_deleted = FALSE
                  AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, input: &CategoryInput, actor: Uuid) -> Result<Category, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (name, description, icon_path, created_by, last_modified_by)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, name, description, icon_path, created_by, created_on,
                      last_modified_by, last_modified_on
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.icon_path)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

        Ok(row.into_category())
    }

    async fn update(
        &self,
        id: i64,
        input: &CategoryInput,
        actor: Uuid,
    ) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
            SET name = $2,
                description = $3,
                icon_path = COALESCE($4, icon_path),
                last_modified_by = $5,
                last_modified_on = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING id, name, description, icon_path, created_by, created_on,
                      last_modified_by, last_modified_on
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(&input.icon_path)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

        Ok(row.map(|r| r.into_category()))
    }

    async fn has_courses(&self, id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM courses WHERE category_id = $1 AND is_deleted = FALSE)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE categories
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

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE is_deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
