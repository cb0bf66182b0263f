//! Skill Repository Implementation
//!
//! Skills plus the `course_skills` and `user_skills` link tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    AuditInfo, Skill, SkillInput, SkillRepository, SkillWithCount, UserSkill,
    DEFAULT_PROFICIENCY_LEVEL,
};
use crate::infrastructure::database::conflict_on_unique;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

const DUPLICATE_NAME: &str = "Skill name already exists";

#[derive(Debug, sqlx::FromRow)]
struct SkillRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_by: Option<Uuid>,
    created_on: DateTime<Utc>,
    last_modified_by: Option<Uuid>,
    last_modified_on: DateTime<Utc>,
}

impl SkillRow {
    fn into_skill(self) -> Skill {
        Skill {
            id: self.id,
            name: self.name,
            description: self.description,
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
struct SkillCountRow {
    #[sqlx(flatten)]
    skill: SkillRow,
    course_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct UserSkillRow {
    user_id: Uuid,
    skill_id: i64,
    skill_name: String,
    proficiency_level: i32,
    added_at: DateTime<Utc>,
}

impl UserSkillRow {
    fn into_user_skill(self) -> UserSkill {
        UserSkill {
            user_id: self.user_id,
            skill_id: self.skill_id,
            skill_name: self.skill_name,
            proficiency_level: self.proficiency_level,
            added_at: self.added_at,
        }
    }
}

/// PostgreSQL skill repository implementation.
#[derive(Clone)]
pub struct PgSkillRepository {
    pool: PgPool,
}

impl PgSkillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SkillRepository for PgSkillRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Skill>, AppError> {
        let row = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT id, name, description, created_by, created_on, last_modified_by, last_modified_on
            FROM skills
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_skill()))
    }

    async fn find_all(&self) -> Result<Vec<Skill>, AppError> {
        let rows = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT id, name, description, created_by, created_on, last_modified_by, last_modified_on
            FROM skills
            WHERE is_deleted = FALSE
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_skill()).collect())
    }

    async fn find_paged(&self, page: PageRequest) -> Result<(Vec<Skill>, i64), AppError> {
        let rows = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT id, name, description, created_by, created_on, last_modified_by, last_modified_on
            FROM skills
            WHERE is_deleted = FALSE
            ORDER BY name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;

        Ok((rows.into_iter().map(|r| r.into_skill()).collect(), total))
    }

    async fn find_popular(&self, limit: i64) -> Result<Vec<SkillWithCount>, AppError> {
        let rows = sqlx::query_as::<_, SkillCountRow>(
            r#"
            SELECT s.id, s.name, s.description, s.created_by, s.created_on,
                   s.last_modified_by, s.last_modified_on,
                   COUNT(c.id) AS course_count
            FROM skills s
            LEFT JOIN course_skills cs ON cs.skill_id = s.id
            LEFT JOIN courses c ON c.id = cs.course_id AND c.is_deleted = FALSE
            WHERE s.is_deleted = FALSE
            GROUP BY s.id
            ORDER BY course_count DESC, s.name
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SkillWithCount {
                skill: r.skill.into_skill(),
                course_count: r.course_count,
            })
            .collect())
    }

    async fn find_by_course(&self, course_id: i64) -> Result<Vec<Skill>, AppError> {
        let rows = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT s.id, s.name, s.description, s.created_by, s.created_on,
                   s.last_modified_by, s.last_modified_on
            FROM skills s
            JOIN course_skills cs ON cs.skill_id = s.id
            WHERE cs.course_id = $1 AND s.is_deleted = FALSE
            ORDER BY s.name
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_skill()).collect())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, SkillRow>(
            r#"
            SELECT id, name, description, created_by, created_on, last_modified_by, last_modified_on
            FROM skills
            WHERE id = ANY($1) AND is_deleted = FALSE
            ORDER BY name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_skill()).collect())
    }

    async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM skills
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

    async fn create(&self, input: &SkillInput, actor: Uuid) -> Result<Skill, AppError> {
        let row = sqlx::query_as::<_, SkillRow>(
            r#"
            INSERT INTO skills (name, description, created_by, last_modified_by)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, description, created_by, created_on, last_modified_by, last_modified_on
            "#,
        )
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

        Ok(row.into_skill())
    }

    async fn update(
        &self,
        id: i64,
        input: &SkillInput,
        actor: Uuid,
    ) -> Result<Option<Skill>, AppError> {
        let row = sqlx::query_as::<_, SkillRow>(
            r#"
            UPDATE skills
            SET name = $2, description = $3, last_modified_by = $4, last_modified_on = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            RETURNING id, name, description, created_by, created_on, last_modified_by, last_modified_on
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_NAME))?;

        Ok(row.map(|r| r.into_skill()))
    }

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE skills
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
            "SELECT COUNT(*) FROM skills WHERE is_deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn find_user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>, AppError> {
        let rows = sqlx::query_as::<_, UserSkillRow>(
            r#"
            SELECT us.user_id, us.skill_id, s.name AS skill_name,
                   us.proficiency_level, us.added_at
            FROM user_skills us
            JOIN skills s ON s.id = us.skill_id
            WHERE us.user_id = $1 AND s.is_deleted = FALSE
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_user_skill()).collect())
    }

    async fn add_user_skills(&self, user_id: Uuid, skill_ids: &[i64]) -> Result<u64, AppError> {
        if skill_ids.is_empty() {
            return Ok(0);
        }

        // Unknown or deleted skills are filtered by the join
        let result = sqlx::query(
            r#"
            INSERT INTO user_skills (user_id, skill_id, proficiency_level, added_at)
            SELECT $1, s.id, $3, NOW()
            FROM skills s
            WHERE s.id = ANY($2) AND s.is_deleted = FALSE
            ON CONFLICT (user_id, skill_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(skill_ids)
        .bind(DEFAULT_PROFICIENCY_LEVEL)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn remove_user_skill(&self, user_id: Uuid, skill_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM user_skills WHERE user_id = $1 AND skill_id = $2")
            .bind(user_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
