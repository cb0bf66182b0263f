//! Review Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{AuditInfo, RatingStats, Review, ReviewDetails, ReviewRepository};
use crate::infrastructure::database::conflict_on_unique;
use crate::shared::error::AppError;

const REVIEW_COLUMNS: &str = r#"
    r.id, r.user_id, r.course_id, r.rating, r.comment,
    r.created_by, r.created_on, r.last_modified_by, r.last_modified_on
"#;

const DETAILS_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.course_id, r.rating, r.comment,
           r.created_by, r.created_on, r.last_modified_by, r.last_modified_on,
           TRIM(u.first_name || ' ' || u.last_name) AS user_name,
           c.title AS course_title
    FROM reviews r
    JOIN users u ON u.id = r.user_id
    JOIN courses c ON c.id = r.course_id
    WHERE r.is_deleted = FALSE
"#;

#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: Uuid,
    course_id: i64,
    rating: i32,
    comment: Option<String>,
    created_by: Option<Uuid>,
    created_on: DateTime<Utc>,
    last_modified_by: Option<Uuid>,
    last_modified_on: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            rating: self.rating,
            comment: self.comment,
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
struct ReviewDetailsRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    user_name: String,
    course_title: String,
}

impl ReviewDetailsRow {
    fn into_details(self) -> ReviewDetails {
        ReviewDetails {
            review: self.review.into_review(),
            user_name: self.user_name,
            course_title: self.course_title,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RatingStatsRow {
    review_count: i64,
    average_rating: f64,
}

/// PostgreSQL review repository implementation.
#[derive(Clone)]
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = $1 AND r.is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_review()))
    }

    async fn find_by_course(&self, course_id: i64) -> Result<Vec<ReviewDetails>, AppError> {
        let rows = sqlx::query_as::<_, ReviewDetailsRow>(&format!(
            "{DETAILS_SELECT} AND r.course_id = $1 ORDER BY r.created_on DESC, r.id DESC"
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_details()).collect())
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<ReviewDetails>, AppError> {
        let rows = sqlx::query_as::<_, ReviewDetailsRow>(&format!(
            "{DETAILS_SELECT} AND r.user_id = $1 ORDER BY r.created_on DESC, r.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_details()).collect())
    }

    async fn find_recent_for_instructor(
        &self,
        instructor_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ReviewDetails>, AppError> {
        let rows = sqlx::query_as::<_, ReviewDetailsRow>(&format!(
            r#"
            {DETAILS_SELECT}
              AND c.instructor_id = $1 AND c.is_deleted = FALSE
            ORDER BY r.created_on DESC, r.id DESC
            LIMIT $2
            "#
        ))
        .bind(instructor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_details()).collect())
    }

    async fn exists(&self, user_id: Uuid, course_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM reviews
                WHERE user_id = $1 AND course_id = $2 AND is_deleted = FALSE
            )
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(
        &self,
        user_id: Uuid,
        course_id: i64,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            INSERT INTO reviews AS r (user_id, course_id, rating, comment, created_by, last_modified_by)
            VALUES ($1, $2, $3, $4, $1, $1)
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "You have already reviewed this course"))?;

        Ok(row.into_review())
    }

    async fn update(
        &self,
        id: i64,
        rating: i32,
        comment: Option<String>,
        actor: Uuid,
    ) -> Result<Option<Review>, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            UPDATE reviews AS r
            SET rating = $2, comment = $3, last_modified_by = $4, last_modified_on = NOW()
            WHERE r.id = $1 AND r.is_deleted = FALSE
            RETURNING {REVIEW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(rating)
        .bind(comment)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_review()))
    }

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE reviews
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

    async fn stats_for_course(&self, course_id: i64) -> Result<RatingStats, AppError> {
        let row = sqlx::query_as::<_, RatingStatsRow>(
            r#"
            SELECT COUNT(*) AS review_count,
                   COALESCE(AVG(rating)::FLOAT8, 0) AS average_rating
            FROM reviews
            WHERE course_id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingStats {
            review_count: row.review_count,
            average_rating: row.average_rating,
        })
    }

    async fn stats_for_instructor(&self, instructor_id: Uuid) -> Result<RatingStats, AppError> {
        let row = sqlx::query_as::<_, RatingStatsRow>(
            r#"
            SELECT COUNT(r.id) AS review_count,
                   COALESCE(AVG(r.rating)::FLOAT8, 0) AS average_rating
            FROM reviews r
            JOIN courses c ON c.id = r.course_id
            WHERE c.instructor_id = $1 AND c.is_deleted = FALSE AND r.is_deleted = FALSE
            "#,
        )
        .bind(instructor_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(RatingStats {
            review_count: row.review_count,
            average_rating: row.average_rating,
        })
    }
}
