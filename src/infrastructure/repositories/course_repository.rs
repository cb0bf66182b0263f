//! Course Repository Implementation
//!
//! Catalogue queries return `CourseSummary` rows: the course joined with its
//! category and instructor names, enrollment and review aggregates, and skill names.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{
    AuditInfo, Course, CourseInput, CourseLevel, CourseOrder, CourseQuery, CourseRepository,
    CourseScope, CourseSort, CourseSummary,
};
use crate::shared::error::AppError;

const COURSE_COLUMNS: &str = r#"
    c.id, c.title, c.description, c.short_description, c.thumbnail_path, c.level,
    c.is_published, c.price, c.duration_in_hours, c.category_id, c.instructor_id,
    c.created_by, c.created_on, c.last_modified_by, c.last_modified_on
"#;

/// Summary projection; every query appends further `AND` clauses after the WHERE.
const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.title, c.description, c.short_description, c.thumbnail_path, c.level,
           c.is_published, c.price, c.duration_in_hours, c.category_id, c.instructor_id,
           c.created_by, c.created_on, c.last_modified_by, c.last_modified_on,
           cat.name AS category_name,
           TRIM(u.first_name || ' ' || u.last_name) AS instructor_name,
           (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollment_count,
           (SELECT COUNT(*) FROM reviews r
            WHERE r.course_id = c.id AND r.is_deleted = FALSE) AS review_count,
           COALESCE((SELECT AVG(r.rating)::FLOAT8 FROM reviews r
                     WHERE r.course_id = c.id AND r.is_deleted = FALSE), 0) AS average_rating,
           ARRAY(SELECT s.name FROM course_skills cs
                 JOIN skills s ON s.id = cs.skill_id
                 WHERE cs.course_id = c.id AND s.is_deleted = FALSE
                 ORDER BY s.name) AS skill_names
    FROM courses c
    JOIN categories cat ON cat.id = c.category_id
    JOIN users u ON u.id = c.instructor_id
    WHERE c.is_deleted = FALSE
"#;

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    description: String,
    short_description: Option<String>,
    thumbnail_path: Option<String>,
    level: i16,
    is_published: bool,
    price: Option<Decimal>,
    duration_in_hours: i32,
    category_id: i64,
    instructor_id: Uuid,
    created_by: Option<Uuid>,
    created_on: DateTime<Utc>,
    last_modified_by: Option<Uuid>,
    last_modified_on: DateTime<Utc>,
}

impl CourseRow {
    fn into_course(self) -> Course {
        Course {
            id: self.id,
            title: self.title,
            description: self.description,
            short_description: self.short_description,
            thumbnail_path: self.thumbnail_path,
            level: CourseLevel::from_i16(self.level).unwrap_or_default(),
            is_published: self.is_published,
            price: self.price,
            duration_in_hours: self.duration_in_hours,
            category_id: self.category_id,
            instructor_id: self.instructor_id,
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
struct CourseSummaryRow {
    #[sqlx(flatten)]
    course: CourseRow,
    category_name: String,
    instructor_name: String,
    enrollment_count: i64,
    review_count: i64,
    average_rating: f64,
    skill_names: Vec<String>,
}

impl CourseSummaryRow {
    fn into_summary(self) -> CourseSummary {
        CourseSummary {
            course: self.course.into_course(),
            category_name: self.category_name,
            instructor_name: self.instructor_name,
            enrollment_count: self.enrollment_count,
            review_count: self.review_count,
            average_rating: self.average_rating,
            skill_names: self.skill_names,
        }
    }
}

/// Catalogue filters shared by the page query and its count.
fn push_catalogue_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &CourseQuery) {
    builder.push(" AND c.is_published = TRUE");

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(term));
        builder
            .push(" AND (c.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.short_description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category_id) = query.category_id {
        builder.push(" AND c.category_id = ").push_bind(category_id);
    }
    if let Some(level) = query.level {
        builder.push(" AND c.level = ").push_bind(level.as_i16());
    }
    if let Some(skill_id) = query.skill_id {
        builder
            .push(" AND EXISTS(SELECT 1 FROM course_skills cs WHERE cs.course_id = c.id AND cs.skill_id = ")
            .push_bind(skill_id)
            .push(")");
    }
    if let Some(min) = query.min_price {
        builder.push(" AND COALESCE(c.price, 0) >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND COALESCE(c.price, 0) <= ").push_bind(max);
    }
}

/// Escapes LIKE wildcards so the term matches as a literal substring.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn catalogue_order(sort: CourseSort, descending: bool) -> String {
    let direction = if descending { "DESC" } else { "ASC" };
    match sort {
        CourseSort::Newest => "c.created_on DESC, c.id DESC".to_string(),
        CourseSort::Title => format!("c.title {direction}, c.id"),
        CourseSort::Price => format!("COALESCE(c.price, 0) {direction}, c.id"),
        CourseSort::Rating => format!("average_rating {direction}, c.id"),
        CourseSort::Popular => format!("enrollment_count {direction}, c.id"),
    }
}

/// PostgreSQL course repository implementation.
#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn replace_skills(
        conn: &mut sqlx::PgConnection,
        course_id: i64,
        skill_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM course_skills WHERE course_id = $1")
            .bind(course_id)
            .execute(&mut *conn)
            .await?;

        if !skill_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO course_skills (course_id, skill_id)
                SELECT $1, s.id FROM skills s
                WHERE s.id = ANY($2) AND s.is_deleted = FALSE
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(course_id)
            .bind(skill_ids)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Course>, AppError> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses c WHERE c.id = $1 AND c.is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_course()))
    }

    async fn find_summary(&self, id: i64) -> Result<Option<CourseSummary>, AppError> {
        let row = sqlx::query_as::<_, CourseSummaryRow>(&format!("{SUMMARY_SELECT} AND c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.into_summary()))
    }

    async fn search(&self, query: &CourseQuery) -> Result<(Vec<CourseSummary>, i64), AppError> {
        let mut count_builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM courses c WHERE c.is_deleted = FALSE",
        );
        push_catalogue_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_catalogue_filters(&mut builder, query);
        builder
            .push(" ORDER BY ")
            .push(catalogue_order(query.sort, query.descending))
            .push(" LIMIT ")
            .push_bind(query.page.limit())
            .push(" OFFSET ")
            .push_bind(query.page.offset());

        let rows = builder
            .build_query_as::<CourseSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(|r| r.into_summary()).collect(), total))
    }

    async fn list(
        &self,
        scope: CourseScope,
        order: CourseOrder,
        limit: Option<i64>,
    ) -> Result<Vec<CourseSummary>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);

        match scope {
            CourseScope::All => {}
            CourseScope::Published => {
                builder.push(" AND c.is_published = TRUE");
            }
            CourseScope::Category(category_id) => {
                builder
                    .push(" AND c.is_published = TRUE AND c.category_id = ")
                    .push_bind(category_id);
            }
            CourseScope::Instructor(instructor_id) => {
                builder.push(" AND c.instructor_id = ").push_bind(instructor_id);
            }
            CourseScope::NotEnrolledBy(user_id) => {
                builder
                    .push(" AND c.is_published = TRUE AND NOT EXISTS(SELECT 1 FROM enrollments e WHERE e.course_id = c.id AND e.user_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
        }

        let order_by = match order {
            CourseOrder::Newest => "c.created_on DESC, c.id DESC",
            CourseOrder::TopRated => {
                builder.push(
                    " AND EXISTS(SELECT 1 FROM reviews r WHERE r.course_id = c.id AND r.is_deleted = FALSE)",
                );
                "average_rating DESC, review_count DESC, c.id"
            }
            CourseOrder::MostEnrolled => "enrollment_count DESC, c.id",
            CourseOrder::Title => "c.title, c.id",
        };
        builder.push(" ORDER BY ").push(order_by);

        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let rows = builder
            .build_query_as::<CourseSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_summary()).collect())
    }

    async fn create(
        &self,
        input: &CourseInput,
        instructor_id: Uuid,
        skill_ids: &[i64],
    ) -> Result<Course, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            INSERT INTO courses AS c (title, description, short_description, thumbnail_path, level,
                                      price, duration_in_hours, category_id, instructor_id,
                                      is_published, created_by, last_modified_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, $9, $9)
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.short_description)
        .bind(&input.thumbnail_path)
        .bind(input.level.as_i16())
        .bind(input.price)
        .bind(input.duration_in_hours)
        .bind(input.category_id)
        .bind(instructor_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_skills(&mut *tx, row.id, skill_ids).await?;

        tx.commit().await?;

        Ok(row.into_course())
    }

    async fn update(
        &self,
        id: i64,
        input: &CourseInput,
        skill_ids: &[i64],
        actor: Uuid,
    ) -> Result<Option<Course>, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CourseRow>(&format!(
            r#"
            UPDATE courses AS c
            SET title = $2,
                description = $3,
                short_description = $4,
                thumbnail_path = COALESCE($5, c.thumbnail_path),
                level = $6,
                price = $7,
                duration_in_hours = $8,
                category_id = $9,
                last_modified_by = $10,
                last_modified_on = NOW()
            WHERE c.id = $1 AND c.is_deleted = FALSE
            RETURNING {COURSE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.short_description)
        .bind(&input.thumbnail_path)
        .bind(input.level.as_i16())
        .bind(input.price)
        .bind(input.duration_in_hours)
        .bind(input.category_id)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Self::replace_skills(&mut *tx, id, skill_ids).await?;

        tx.commit().await?;

        Ok(Some(row.into_course()))
    }

    async fn set_published(&self, id: i64, published: bool, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET is_published = $2, last_modified_by = $3, last_modified_on = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(published)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_thumbnail(&self, id: i64, path: &str, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE courses
            SET thumbnail_path = $2, last_modified_by = $3, last_modified_on = NOW()
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

    async fn has_enrollments(&self, id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE course_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE courses
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

    async fn count(&self, published: Option<bool>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM courses
            WHERE is_deleted = FALSE AND ($1::BOOLEAN IS NULL OR is_published = $1)
            "#,
        )
        .bind(published)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_by_instructor(
        &self,
        instructor_id: Uuid,
        published: Option<bool>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM courses
            WHERE instructor_id = $1
              AND is_deleted = FALSE
              AND ($2::BOOLEAN IS NULL OR is_published = $2)
            "#,
        )
        .bind(instructor_id)
        .bind(published)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
