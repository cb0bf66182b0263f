//! Startup Seeder
//!
//! Loads `roles.json`, `users.json`, `categories.json`, `skills.json` and
//! `courses.json` from the seed directory. Each set is applied only when its
//! table is empty, so restarting against a populated database is a no-op.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::SeedSettings;
use crate::domain::{ContentType, CourseLevel, Role};
use crate::shared::error::AppError;
use crate::shared::password::hash_password;

#[derive(Debug, Deserialize)]
struct SeedRole {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct SeedCategory {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    icon_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedSkill {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedCourse {
    title: String,
    description: String,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    thumbnail_path: Option<String>,
    level: String,
    #[serde(default)]
    is_published: bool,
    #[serde(default)]
    price: Option<Decimal>,
    duration_in_hours: i32,
    /// Category name, matched case-insensitively
    category: String,
    instructor_id: Uuid,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    sections: Vec<SeedSection>,
}

#[derive(Debug, Deserialize)]
struct SeedSection {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    lessons: Vec<SeedLesson>,
}

#[derive(Debug, Deserialize)]
struct SeedLesson {
    title: String,
    #[serde(default)]
    description: Option<String>,
    content_type: String,
    #[serde(default)]
    content_path: Option<String>,
    #[serde(default)]
    external_url: Option<String>,
    duration_in_minutes: i32,
    #[serde(default)]
    is_free: bool,
}

/// Applies JSON seed files to an empty database.
pub struct Seeder {
    pool: PgPool,
    directory: PathBuf,
    default_password: String,
}

impl Seeder {
    pub fn new(pool: PgPool, settings: &SeedSettings) -> Self {
        Self {
            pool,
            directory: PathBuf::from(&settings.directory),
            default_password: settings.default_password.clone(),
        }
    }

    /// Run every seed step in dependency order.
    #[instrument(skip(self), fields(directory = %self.directory.display()))]
    pub async fn run(&self) -> Result<(), AppError> {
        self.seed_roles().await?;
        self.seed_users().await?;
        self.seed_categories().await?;
        self.seed_skills().await?;
        self.seed_courses().await?;
        info!("Seeding finished");
        Ok(())
    }

    async fn table_is_empty(&self, table: &str) -> Result<bool, AppError> {
        let query = format!("SELECT NOT EXISTS (SELECT 1 FROM {})", table);
        let empty = sqlx::query_scalar::<_, bool>(&query)
            .fetch_one(&self.pool)
            .await?;
        Ok(empty)
    }

    /// Read a seed file. A missing file is skipped with a warning.
    async fn load<T: DeserializeOwned>(&self, file: &str) -> Result<Option<Vec<T>>, AppError> {
        let path = self.directory.join(file);
        if !path.exists() {
            warn!(path = %path.display(), "Seed file not found, skipping");
            return Ok(None);
        }
        read_seed_file(&path).await.map(Some)
    }

    async fn seed_roles(&self) -> Result<(), AppError> {
        if !self.table_is_empty("roles").await? {
            return Ok(());
        }
        let Some(roles) = self.load::<SeedRole>("roles.json").await? else {
            return Ok(());
        };

        let mut inserted = 0;
        for role in roles {
            if Role::parse(&role.name).is_none() {
                warn!(role = %role.name, "Unknown role in seed data, skipping");
                continue;
            }
            sqlx::query("INSERT INTO roles (name, description) VALUES ($1, $2)")
                .bind(&role.name)
                .bind(&role.description)
                .execute(&self.pool)
                .await?;
            inserted += 1;
        }
        info!(count = inserted, "Seeded roles");
        Ok(())
    }

    async fn seed_users(&self) -> Result<(), AppError> {
        if !self.table_is_empty("users").await? {
            return Ok(());
        }
        let Some(users) = self.load::<SeedUser>("users.json").await? else {
            return Ok(());
        };

        let password_hash = hash_password(&self.default_password)?;
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for user in users {
            let Some(role) = Role::parse(&user.role) else {
                warn!(user = %user.username, role = %user.role, "Unknown role for seeded user, skipping");
                continue;
            };

            sqlx::query(
                r#"
                INSERT INTO users (id, username, email, password_hash, first_name, last_name)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&password_hash)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(user.id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await?;
            inserted += 1;
        }

        tx.commit().await?;
        info!(count = inserted, "Seeded users");
        Ok(())
    }

    async fn seed_categories(&self) -> Result<(), AppError> {
        if !self.table_is_empty("categories").await? {
            return Ok(());
        }
        let Some(categories) = self.load::<SeedCategory>("categories.json").await? else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;
        for category in &categories {
            sqlx::query("INSERT INTO categories (name, description, icon_path) VALUES ($1, $2, $3)")
                .bind(&category.name)
                .bind(&category.description)
                .bind(&category.icon_path)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!(count = categories.len(), "Seeded categories");
        Ok(())
    }

    async fn seed_skills(&self) -> Result<(), AppError> {
        if !self.table_is_empty("skills").await? {
            return Ok(());
        }
        let Some(skills) = self.load::<SeedSkill>("skills.json").await? else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;
        for skill in &skills {
            sqlx::query("INSERT INTO skills (name, description) VALUES ($1, $2)")
                .bind(&skill.name)
                .bind(&skill.description)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!(count = skills.len(), "Seeded skills");
        Ok(())
    }

    async fn seed_courses(&self) -> Result<(), AppError> {
        if !self.table_is_empty("courses").await? {
            return Ok(());
        }
        let Some(courses) = self.load::<SeedCourse>("courses.json").await? else {
            return Ok(());
        };

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for course in &courses {
            let instructor_exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1 AND is_deleted = FALSE)",
            )
            .bind(course.instructor_id)
            .fetch_one(&mut *tx)
            .await?;
            if !instructor_exists {
                warn!(
                    course = %course.title,
                    instructor_id = %course.instructor_id,
                    "Instructor does not exist, skipping seeded course"
                );
                continue;
            }

            let category_id = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM categories WHERE LOWER(name) = LOWER($1) AND is_deleted = FALSE",
            )
            .bind(&course.category)
            .fetch_optional(&mut *tx)
            .await?;
            let Some(category_id) = category_id else {
                warn!(
                    course = %course.title,
                    category = %course.category,
                    "Category does not exist, skipping seeded course"
                );
                continue;
            };

            let Some(level) = CourseLevel::parse(&course.level) else {
                warn!(course = %course.title, level = %course.level, "Unknown level, skipping seeded course");
                continue;
            };

            insert_course(&mut tx, course, category_id, level).await?;
            inserted += 1;
        }

        tx.commit().await?;
        info!(count = inserted, skipped = courses.len() - inserted, "Seeded courses");
        Ok(())
    }
}

async fn read_seed_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    let data = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Internal(format!("Failed to read seed file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&data).map_err(|e| {
        AppError::Internal(format!("Invalid seed file {}: {}", path.display(), e))
    })
}

async fn insert_course(
    tx: &mut Transaction<'static, Postgres>,
    course: &SeedCourse,
    category_id: i64,
    level: CourseLevel,
) -> Result<(), AppError> {
    let course_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO courses (
            title, description, short_description, thumbnail_path, level,
            is_published, price, duration_in_hours, category_id, instructor_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING id
        "#,
    )
    .bind(&course.title)
    .bind(&course.description)
    .bind(&course.short_description)
    .bind(&course.thumbnail_path)
    .bind(level.as_i16())
    .bind(course.is_published)
    .bind(course.price)
    .bind(course.duration_in_hours)
    .bind(category_id)
    .bind(course.instructor_id)
    .fetch_one(&mut **tx)
    .await?;

    if !course.skills.is_empty() {
        sqlx::query(
            r#"
            INSERT INTO course_skills (course_id, skill_id)
            SELECT $1, id FROM skills
            WHERE LOWER(name) = ANY(SELECT LOWER(n) FROM UNNEST($2::TEXT[]) AS n)
              AND is_deleted = FALSE
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(course_id)
        .bind(&course.skills)
        .execute(&mut **tx)
        .await?;
    }

    for (section_index, section) in course.sections.iter().enumerate() {
        let section_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO sections (course_id, title, description, sort_order, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(course_id)
        .bind(&section.title)
        .bind(&section.description)
        .bind(section_index as i32 + 1)
        .bind(course.instructor_id)
        .fetch_one(&mut **tx)
        .await?;

        for (lesson_index, lesson) in section.lessons.iter().enumerate() {
            let content_type = ContentType::parse(&lesson.content_type).unwrap_or(ContentType::Video);
            sqlx::query(
                r#"
                INSERT INTO lessons (
                    section_id, title, description, content_type, content_path,
                    external_url, duration_in_minutes, sort_order, is_free, created_by
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(section_id)
            .bind(&lesson.title)
            .bind(&lesson.description)
            .bind(content_type.as_i16())
            .bind(&lesson.content_path)
            .bind(&lesson.external_url)
            .bind(lesson.duration_in_minutes)
            .bind(lesson_index as i32 + 1)
            .bind(lesson.is_free)
            .bind(course.instructor_id)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_course_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{
                "title": "Rust Fundamentals",
                "description": "Ownership, borrowing and lifetimes",
                "level": "Beginner",
                "price": 49.99,
                "duration_in_hours": 12,
                "category": "Programming",
                "instructor_id": "01900000-0000-7000-8000-000000000002",
                "skills": ["Rust"],
                "sections": [{{
                    "title": "Getting started",
                    "lessons": [{{ "title": "Install", "content_type": "Video", "duration_in_minutes": 10 }}]
                }}]
            }}]"#
        )
        .unwrap();

        let courses: Vec<SeedCourse> = read_seed_file(file.path()).await.unwrap();
        assert_eq!(courses.len(), 1);
        let course = &courses[0];
        assert_eq!(course.price, Some(Decimal::new(4999, 2)));
        assert!(!course.is_published);
        assert_eq!(course.sections[0].lessons[0].title, "Install");
        assert!(!course.sections[0].lessons[0].is_free);
    }

    #[tokio::test]
    async fn test_invalid_seed_file_is_internal_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result: Result<Vec<SeedSkill>, _> = read_seed_file(file.path()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_shipped_seed_files_parse() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("seeds");

        let roles: Vec<SeedRole> = read_seed_file(&dir.join("roles.json")).await.unwrap();
        let users: Vec<SeedUser> = read_seed_file(&dir.join("users.json")).await.unwrap();
        let categories: Vec<SeedCategory> =
            read_seed_file(&dir.join("categories.json")).await.unwrap();
        let skills: Vec<SeedSkill> = read_seed_file(&dir.join("skills.json")).await.unwrap();
        let courses: Vec<SeedCourse> = read_seed_file(&dir.join("courses.json")).await.unwrap();

        assert!(roles.iter().all(|r| Role::parse(&r.name).is_some()));
        assert!(users.iter().all(|u| Role::parse(&u.role).is_some()));
        for course in &courses {
            assert!(CourseLevel::parse(&course.level).is_some(), "{}", course.title);
            assert!(
                categories.iter().any(|c| c.name.eq_ignore_ascii_case(&course.category)),
                "{}",
                course.title
            );
            assert!(users.iter().any(|u| u.id == course.instructor_id), "{}", course.title);
            for skill in &course.skills {
                assert!(skills.iter().any(|s| s.name.eq_ignore_ascii_case(skill)), "{}", skill);
            }
        }
    }
}
