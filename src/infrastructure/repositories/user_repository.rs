//! User Repository Implementation
//!
//! PostgreSQL implementation of the UserRepository trait.
//! Role membership is read from and written to `user_roles`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{parse_roles, Role, User, UserRepository};
use crate::infrastructure::database::conflict_on_unique;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Columns selected for every user query; `roles` is aggregated from `user_roles`.
const USER_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.password_hash, u.first_name, u.last_name,
    u.bio, u.profile_picture_path, u.created_at, u.last_login_at, u.lockout_end,
    ARRAY(SELECT ur.role FROM user_roles ur WHERE ur.user_id = u.id ORDER BY ur.role) AS roles
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    bio: Option<String>,
    profile_picture_path: Option<String>,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
    lockout_end: Option<DateTime<Utc>>,
    roles: Vec<String>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            profile_picture_path: self.profile_picture_path,
            created_at: self.created_at,
            last_login_at: self.last_login_at,
            lockout_end: self.lockout_end,
            roles: parse_roles(self.roles.iter().map(String::as_str)),
        }
    }
}

/// PostgreSQL user repository implementation.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1 AND u.is_deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE LOWER(u.email) = LOWER($1) AND u.is_deleted = FALSE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1))",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, first_name, last_name,
                               bio, profile_picture_path, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(&user.profile_picture_path)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "User with this email or username already exists"))?;

        for role in &user.roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user.id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after insert", user.id)))
    }

    async fn update_profile(&self, user: &User) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2,
                last_name = $3,
                bio = $4,
                profile_picture_path = $5,
                email = $6
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.bio)
        .bind(&user.profile_picture_path)
        .bind(&user.email)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "Email is already registered"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", user.id)));
        }

        self.find_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user.id)))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2 WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }

        Ok(())
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_lockout(&self, id: Uuid, until: Option<DateTime<Utc>>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET lockout_end = $2 WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .bind(until)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_roles(&self, id: Uuid, roles: &[Role]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for role in roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<(Vec<User>, i64), AppError> {
        let role_name = role.map(|r| r.as_str());

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE u.is_deleted = FALSE
              AND ($1::TEXT IS NULL OR EXISTS(
                    SELECT 1 FROM user_roles ur WHERE ur.user_id = u.id AND ur.role = $1))
            ORDER BY u.first_name, u.last_name
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(role_name)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users u
            WHERE u.is_deleted = FALSE
              AND ($1::TEXT IS NULL OR EXISTS(
                    SELECT 1 FROM user_roles ur WHERE ur.user_id = u.id AND ur.role = $1))
            "#,
        )
        .bind(role_name)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows.into_iter().map(|r| r.into_user()).collect(), total))
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE is_deleted = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users u
            JOIN user_roles ur ON ur.user_id = u.id
            WHERE u.is_deleted = FALSE AND ur.role = $1
            "#,
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
