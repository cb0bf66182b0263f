//! User entity and repository trait.
//!
//! Maps to the `users` table; role membership lives in `user_roles`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_objects::Role;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY (v7, generated by the application)
/// - username: VARCHAR(64) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - first_name / last_name: VARCHAR(100) NOT NULL
/// - bio: TEXT NULL
/// - profile_picture_path: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// - last_login_at: TIMESTAMPTZ NULL
/// - lockout_end: TIMESTAMPTZ NULL
/// - is_deleted: BOOLEAN NOT NULL DEFAULT FALSE
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub profile_picture_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub lockout_end: Option<DateTime<Utc>>,
    pub roles: Vec<Role>,
}

impl User {
    /// "First Last", trimmed when one part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Locked while `lockout_end` lies in the future.
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.map(|end| end > now).unwrap_or(false)
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            username: String::new(),
            email: String::new(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            bio: None,
            profile_picture_path: None,
            created_at: Utc::now(),
            last_login_at: None,
            lockout_end: None,
            roles: Vec::new(),
        }
    }
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a non-deleted user by ID, roles included.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;

    /// Insert the user and its role rows.
    async fn create(&self, user: &User) -> Result<User, AppError>;

    /// Persist profile fields (names, bio, picture, email).
    async fn update_profile(&self, user: &User) -> Result<User, AppError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Set or clear the lockout end.
    async fn set_lockout(&self, id: Uuid, until: Option<DateTime<Utc>>) -> Result<bool, AppError>;

    /// Replace the user's role set.
    async fn set_roles(&self, id: Uuid, roles: &[Role]) -> Result<(), AppError>;

    /// Page of users ordered by first name, optionally restricted to one role.
    async fn list(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<(Vec<User>, i64), AppError>;

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn count_by_role(&self, role: Role) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_test_user() -> User {
        User {
            id: Uuid::now_v7(),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            roles: vec![Role::Student],
            ..Default::default()
        }
    }

    #[test]
    fn test_full_name() {
        let user = create_test_user();
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn test_full_name_trims_missing_last_name() {
        let mut user = create_test_user();
        user.last_name = String::new();
        assert_eq!(user.full_name(), "Jane");
    }

    #[test]
    fn test_has_role() {
        let user = create_test_user();
        assert!(user.has_role(Role::Student));
        assert!(!user.has_role(Role::Admin));
    }

    #[test]
    fn test_lockout() {
        let now = Utc::now();
        let mut user = create_test_user();
        assert!(!user.is_locked_at(now));

        user.lockout_end = Some(now + Duration::minutes(5));
        assert!(user.is_locked_at(now));

        user.lockout_end = Some(now - Duration::minutes(5));
        assert!(!user.is_locked_at(now));
    }
}
