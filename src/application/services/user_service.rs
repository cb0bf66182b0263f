//! User Service
//!
//! Profile management, user skills and admin account operations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::dto::request::UpdateProfileRequest;
use crate::application::dto::response::{ProfileDto, UserDto, UserSkillDto};
use crate::domain::{Role, SessionRepository, SkillRepository, UserRepository};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, PagedResult};

/// Lock applied when an admin locks an account without an end date.
const INDEFINITE_LOCK_YEARS: i64 = 100;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Profile with roles and skills
    async fn get_profile(&self, user_id: Uuid) -> Result<ProfileDto, UserError>;

    async fn get_by_email(&self, email: &str) -> Result<UserDto, UserError>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfileRequest,
    ) -> Result<UserDto, UserError>;

    /// Store a new picture path, returning the updated user and the previous path
    async fn set_profile_picture(
        &self,
        user_id: Uuid,
        path: String,
    ) -> Result<(UserDto, Option<String>), UserError>;

    /// Users ordered by first name, optionally filtered by role
    async fn list_users(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<PagedResult<UserDto>, UserError>;

    async fn get_user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkillDto>, UserError>;

    /// Link skills to the user. Existing links and unknown ids are skipped.
    async fn add_user_skills(
        &self,
        user_id: Uuid,
        skill_ids: &[i64],
    ) -> Result<Vec<UserSkillDto>, UserError>;

    async fn remove_user_skill(&self, user_id: Uuid, skill_id: i64) -> Result<(), UserError>;

    /// Replace the role set and end all sessions
    async fn set_roles(&self, user_id: Uuid, roles: Vec<Role>) -> Result<UserDto, UserError>;

    /// Lock until the given instant (indefinitely when `None`) and end all sessions
    async fn lock(&self, user_id: Uuid, until: Option<DateTime<Utc>>) -> Result<UserDto, UserError>;

    async fn unlock(&self, user_id: Uuid) -> Result<UserDto, UserError>;

    async fn delete_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<(), UserError>;
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("User skill not found")]
    SkillNotFound,

    #[error("You cannot delete your own account")]
    CannotDeleteSelf,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound | UserError::SkillNotFound => AppError::NotFound(err.to_string()),
            UserError::EmailTaken => AppError::Conflict(err.to_string()),
            UserError::CannotDeleteSelf => AppError::BadRequest(err.to_string()),
            UserError::Repository(e) => e,
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl<U, K, S>
where
    U: UserRepository,
    K: SkillRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    skill_repo: Arc<K>,
    session_repo: Arc<S>,
}

impl<U, K, S> UserServiceImpl<U, K, S>
where
    U: UserRepository,
    K: SkillRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, skill_repo: Arc<K>, session_repo: Arc<S>) -> Self {
        Self {
            user_repo,
            skill_repo,
            session_repo,
        }
    }

    async fn load(&self, user_id: Uuid) -> Result<crate::domain::User, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }
}

#[async_trait]
impl<U, K, S> UserService for UserServiceImpl<U, K, S>
where
    U: UserRepository + 'static,
    K: SkillRepository + 'static,
    S: SessionRepository + 'static,
{
    async fn get_profile(&self, user_id: Uuid) -> Result<ProfileDto, UserError> {
        let user = self.load(user_id).await?;
        let skills = self.skill_repo.find_user_skills(user_id).await?;

        Ok(ProfileDto {
            user: UserDto::from(user),
            skills: skills.into_iter().map(UserSkillDto::from).collect(),
        })
    }

    async fn get_by_email(&self, email: &str) -> Result<UserDto, UserError> {
        self.user_repo
            .find_by_email(email.trim())
            .await?
            .map(UserDto::from)
            .ok_or(UserError::NotFound)
    }

    #[instrument(skip(self, update))]
    async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfileRequest,
    ) -> Result<UserDto, UserError> {
        let mut user = self.load(user_id).await?;

        if let Some(email) = update.email {
            let email = email.trim().to_lowercase();
            if !email.eq_ignore_ascii_case(&user.email) {
                if self.user_repo.email_exists(&email).await? {
                    return Err(UserError::EmailTaken);
                }
                user.email = email;
            }
        }
        if let Some(first_name) = update.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = update.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio).filter(|b| !b.trim().is_empty());
        }
        if let Some(path) = update.profile_picture_path {
            user.profile_picture_path = Some(path).filter(|p| !p.trim().is_empty());
        }

        let updated = self.user_repo.update_profile(&user).await?;
        Ok(UserDto::from(updated))
    }

    async fn set_profile_picture(
        &self,
        user_id: Uuid,
        path: String,
    ) -> Result<(UserDto, Option<String>), UserError> {
        let mut user = self.load(user_id).await?;
        let previous = user.profile_picture_path.replace(path);

        let updated = self.user_repo.update_profile(&user).await?;
        Ok((UserDto::from(updated), previous))
    }

    async fn list_users(
        &self,
        role: Option<Role>,
        page: PageRequest,
    ) -> Result<PagedResult<UserDto>, UserError> {
        let (users, total) = self.user_repo.list(role, page).await?;
        Ok(PagedResult::new(users, total, page).map(UserDto::from))
    }

    async fn get_user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkillDto>, UserError> {
        let skills = self.skill_repo.find_user_skills(user_id).await?;
        Ok(skills.into_iter().map(UserSkillDto::from).collect())
    }

    async fn add_user_skills(
        &self,
        user_id: Uuid,
        skill_ids: &[i64],
    ) -> Result<Vec<UserSkillDto>, UserError> {
        self.load(user_id).await?;

        let known: Vec<i64> = self
            .skill_repo
            .find_by_ids(skill_ids)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        if !known.is_empty() {
            let added = self.skill_repo.add_user_skills(user_id, &known).await?;
            info!(%user_id, added, "User skills added");
        }

        self.get_user_skills(user_id).await
    }

    async fn remove_user_skill(&self, user_id: Uuid, skill_id: i64) -> Result<(), UserError> {
        if !self.skill_repo.remove_user_skill(user_id, skill_id).await? {
            return Err(UserError::SkillNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_roles(&self, user_id: Uuid, roles: Vec<Role>) -> Result<UserDto, UserError> {
        self.load(user_id).await?;

        let mut roles = roles;
        roles.sort();
        roles.dedup();
        self.user_repo.set_roles(user_id, &roles).await?;
        // Access tokens carry roles, so the old set lives on until they expire
        self.session_repo.revoke_all_for_user(user_id).await?;

        info!(%user_id, ?roles, "User roles replaced");
        Ok(UserDto::from(self.load(user_id).await?))
    }

    #[instrument(skip(self))]
    async fn lock(&self, user_id: Uuid, until: Option<DateTime<Utc>>) -> Result<UserDto, UserError> {
        let until = until.unwrap_or_else(|| Utc::now() + Duration::days(365 * INDEFINITE_LOCK_YEARS));

        if !self.user_repo.set_lockout(user_id, Some(until)).await? {
            return Err(UserError::NotFound);
        }
        self.session_repo.revoke_all_for_user(user_id).await?;

        info!(%user_id, %until, "User locked");
        Ok(UserDto::from(self.load(user_id).await?))
    }

    async fn unlock(&self, user_id: Uuid) -> Result<UserDto, UserError> {
        if !self.user_repo.set_lockout(user_id, None).await? {
            return Err(UserError::NotFound);
        }
        info!(%user_id, "User unlocked");
        Ok(UserDto::from(self.load(user_id).await?))
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<(), UserError> {
        if admin_id == user_id {
            return Err(UserError::CannotDeleteSelf);
        }
        if !self.user_repo.soft_delete(user_id).await? {
            return Err(UserError::NotFound);
        }
        self.session_repo.revoke_all_for_user(user_id).await?;

        info!(%user_id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AuditInfo, MockSessionRepository, MockSkillRepository, MockUserRepository, Skill, User,
    };
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn user(id: Uuid) -> User {
        User {
            id,
            username: "lina".into(),
            email: "lina@example.com".into(),
            password_hash: "hash".into(),
            first_name: "Lina".into(),
            last_name: "Mostafa".into(),
            bio: None,
            profile_picture_path: Some("uploads/profiles/old.png".into()),
            created_at: Utc::now(),
            last_login_at: None,
            lockout_end: None,
            roles: vec![Role::Student],
        }
    }

    fn skill(id: i64) -> Skill {
        Skill {
            id,
            name: format!("Skill {}", id),
            description: None,
            audit: AuditInfo::new(None),
        }
    }

    type Service = UserServiceImpl<MockUserRepository, MockSkillRepository, MockSessionRepository>;

    fn service(
        users: MockUserRepository,
        skills: MockSkillRepository,
        sessions: MockSessionRepository,
    ) -> Service {
        UserServiceImpl::new(Arc::new(users), Arc::new(skills), Arc::new(sessions))
    }

    #[tokio::test]
    async fn test_update_profile_rejects_taken_email() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));
        users
            .expect_email_exists()
            .withf(|email| email == "taken@example.com")
            .returning(|_| Ok(true));
        users.expect_update_profile().never();

        let update = UpdateProfileRequest {
            email: Some("Taken@Example.com".into()),
            ..Default::default()
        };
        let result = service(users, MockSkillRepository::new(), MockSessionRepository::new())
            .update_profile(id, update)
            .await;
        assert!(matches!(result, Err(UserError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_update_profile_same_email_skips_uniqueness_check() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));
        users.expect_email_exists().never();
        users
            .expect_update_profile()
            .withf(|u| u.first_name == "Leena" && u.bio.is_none())
            .returning(|u| Ok(u.clone()));

        let update = UpdateProfileRequest {
            email: Some("LINA@example.com".into()),
            first_name: Some(" Leena ".into()),
            bio: Some("   ".into()),
            ..Default::default()
        };
        let dto = service(users, MockSkillRepository::new(), MockSessionRepository::new())
            .update_profile(id, update)
            .await
            .unwrap();
        assert_eq!(dto.first_name, "Leena");
    }

    #[tokio::test]
    async fn test_set_profile_picture_returns_previous_path() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));
        users.expect_update_profile().returning(|u| Ok(u.clone()));

        let (dto, previous) = service(users, MockSkillRepository::new(), MockSessionRepository::new())
            .set_profile_picture(id, "uploads/profiles/new.png".into())
            .await
            .unwrap();
        assert_eq!(dto.profile_picture_path.as_deref(), Some("uploads/profiles/new.png"));
        assert_eq!(previous.as_deref(), Some("uploads/profiles/old.png"));
    }

    #[tokio::test]
    async fn test_add_user_skills_ignores_unknown_ids() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));

        let mut skills = MockSkillRepository::new();
        skills
            .expect_find_by_ids()
            .returning(|_| Ok(vec![skill(1)]));
        skills
            .expect_add_user_skills()
            .withf(|_, ids| ids == [1])
            .times(1)
            .returning(|_, _| Ok(1));
        skills.expect_find_user_skills().returning(|_| Ok(Vec::new()));

        service(users, skills, MockSessionRepository::new())
            .add_user_skills(id, &[1, 999])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_user_skills_all_unknown_writes_nothing() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));

        let mut skills = MockSkillRepository::new();
        skills.expect_find_by_ids().returning(|_| Ok(Vec::new()));
        skills.expect_add_user_skills().never();
        skills.expect_find_user_skills().returning(|_| Ok(Vec::new()));

        let result = service(users, skills, MockSessionRepository::new())
            .add_user_skills(id, &[999])
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_user_skill() {
        let mut skills = MockSkillRepository::new();
        skills.expect_remove_user_skill().returning(|_, _| Ok(false));

        let result = service(MockUserRepository::new(), skills, MockSessionRepository::new())
            .remove_user_skill(Uuid::now_v7(), 4)
            .await;
        assert!(matches!(result, Err(UserError::SkillNotFound)));
    }

    #[tokio::test]
    async fn test_delete_self_rejected() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users.expect_soft_delete().never();

        let result = service(users, MockSkillRepository::new(), MockSessionRepository::new())
            .delete_user(id, id)
            .await;
        assert!(matches!(result, Err(UserError::CannotDeleteSelf)));
    }

    #[tokio::test]
    async fn test_lock_without_end_is_indefinite_and_revokes_sessions() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_set_lockout()
            .withf(|_, until| until.is_some_and(|t| t > Utc::now() + Duration::days(365 * 50)))
            .returning(|_, _| Ok(true));
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_revoke_all_for_user()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(1));

        service(users, MockSkillRepository::new(), sessions)
            .lock(id, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_roles_revokes_sessions() {
        let id = Uuid::now_v7();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |id| Ok(Some(user(id))));
        users
            .expect_set_roles()
            .withf(|_, roles| roles.to_vec() == vec![Role::Admin, Role::Instructor])
            .times(1)
            .returning(|_, _| Ok(()));

        let mut sessions = MockSessionRepository::new();
        sessions
            .expect_revoke_all_for_user()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(2));

        service(users, MockSkillRepository::new(), sessions)
            .set_roles(id, vec![Role::Instructor, Role::Admin, Role::Instructor])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unlock_unknown_user() {
        let mut users = MockUserRepository::new();
        users.expect_set_lockout().returning(|_, _| Ok(false));

        let result = service(users, MockSkillRepository::new(), MockSessionRepository::new())
            .unlock(Uuid::now_v7())
            .await;
        assert!(matches!(result, Err(UserError::NotFound)));
    }
}
