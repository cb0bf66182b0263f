//! Skill entity, user-skill link and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Proficiency assigned when a user adds a skill to their profile.
pub const DEFAULT_PROFICIENCY_LEVEL: i32 = 1;

/// Maps to the `skills` table; `name` is unique among non-deleted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub audit: AuditInfo,
}

/// Skill with the number of non-deleted courses teaching it.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillWithCount {
    pub skill: Skill,
    pub course_count: i64,
}

/// Row of `user_skills` joined with the skill name.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSkill {
    pub user_id: Uuid,
    pub skill_id: i64,
    pub skill_name: String,
    pub proficiency_level: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillInput {
    pub name: String,
    pub description: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Skill>, AppError>;

    /// All skills ordered by name.
    async fn find_all(&self) -> Result<Vec<Skill>, AppError>;

    async fn find_paged(&self, page: PageRequest) -> Result<(Vec<Skill>, i64), AppError>;

    /// Most used skills by course count.
    async fn find_popular(&self, limit: i64) -> Result<Vec<SkillWithCount>, AppError>;

    async fn find_by_course(&self, course_id: i64) -> Result<Vec<Skill>, AppError>;

    /// Existing, non-deleted skills among `ids`.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Skill>, AppError>;

    async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn create(&self, input: &SkillInput, actor: Uuid) -> Result<Skill, AppError>;

    async fn update(
        &self,
        id: i64,
        input: &SkillInput,
        actor: Uuid,
    ) -> Result<Option<Skill>, AppError>;

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn find_user_skills(&self, user_id: Uuid) -> Result<Vec<UserSkill>, AppError>;

    /// Link skills to a user, skipping links that already exist. Returns rows inserted.
    async fn add_user_skills(&self, user_id: Uuid, skill_ids: &[i64]) -> Result<u64, AppError>;

    async fn remove_user_skill(&self, user_id: Uuid, skill_id: i64) -> Result<bool, AppError>;
}
