//! Skill Service

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::dto::response::SkillDto;
use crate::domain::{SkillInput, SkillRepository};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, PagedResult};

/// Skill service trait
#[async_trait]
pub trait SkillService: Send + Sync {
    async fn get(&self, id: i64) -> Result<SkillDto, SkillError>;

    async fn get_all(&self) -> Result<Vec<SkillDto>, SkillError>;

    async fn get_paged(&self, page: PageRequest) -> Result<PagedResult<SkillDto>, SkillError>;

    /// Skills ordered by the number of courses teaching them
    async fn get_popular(&self, count: i64) -> Result<Vec<SkillDto>, SkillError>;

    async fn get_course_skills(&self, course_id: i64) -> Result<Vec<SkillDto>, SkillError>;

    async fn create(&self, actor: Uuid, input: SkillInput) -> Result<SkillDto, SkillError>;

    async fn update(&self, actor: Uuid, id: i64, input: SkillInput) -> Result<SkillDto, SkillError>;

    async fn delete(&self, actor: Uuid, id: i64) -> Result<(), SkillError>;
}

/// Skill service errors
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("Skill not found")]
    NotFound,

    #[error("Skill name already exists")]
    NameTaken,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<SkillError> for AppError {
    fn from(err: SkillError) -> Self {
        match err {
            SkillError::NotFound => AppError::NotFound(err.to_string()),
            SkillError::NameTaken => AppError::Conflict(err.to_string()),
            SkillError::Repository(e) => e,
        }
    }
}

/// SkillService implementation
pub struct SkillServiceImpl<R: SkillRepository> {
    skill_repo: Arc<R>,
}

impl<R: SkillRepository> SkillServiceImpl<R> {
    pub fn new(skill_repo: Arc<R>) -> Self {
        Self { skill_repo }
    }
}

#[async_trait]
impl<R: SkillRepository + 'static> SkillService for SkillServiceImpl<R> {
    async fn get(&self, id: i64) -> Result<SkillDto, SkillError> {
        self.skill_repo
            .find_by_id(id)
            .await?
            .map(SkillDto::from)
            .ok_or(SkillError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<SkillDto>, SkillError> {
        let skills = self.skill_repo.find_all().await?;
        Ok(skills.into_iter().map(SkillDto::from).collect())
    }

    async fn get_paged(&self, page: PageRequest) -> Result<PagedResult<SkillDto>, SkillError> {
        let (items, total) = self.skill_repo.find_paged(page).await?;
        Ok(PagedResult::new(items, total, page).map(SkillDto::from))
    }

    async fn get_popular(&self, count: i64) -> Result<Vec<SkillDto>, SkillError> {
        let skills = self.skill_repo.find_popular(count).await?;
        Ok(skills.into_iter().map(SkillDto::from).collect())
    }

    async fn get_course_skills(&self, course_id: i64) -> Result<Vec<SkillDto>, SkillError> {
        let skills = self.skill_repo.find_by_course(course_id).await?;
        Ok(skills.into_iter().map(SkillDto::from).collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create(&self, actor: Uuid, input: SkillInput) -> Result<SkillDto, SkillError> {
        if self.skill_repo.name_exists(&input.name, None).await? {
            return Err(SkillError::NameTaken);
        }

        let skill = self.skill_repo.create(&input, actor).await?;
        info!(skill_id = skill.id, "Skill created");
        Ok(SkillDto::from(skill))
    }

    async fn update(&self, actor: Uuid, id: i64, input: SkillInput) -> Result<SkillDto, SkillError> {
        if self.skill_repo.name_exists(&input.name, Some(id)).await? {
            return Err(SkillError::NameTaken);
        }

        self.skill_repo
            .update(id, &input, actor)
            .await?
            .map(SkillDto::from)
            .ok_or(SkillError::NotFound)
    }

    async fn delete(&self, actor: Uuid, id: i64) -> Result<(), SkillError> {
        if !self.skill_repo.soft_delete(id, actor).await? {
            return Err(SkillError::NotFound);
        }
        info!(skill_id = id, "Skill deleted");
        Ok(())
    }
}
