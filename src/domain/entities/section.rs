//! Section entity and repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::shared::error::AppError;

/// Ordered block of lessons inside a course. Maps to the `sections` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
    pub audit: AuditInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInput {
    pub title: String,
    pub description: Option<String>,
    /// `None` appends after the last section
    pub order: Option<i32>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Section>, AppError>;

    /// Sections of a course ordered by `order`.
    async fn find_by_course(&self, course_id: i64) -> Result<Vec<Section>, AppError>;

    async fn create(
        &self,
        course_id: i64,
        input: &SectionInput,
        actor: Uuid,
    ) -> Result<Section, AppError>;

    async fn update(
        &self,
        id: i64,
        input: &SectionInput,
        actor: Uuid,
    ) -> Result<Option<Section>, AppError>;

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError>;

    async fn count_by_course(&self, course_id: i64) -> Result<i64, AppError>;
}
