//! Category entity and repository trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Course category.
///
/// Maps to the `categories` table; `name` is unique among non-deleted rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub audit: AuditInfo,
}

/// Category plus the number of non-deleted courses filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithCount {
    pub category: Category,
    pub course_count: i64,
}

/// Writable category fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError>;

    /// All categories with course counts, ordered by name.
    async fn find_all_with_counts(&self) -> Result<Vec<CategoryWithCount>, AppError>;

    async fn find_paged(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<CategoryWithCount>, i64), AppError>;

    /// Case-insensitive name check, optionally ignoring one id (the row being updated).
    async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    async fn create(&self, input: &CategoryInput, actor: Uuid) -> Result<Category, AppError>;

    async fn update(
        &self,
        id: i64,
        input: &CategoryInput,
        actor: Uuid,
    ) -> Result<Option<Category>, AppError>;

    /// True when non-deleted courses still reference the category.
    async fn has_courses(&self, id: i64) -> Result<bool, AppError>;

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}
