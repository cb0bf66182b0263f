//! Category Service
//!
//! Category CRUD. The public category list is cached and invalidated on writes.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::dto::response::{CategoryDto, CategoryWithCoursesDto, CourseSummaryDto};
use crate::domain::{
    CategoryInput, CategoryRepository, CourseOrder, CourseRepository, CourseScope,
};
use crate::infrastructure::cache::{keys, Cache};
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, PagedResult};

/// Category service trait
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn get(&self, id: i64) -> Result<CategoryDto, CategoryError>;

    /// All categories with course counts, ordered by name
    async fn get_all(&self) -> Result<Vec<CategoryDto>, CategoryError>;

    async fn get_paged(&self, page: PageRequest) -> Result<PagedResult<CategoryDto>, CategoryError>;

    /// Category with its published courses
    async fn get_with_courses(&self, id: i64) -> Result<CategoryWithCoursesDto, CategoryError>;

    async fn create(&self, actor: Uuid, input: CategoryInput) -> Result<CategoryDto, CategoryError>;

    async fn update(
        &self,
        actor: Uuid,
        id: i64,
        input: CategoryInput,
    ) -> Result<CategoryDto, CategoryError>;

    /// Store a new icon path, returning the updated category and the previous path
    async fn set_icon(
        &self,
        actor: Uuid,
        id: i64,
        path: String,
    ) -> Result<(CategoryDto, Option<String>), CategoryError>;

    async fn delete(&self, actor: Uuid, id: i64) -> Result<(), CategoryError>;
}

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    NotFound,

    #[error("Category name already exists")]
    NameTaken,

    #[error("Cannot delete category with existing courses")]
    HasCourses,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound => AppError::NotFound(err.to_string()),
            CategoryError::NameTaken => AppError::Conflict(err.to_string()),
            CategoryError::HasCourses => AppError::BadRequest(err.to_string()),
            CategoryError::Repository(e) => e,
        }
    }
}

/// CategoryService implementation
pub struct CategoryServiceImpl<R, C, K>
where
    R: CategoryRepository,
    C: CourseRepository,
    K: Cache,
{
    category_repo: Arc<R>,
    course_repo: Arc<C>,
    cache: Arc<K>,
    cache_ttl_seconds: u64,
}

impl<R, C, K> CategoryServiceImpl<R, C, K>
where
    R: CategoryRepository,
    C: CourseRepository,
    K: Cache,
{
    pub fn new(
        category_repo: Arc<R>,
        course_repo: Arc<C>,
        cache: Arc<K>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            category_repo,
            course_repo,
            cache,
            cache_ttl_seconds,
        }
    }

    /// Drop cached read models that include category data. Failures are logged only.
    async fn invalidate(&self) {
        for key in [keys::CATEGORY_LIST, keys::ADMIN_DASHBOARD] {
            if let Err(e) = self.cache.delete(key).await {
                warn!(error = %e, key, "Failed to invalidate cache entry");
            }
        }
    }

    async fn ensure_unique(&self, name: &str, exclude: Option<i64>) -> Result<(), CategoryError> {
        if self.category_repo.name_exists(name, exclude).await? {
            return Err(CategoryError::NameTaken);
        }
        Ok(())
    }
}

#[async_trait]
impl<R, C, K> CategoryService for CategoryServiceImpl<R, C, K>
where
    R: CategoryRepository + 'static,
    C: CourseRepository + 'static,
    K: Cache + 'static,
{
    async fn get(&self, id: i64) -> Result<CategoryDto, CategoryError> {
        self.category_repo
            .find_by_id(id)
            .await?
            .map(CategoryDto::from)
            .ok_or(CategoryError::NotFound)
    }

    async fn get_all(&self) -> Result<Vec<CategoryDto>, CategoryError> {
        match self.cache.get::<Vec<CategoryDto>>(keys::CATEGORY_LIST).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Category cache read failed"),
        }

        let categories: Vec<CategoryDto> = self
            .category_repo
            .find_all_with_counts()
            .await?
            .into_iter()
            .map(CategoryDto::from)
            .collect();

        if let Err(e) = self
            .cache
            .set_ex(keys::CATEGORY_LIST, &categories, self.cache_ttl_seconds)
            .await
        {
            warn!(error = %e, "Category cache write failed");
        }

        Ok(categories)
    }

    async fn get_paged(&self, page: PageRequest) -> Result<PagedResult<CategoryDto>, CategoryError> {
        let (items, total) = self.category_repo.find_paged(page).await?;
        Ok(PagedResult::new(items, total, page).map(CategoryDto::from))
    }

    async fn get_with_courses(&self, id: i64) -> Result<CategoryWithCoursesDto, CategoryError> {
        let category = self.get(id).await?;
        let courses = self
            .course_repo
            .list(CourseScope::Category(id), CourseOrder::Newest, None)
            .await?;

        Ok(CategoryWithCoursesDto {
            category,
            courses: courses.into_iter().map(CourseSummaryDto::from).collect(),
        })
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create(&self, actor: Uuid, input: CategoryInput) -> Result<CategoryDto, CategoryError> {
        self.ensure_unique(&input.name, None).await?;

        let category = self.category_repo.create(&input, actor).await?;
        self.invalidate().await;

        info!(category_id = category.id, "Category created");
        Ok(CategoryDto::from(category))
    }

    #[instrument(skip(self, input))]
    async fn update(
        &self,
        actor: Uuid,
        id: i64,
        input: CategoryInput,
    ) -> Result<CategoryDto, CategoryError> {
        self.ensure_unique(&input.name, Some(id)).await?;

        let category = self
            .category_repo
            .update(id, &input, actor)
            .await?
            .ok_or(CategoryError::NotFound)?;
        self.invalidate().await;

        Ok(CategoryDto::from(category))
    }

    async fn set_icon(
        &self,
        actor: Uuid,
        id: i64,
        path: String,
    ) -> Result<(CategoryDto, Option<String>), CategoryError> {
        let current = self
            .category_repo
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let input = CategoryInput {
            name: current.name,
            description: current.description,
            icon_path: Some(path),
        };
        let category = self
            .category_repo
            .update(id, &input, actor)
            .await?
            .ok_or(CategoryError::NotFound)?;
        self.invalidate().await;

        Ok((CategoryDto::from(category), current.icon_path))
    }

    #[instrument(skip(self))]
    async fn delete(&self, actor: Uuid, id: i64) -> Result<(), CategoryError> {
        if self.category_repo.find_by_id(id).await?.is_none() {
            return Err(CategoryError::NotFound);
        }
        if self.category_repo.has_courses(id).await? {
            return Err(CategoryError::HasCourses);
        }

        self.category_repo.soft_delete(id, actor).await?;
        self.invalidate().await;

        info!(category_id = id, "Category deleted");
        Ok(())
    }
}
