//! Course entity, catalogue query types and repository trait.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Course difficulty, stored as SMALLINT (1..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Beginner),
            2 => Some(Self::Intermediate),
            3 => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }

    /// Accepts the name (any case) or the numeric code.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i16>() {
            return Self::from_i16(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl std::fmt::Display for CourseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps to the `courses` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub thumbnail_path: Option<String>,
    pub level: CourseLevel,
    pub is_published: bool,
    /// NUMERIC(18,2); `None` means free
    pub price: Option<Decimal>,
    pub duration_in_hours: i32,
    pub category_id: i64,
    pub instructor_id: Uuid,
    pub audit: AuditInfo,
}

impl Course {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.instructor_id == user_id
    }
}

/// Course joined with the names and aggregates list views need.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSummary {
    pub course: Course,
    pub category_name: String,
    pub instructor_name: String,
    pub enrollment_count: i64,
    pub review_count: i64,
    pub average_rating: f64,
    pub skill_names: Vec<String>,
}

/// Writable course fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseInput {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub thumbnail_path: Option<String>,
    pub level: CourseLevel,
    pub price: Option<Decimal>,
    pub duration_in_hours: i32,
    pub category_id: i64,
}

/// Sort key for the public catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseSort {
    #[default]
    Newest,
    Title,
    Price,
    Rating,
    Popular,
}

impl CourseSort {
    /// Unknown keys fall back to newest first.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "price" => Self::Price,
            "rating" => Self::Rating,
            "popular" | "enrollments" => Self::Popular,
            _ => Self::Newest,
        }
    }
}

/// Filter for the paged catalogue search. Only published courses are searched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CourseQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub level: Option<CourseLevel>,
    pub skill_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: CourseSort,
    pub descending: bool,
    pub page: PageRequest,
}

/// Which courses a list query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseScope {
    /// Every non-deleted course (admin views)
    All,
    Published,
    /// Published courses in one category
    Category(i64),
    /// All courses of one instructor, published or not
    Instructor(Uuid),
    /// Published courses the user is not enrolled in
    NotEnrolledBy(Uuid),
}

/// Ordering for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseOrder {
    Newest,
    /// Average rating, restricted to courses with at least one review
    TopRated,
    MostEnrolled,
    Title,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Course>, AppError>;

    async fn find_summary(&self, id: i64) -> Result<Option<CourseSummary>, AppError>;

    async fn search(&self, query: &CourseQuery) -> Result<(Vec<CourseSummary>, i64), AppError>;

    async fn list(
        &self,
        scope: CourseScope,
        order: CourseOrder,
        limit: Option<i64>,
    ) -> Result<Vec<CourseSummary>, AppError>;

    /// Insert the course (unpublished) and link the given skills.
    async fn create(
        &self,
        input: &CourseInput,
        instructor_id: Uuid,
        skill_ids: &[i64],
    ) -> Result<Course, AppError>;

    /// Update fields and replace the skill set.
    async fn update(
        &self,
        id: i64,
        input: &CourseInput,
        skill_ids: &[i64],
        actor: Uuid,
    ) -> Result<Option<Course>, AppError>;

    async fn set_published(&self, id: i64, published: bool, actor: Uuid) -> Result<bool, AppError>;

    async fn set_thumbnail(&self, id: i64, path: &str, actor: Uuid) -> Result<bool, AppError>;

    async fn has_enrollments(&self, id: i64) -> Result<bool, AppError>;

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError>;

    /// Count non-deleted courses, optionally by published flag.
    async fn count(&self, published: Option<bool>) -> Result<i64, AppError>;

    async fn count_by_instructor(
        &self,
        instructor_id: Uuid,
        published: Option<bool>,
    ) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Beginner" => Some(CourseLevel::Beginner))]
    #[test_case("advanced" => Some(CourseLevel::Advanced))]
    #[test_case("2" => Some(CourseLevel::Intermediate))]
    #[test_case("4" => None)]
    #[test_case("expert" => None)]
    fn test_level_parse(input: &str) -> Option<CourseLevel> {
        CourseLevel::parse(input)
    }

    #[test]
    fn test_level_codes_roundtrip() {
        for level in [CourseLevel::Beginner, CourseLevel::Intermediate, CourseLevel::Advanced] {
            assert_eq!(CourseLevel::from_i16(level.as_i16()), Some(level));
        }
    }

    #[test_case("title" => CourseSort::Title)]
    #[test_case("PRICE" => CourseSort::Price)]
    #[test_case("rating" => CourseSort::Rating)]
    #[test_case("popular" => CourseSort::Popular)]
    #[test_case("created" => CourseSort::Newest)]
    fn test_sort_parse(input: &str) -> CourseSort {
        CourseSort::parse(input)
    }
}
