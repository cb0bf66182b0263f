//! Lesson entity and repository trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::AuditInfo;
use crate::shared::error::AppError;

/// Kind of lesson content, stored as SMALLINT (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    Video,
    Article,
    Pdf,
    Quiz,
}

impl ContentType {
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Video),
            2 => Some(Self::Article),
            3 => Some(Self::Pdf),
            4 => Some(Self::Quiz),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Video => 1,
            Self::Article => 2,
            Self::Pdf => 3,
            Self::Quiz => 4,
        }
    }

    /// Accepts the name (any case) or the numeric code.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i16>() {
            return Self::from_i16(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "video" => Some(Self::Video),
            "article" => Some(Self::Article),
            "pdf" => Some(Self::Pdf),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Article => "Article",
            Self::Pdf => "Pdf",
            Self::Quiz => "Quiz",
        }
    }
}

/// Maps to the `lessons` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub content_path: Option<String>,
    pub external_url: Option<String>,
    pub duration_in_minutes: i32,
    pub order: i32,
    pub is_free: bool,
    pub audit: AuditInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonInput {
    pub title: String,
    pub description: Option<String>,
    pub content_type: ContentType,
    pub content_path: Option<String>,
    pub external_url: Option<String>,
    pub duration_in_minutes: i32,
    /// `None` appends after the last lesson of the section
    pub order: Option<i32>,
    pub is_free: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Lesson>, AppError>;

    /// Course that owns the lesson (through its section).
    async fn find_course_id(&self, lesson_id: i64) -> Result<Option<i64>, AppError>;

    /// Lessons of a section ordered by `order`.
    async fn find_by_section(&self, section_id: i64) -> Result<Vec<Lesson>, AppError>;

    /// Lessons of a course ordered by section order, then lesson order.
    async fn find_by_course(&self, course_id: i64) -> Result<Vec<Lesson>, AppError>;

    async fn count_by_section(&self, section_id: i64) -> Result<i64, AppError>;

    async fn count_by_course(&self, course_id: i64) -> Result<i64, AppError>;

    async fn create(
        &self,
        section_id: i64,
        input: &LessonInput,
        actor: Uuid,
    ) -> Result<Lesson, AppError>;

    async fn update(
        &self,
        id: i64,
        input: &LessonInput,
        actor: Uuid,
    ) -> Result<Option<Lesson>, AppError>;

    async fn set_content_path(&self, id: i64, path: &str, actor: Uuid) -> Result<bool, AppError>;

    async fn soft_delete(&self, id: i64, actor: Uuid) -> Result<bool, AppError>;
}
