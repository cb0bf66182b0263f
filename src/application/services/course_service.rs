//! Course Service
//!
//! Catalogue queries and instructor-owned course management, including
//! sections, lessons and the publish gate.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::dto::response::{
    CourseDetailsDto, CourseDto, CourseSummaryDto, LessonDto, SectionDto,
};
use crate::domain::services::{check_publishable, PublishBlocker};
use crate::domain::{
    CategoryRepository, Course, CourseInput, CourseOrder, CourseQuery, CourseRepository,
    CourseScope, CourseSummary, Lesson, LessonInput, LessonRepository, Section, SectionInput,
    SectionRepository, SkillRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::PagedResult;

/// Course service trait
#[async_trait]
pub trait CourseService: Send + Sync {
    async fn get(&self, id: i64) -> Result<CourseSummaryDto, CourseError>;

    /// Published course with ordered sections and lessons
    async fn get_details(&self, id: i64) -> Result<CourseDetailsDto, CourseError>;

    /// Course details for its instructor, published or not
    async fn get_owned_details(
        &self,
        instructor_id: Uuid,
        id: i64,
    ) -> Result<CourseDetailsDto, CourseError>;

    async fn search_paged(
        &self,
        query: CourseQuery,
    ) -> Result<PagedResult<CourseSummaryDto>, CourseError>;

    async fn get_published(&self) -> Result<Vec<CourseSummaryDto>, CourseError>;

    /// Every non-deleted course (admin view)
    async fn get_all(&self) -> Result<Vec<CourseSummaryDto>, CourseError>;

    async fn get_by_instructor(&self, instructor_id: Uuid)
        -> Result<Vec<CourseSummaryDto>, CourseError>;

    async fn get_by_category(&self, category_id: i64) -> Result<Vec<CourseSummaryDto>, CourseError>;

    async fn get_top_rated(&self, count: i64) -> Result<Vec<CourseSummaryDto>, CourseError>;

    async fn get_most_enrolled(&self, count: i64) -> Result<Vec<CourseSummaryDto>, CourseError>;

    async fn get_recent(&self, count: i64) -> Result<Vec<CourseSummaryDto>, CourseError>;

    async fn create(
        &self,
        instructor_id: Uuid,
        input: CourseInput,
        skill_ids: Vec<i64>,
    ) -> Result<CourseDto, CourseError>;

    async fn update(
        &self,
        instructor_id: Uuid,
        id: i64,
        input: CourseInput,
        skill_ids: Vec<i64>,
    ) -> Result<CourseDto, CourseError>;

    async fn delete(&self, instructor_id: Uuid, id: i64) -> Result<(), CourseError>;

    /// Delete any course, still refusing courses with enrollments
    async fn admin_delete(&self, admin_id: Uuid, id: i64) -> Result<(), CourseError>;

    async fn publish(&self, instructor_id: Uuid, id: i64) -> Result<(), CourseError>;

    async fn unpublish(&self, instructor_id: Uuid, id: i64) -> Result<(), CourseError>;

    /// Store a new thumbnail path, returning the updated course and the previous path
    async fn set_thumbnail(
        &self,
        instructor_id: Uuid,
        id: i64,
        path: String,
    ) -> Result<(CourseDto, Option<String>), CourseError>;

    async fn add_section(
        &self,
        instructor_id: Uuid,
        course_id: i64,
        input: SectionInput,
    ) -> Result<SectionDto, CourseError>;

    async fn update_section(
        &self,
        instructor_id: Uuid,
        section_id: i64,
        input: SectionInput,
    ) -> Result<SectionDto, CourseError>;

    async fn delete_section(&self, instructor_id: Uuid, section_id: i64) -> Result<(), CourseError>;

    async fn add_lesson(
        &self,
        instructor_id: Uuid,
        section_id: i64,
        input: LessonInput,
    ) -> Result<LessonDto, CourseError>;

    async fn update_lesson(
        &self,
        instructor_id: Uuid,
        lesson_id: i64,
        input: LessonInput,
    ) -> Result<LessonDto, CourseError>;

    async fn delete_lesson(&self, instructor_id: Uuid, lesson_id: i64) -> Result<(), CourseError>;

    /// Store uploaded lesson media, returning the updated lesson and the previous path
    async fn set_lesson_content(
        &self,
        instructor_id: Uuid,
        lesson_id: i64,
        path: String,
    ) -> Result<(LessonDto, Option<String>), CourseError>;
}

/// Course service errors
#[derive(Debug, thiserror::Error)]
pub enum CourseError {
    #[error("Course not found")]
    NotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Section not found")]
    SectionNotFound,

    #[error("Lesson not found")]
    LessonNotFound,

    #[error("You are not authorized to {0} this course")]
    NotOwner(&'static str),

    #[error("Cannot delete course with existing enrollments")]
    HasEnrollments,

    #[error("Cannot delete section with existing lessons. Please delete lessons first.")]
    SectionHasLessons,

    #[error("{}", .0.message())]
    NotPublishable(PublishBlocker),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<CourseError> for AppError {
    fn from(err: CourseError) -> Self {
        match err {
            CourseError::NotFound
            | CourseError::CategoryNotFound
            | CourseError::SectionNotFound
            | CourseError::LessonNotFound => AppError::NotFound(err.to_string()),
            CourseError::NotOwner(_) => AppError::Forbidden(err.to_string()),
            CourseError::HasEnrollments
            | CourseError::SectionHasLessons
            | CourseError::NotPublishable(_) => AppError::BadRequest(err.to_string()),
            CourseError::Repository(e) => e,
        }
    }
}

/// CourseService implementation
pub struct CourseServiceImpl<C, G, K, S, L>
where
    C: CourseRepository,
    G: CategoryRepository,
    K: SkillRepository,
    S: SectionRepository,
    L: LessonRepository,
{
    course_repo: Arc<C>,
    category_repo: Arc<G>,
    skill_repo: Arc<K>,
    section_repo: Arc<S>,
    lesson_repo: Arc<L>,
}

impl<C, G, K, S, L> CourseServiceImpl<C, G, K, S, L>
where
    C: CourseRepository,
    G: CategoryRepository,
    K: SkillRepository,
    S: SectionRepository,
    L: LessonRepository,
{
    pub fn new(
        course_repo: Arc<C>,
        category_repo: Arc<G>,
        skill_repo: Arc<K>,
        section_repo: Arc<S>,
        lesson_repo: Arc<L>,
    ) -> Self {
        Self {
            course_repo,
            category_repo,
            skill_repo,
            section_repo,
            lesson_repo,
        }
    }

    /// Load a course and check that `instructor_id` owns it.
    async fn owned_course(
        &self,
        instructor_id: Uuid,
        course_id: i64,
        action: &'static str,
    ) -> Result<Course, CourseError> {
        let course = self
            .course_repo
            .find_by_id(course_id)
            .await?
            .ok_or(CourseError::NotFound)?;

        if !course.is_owned_by(instructor_id) {
            return Err(CourseError::NotOwner(action));
        }
        Ok(course)
    }

    async fn owned_section(
        &self,
        instructor_id: Uuid,
        section_id: i64,
    ) -> Result<Section, CourseError> {
        let section = self
            .section_repo
            .find_by_id(section_id)
            .await?
            .ok_or(CourseError::SectionNotFound)?;
        self.owned_course(instructor_id, section.course_id, "modify")
            .await?;
        Ok(section)
    }

    async fn owned_lesson(&self, instructor_id: Uuid, lesson_id: i64) -> Result<Lesson, CourseError> {
        let lesson = self
            .lesson_repo
            .find_by_id(lesson_id)
            .await?
            .ok_or(CourseError::LessonNotFound)?;
        let course_id = self
            .lesson_repo
            .find_course_id(lesson_id)
            .await?
            .ok_or(CourseError::LessonNotFound)?;
        self.owned_course(instructor_id, course_id, "modify").await?;
        Ok(lesson)
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), CourseError> {
        if self.category_repo.find_by_id(category_id).await?.is_none() {
            return Err(CourseError::CategoryNotFound);
        }
        Ok(())
    }

    /// Keep only skill ids that exist.
    async fn existing_skills(&self, skill_ids: &[i64]) -> Result<Vec<i64>, CourseError> {
        if skill_ids.is_empty() {
            return Ok(Vec::new());
        }
        let skills = self.skill_repo.find_by_ids(skill_ids).await?;
        Ok(skills.into_iter().map(|s| s.id).collect())
    }

    async fn details(&self, summary: CourseSummary) -> Result<CourseDetailsDto, CourseError> {
        let course_id = summary.course.id;
        let sections = self.section_repo.find_by_course(course_id).await?;
        let lessons = self.lesson_repo.find_by_course(course_id).await?;
        Ok(assemble_details(summary, sections, lessons))
    }

    async fn list(
        &self,
        scope: CourseScope,
        order: CourseOrder,
        limit: Option<i64>,
    ) -> Result<Vec<CourseSummaryDto>, CourseError> {
        let courses = self.course_repo.list(scope, order, limit).await?;
        Ok(courses.into_iter().map(CourseSummaryDto::from).collect())
    }

    async fn remove_course(&self, actor: Uuid, course_id: i64) -> Result<(), CourseError> {
        if self.course_repo.has_enrollments(course_id).await? {
            return Err(CourseError::HasEnrollments);
        }
        if !self.course_repo.soft_delete(course_id, actor).await? {
            return Err(CourseError::NotFound);
        }
        info!(course_id, %actor, "Course deleted");
        Ok(())
    }
}

/// Group lessons under their sections, both already ordered by `order`.
fn assemble_details(
    summary: CourseSummary,
    sections: Vec<Section>,
    lessons: Vec<Lesson>,
) -> CourseDetailsDto {
    let total_lessons = lessons.len();
    let total_duration_minutes = lessons
        .iter()
        .map(|l| i64::from(l.duration_in_minutes))
        .sum();

    let mut by_section: HashMap<i64, Vec<LessonDto>> = HashMap::new();
    for lesson in lessons {
        by_section
            .entry(lesson.section_id)
            .or_default()
            .push(LessonDto::from(lesson));
    }

    let sections = sections
        .into_iter()
        .map(|section| {
            let lessons = by_section.remove(&section.id).unwrap_or_default();
            SectionDto::new(section, lessons)
        })
        .collect();

    let description = summary.course.description.clone();
    CourseDetailsDto {
        summary: CourseSummaryDto::from(summary),
        description,
        sections,
        total_lessons,
        total_duration_minutes,
    }
}

#[async_trait]
impl<C, G, K, S, L> CourseService for CourseServiceImpl<C, G, K, S, L>
where
    C: CourseRepository + 'static,
    G: CategoryRepository + 'static,
    K: SkillRepository + 'static,
    S: SectionRepository + 'static,
    L: LessonRepository + 'static,
{
    async fn get(&self, id: i64) -> Result<CourseSummaryDto, CourseError> {
        self.course_repo
            .find_summary(id)
            .await?
            .map(CourseSummaryDto::from)
            .ok_or(CourseError::NotFound)
    }

    async fn get_details(&self, id: i64) -> Result<CourseDetailsDto, CourseError> {
        let summary = self
            .course_repo
            .find_summary(id)
            .await?
            .filter(|s| s.course.is_published)
            .ok_or(CourseError::NotFound)?;
        self.details(summary).await
    }

    async fn get_owned_details(
        &self,
        instructor_id: Uuid,
        id: i64,
    ) -> Result<CourseDetailsDto, CourseError> {
        self.owned_course(instructor_id, id, "view").await?;
        let summary = self
            .course_repo
            .find_summary(id)
            .await?
            .ok_or(CourseError::NotFound)?;
        self.details(summary).await
    }

    async fn search_paged(
        &self,
        query: CourseQuery,
    ) -> Result<PagedResult<CourseSummaryDto>, CourseError> {
        let (items, total) = self.course_repo.search(&query).await?;
        Ok(PagedResult::new(items, total, query.page).map(CourseSummaryDto::from))
    }

    async fn get_published(&self) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.list(CourseScope::Published, CourseOrder::Newest, None).await
    }

    async fn get_all(&self) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.list(CourseScope::All, CourseOrder::Newest, None).await
    }

    async fn get_by_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.list(CourseScope::Instructor(instructor_id), CourseOrder::Newest, None)
            .await
    }

    async fn get_by_category(&self, category_id: i64) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.ensure_category(category_id).await?;
        self.list(CourseScope::Category(category_id), CourseOrder::Newest, None)
            .await
    }

    async fn get_top_rated(&self, count: i64) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.list(CourseScope::Published, CourseOrder::TopRated, Some(count))
            .await
    }

    async fn get_most_enrolled(&self, count: i64) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.list(CourseScope::Published, CourseOrder::MostEnrolled, Some(count))
            .await
    }

    async fn get_recent(&self, count: i64) -> Result<Vec<CourseSummaryDto>, CourseError> {
        self.list(CourseScope::Published, CourseOrder::Newest, Some(count))
            .await
    }

    #[instrument(skip(self, input, skill_ids), fields(title = %input.title))]
    async fn create(
        &self,
        instructor_id: Uuid,
        input: CourseInput,
        skill_ids: Vec<i64>,
    ) -> Result<CourseDto, CourseError> {
        self.ensure_category(input.category_id).await?;
        let skill_ids = self.existing_skills(&skill_ids).await?;

        let course = self
            .course_repo
            .create(&input, instructor_id, &skill_ids)
            .await?;

        info!(course_id = course.id, %instructor_id, "Course created");
        Ok(CourseDto::from(course))
    }

    #[instrument(skip(self, input, skill_ids))]
    async fn update(
        &self,
        instructor_id: Uuid,
        id: i64,
        input: CourseInput,
        skill_ids: Vec<i64>,
    ) -> Result<CourseDto, CourseError> {
        self.owned_course(instructor_id, id, "update").await?;
        self.ensure_category(input.category_id).await?;
        let skill_ids = self.existing_skills(&skill_ids).await?;

        self.course_repo
            .update(id, &input, &skill_ids, instructor_id)
            .await?
            .map(CourseDto::from)
            .ok_or(CourseError::NotFound)
    }

    #[instrument(skip(self))]
    async fn delete(&self, instructor_id: Uuid, id: i64) -> Result<(), CourseError> {
        self.owned_course(instructor_id, id, "delete").await?;
        self.remove_course(instructor_id, id).await
    }

    #[instrument(skip(self))]
    async fn admin_delete(&self, admin_id: Uuid, id: i64) -> Result<(), CourseError> {
        if self.course_repo.find_by_id(id).await?.is_none() {
            return Err(CourseError::NotFound);
        }
        self.remove_course(admin_id, id).await
    }

    #[instrument(skip(self))]
    async fn publish(&self, instructor_id: Uuid, id: i64) -> Result<(), CourseError> {
        let course = self.owned_course(instructor_id, id, "publish").await?;

        let sections = self.section_repo.count_by_course(id).await?;
        let lessons = self.lesson_repo.count_by_course(id).await?;
        check_publishable(sections, lessons).map_err(CourseError::NotPublishable)?;

        if !course.is_published {
            self.course_repo.set_published(id, true, instructor_id).await?;
            metrics::record_course_published();
            info!(course_id = id, "Course published");
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn unpublish(&self, instructor_id: Uuid, id: i64) -> Result<(), CourseError> {
        self.owned_course(instructor_id, id, "unpublish").await?;
        self.course_repo.set_published(id, false, instructor_id).await?;
        info!(course_id = id, "Course unpublished");
        Ok(())
    }

    async fn set_thumbnail(
        &self,
        instructor_id: Uuid,
        id: i64,
        path: String,
    ) -> Result<(CourseDto, Option<String>), CourseError> {
        let course = self.owned_course(instructor_id, id, "update").await?;
        self.course_repo.set_thumbnail(id, &path, instructor_id).await?;

        let previous = course.thumbnail_path.clone();
        let updated = Course {
            thumbnail_path: Some(path),
            ..course
        };
        Ok((CourseDto::from(updated), previous))
    }

    async fn add_section(
        &self,
        instructor_id: Uuid,
        course_id: i64,
        input: SectionInput,
    ) -> Result<SectionDto, CourseError> {
        self.owned_course(instructor_id, course_id, "modify").await?;
        let section = self
            .section_repo
            .create(course_id, &input, instructor_id)
            .await?;
        Ok(SectionDto::from(section))
    }

    async fn update_section(
        &self,
        instructor_id: Uuid,
        section_id: i64,
        input: SectionInput,
    ) -> Result<SectionDto, CourseError> {
        self.owned_section(instructor_id, section_id).await?;
        let section = self
            .section_repo
            .update(section_id, &input, instructor_id)
            .await?
            .ok_or(CourseError::SectionNotFound)?;
        let lessons = self.lesson_repo.find_by_section(section_id).await?;

        Ok(SectionDto::new(
            section,
            lessons.into_iter().map(LessonDto::from).collect(),
        ))
    }

    async fn delete_section(&self, instructor_id: Uuid, section_id: i64) -> Result<(), CourseError> {
        self.owned_section(instructor_id, section_id).await?;
        if self.lesson_repo.count_by_section(section_id).await? > 0 {
            return Err(CourseError::SectionHasLessons);
        }
        self.section_repo.soft_delete(section_id, instructor_id).await?;
        Ok(())
    }

    async fn add_lesson(
        &self,
        instructor_id: Uuid,
        section_id: i64,
        input: LessonInput,
    ) -> Result<LessonDto, CourseError> {
        self.owned_section(instructor_id, section_id).await?;
        let lesson = self
            .lesson_repo
            .create(section_id, &input, instructor_id)
            .await?;
        Ok(LessonDto::from(lesson))
    }

    async fn update_lesson(
        &self,
        instructor_id: Uuid,
        lesson_id: i64,
        input: LessonInput,
    ) -> Result<LessonDto, CourseError> {
        self.owned_lesson(instructor_id, lesson_id).await?;
        self.lesson_repo
            .update(lesson_id, &input, instructor_id)
            .await?
            .map(LessonDto::from)
            .ok_or(CourseError::LessonNotFound)
    }

    async fn delete_lesson(&self, instructor_id: Uuid, lesson_id: i64) -> Result<(), CourseError> {
        self.owned_lesson(instructor_id, lesson_id).await?;
        self.lesson_repo.soft_delete(lesson_id, instructor_id).await?;
        Ok(())
    }

    async fn set_lesson_content(
        &self,
        instructor_id: Uuid,
        lesson_id: i64,
        path: String,
    ) -> Result<(LessonDto, Option<String>), CourseError> {
        let lesson = self.owned_lesson(instructor_id, lesson_id).await?;
        self.lesson_repo
            .set_content_path(lesson_id, &path, instructor_id)
            .await?;

        let previous = lesson.content_path.clone();
        let updated = Lesson {
            content_path: Some(path),
            ..lesson
        };
        Ok((LessonDto::from(updated), previous))
    }
}
