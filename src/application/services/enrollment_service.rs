//! Enrollment Service
//!
//! Enrolling in courses, lesson progress tracking and course completion.
//!
//! Progress writes go through `EnrollmentRepository::record_lesson_progress`,
//! which checks ownership and lesson membership, upserts the lesson row and
//! recomputes the enrollment percentage in a single transaction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::dto::response::{
    CourseProgressDto, EnrollmentDetailsDto, EnrollmentDto, EnrollmentStateDto,
    LessonProgressDto, LessonWithProgressDto, ProgressResultDto, SectionProgressDto,
};
use crate::domain::services::progress_percent;
use crate::domain::{
    CourseRepository, Enrollment, EnrollmentFilter, EnrollmentRepository,
    LessonProgressRepository, LessonRepository, NotificationRepository, ProgressUpdate,
    ProgressWrite, SectionRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Enrollment service trait
#[async_trait]
pub trait EnrollmentService: Send + Sync {
    async fn enroll(&self, user_id: Uuid, course_id: i64) -> Result<EnrollmentDto, EnrollmentError>;

    /// Remove an enrollment and its lesson progress
    async fn unenroll(&self, user_id: Uuid, enrollment_id: i64) -> Result<(), EnrollmentError>;

    async fn get(&self, enrollment_id: i64) -> Result<EnrollmentDto, EnrollmentError>;

    /// Enrollment with course structure and per-lesson progress (owner only)
    async fn get_details(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<EnrollmentDetailsDto, EnrollmentError>;

    async fn get_user_enrollments(&self, user_id: Uuid)
        -> Result<Vec<EnrollmentDto>, EnrollmentError>;

    /// Enrollments of one course, visible to its instructor
    async fn get_course_enrollments(
        &self,
        instructor_id: Uuid,
        course_id: i64,
    ) -> Result<Vec<EnrollmentDto>, EnrollmentError>;

    /// Enrollments across all courses of an instructor
    async fn get_instructor_enrollments(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<EnrollmentDto>, EnrollmentError>;

    async fn get_completed(&self, user_id: Uuid) -> Result<Vec<EnrollmentDto>, EnrollmentError>;

    async fn get_in_progress(&self, user_id: Uuid) -> Result<Vec<EnrollmentDto>, EnrollmentError>;

    async fn is_enrolled(&self, user_id: Uuid, course_id: i64) -> Result<bool, EnrollmentError>;

    async fn update_lesson_progress(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
        lesson_id: i64,
        is_completed: bool,
        watched_seconds: i32,
    ) -> Result<ProgressResultDto, EnrollmentError>;

    async fn mark_lesson_complete(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
        lesson_id: i64,
    ) -> Result<LessonProgressDto, EnrollmentError>;

    /// Recompute progress without writing it
    async fn calculate_progress(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<CourseProgressDto, EnrollmentError>;

    async fn mark_enrollment_complete(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<EnrollmentStateDto, EnrollmentError>;
}

/// Enrollment service errors
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("Enrollment not found")]
    NotFound,

    #[error("Course not found")]
    CourseNotFound,

    #[error("Lesson not found")]
    LessonNotFound,

    #[error("Cannot enroll in unpublished course")]
    CourseNotPublished,

    #[error("You are already enrolled in this course")]
    AlreadyEnrolled,

    #[error("Cannot unenroll from completed course")]
    AlreadyCompleted,

    #[error("You are not authorized to update this progress")]
    NotProgressOwner,

    #[error("You are not authorized to access this enrollment")]
    NotOwner,

    #[error("You are not authorized to view enrollments of this course")]
    NotCourseOwner,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<EnrollmentError> for AppError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::NotFound
            | EnrollmentError::CourseNotFound
            | EnrollmentError::LessonNotFound => AppError::NotFound(err.to_string()),
            EnrollmentError::AlreadyEnrolled => AppError::Conflict(err.to_string()),
            EnrollmentError::CourseNotPublished | EnrollmentError::AlreadyCompleted => {
                AppError::BadRequest(err.to_string())
            }
            EnrollmentError::NotProgressOwner
            | EnrollmentError::NotOwner
            | EnrollmentError::NotCourseOwner => AppError::Forbidden(err.to_string()),
            EnrollmentError::Repository(e) => e,
        }
    }
}

/// EnrollmentService implementation
pub struct EnrollmentServiceImpl<E, C, S, L, P, N>
where
    E: EnrollmentRepository,
    C: CourseRepository,
    S: SectionRepository,
    L: LessonRepository,
    P: LessonProgressRepository,
    N: NotificationRepository,
{
    enrollment_repo: Arc<E>,
    course_repo: Arc<C>,
    section_repo: Arc<S>,
    lesson_repo: Arc<L>,
    progress_repo: Arc<P>,
    notification_repo: Arc<N>,
}

impl<E, C, S, L, P, N> EnrollmentServiceImpl<E, C, S, L, P, N>
where
    E: EnrollmentRepository,
    C: CourseRepository,
    S: SectionRepository,
    L: LessonRepository,
    P: LessonProgressRepository,
    N: NotificationRepository,
{
    pub fn new(
        enrollment_repo: Arc<E>,
        course_repo: Arc<C>,
        section_repo: Arc<S>,
        lesson_repo: Arc<L>,
        progress_repo: Arc<P>,
        notification_repo: Arc<N>,
    ) -> Self {
        Self {
            enrollment_repo,
            course_repo,
            section_repo,
            lesson_repo,
            progress_repo,
            notification_repo,
        }
    }

    async fn load(&self, enrollment_id: i64) -> Result<Enrollment, EnrollmentError> {
        self.enrollment_repo
            .find_by_id(enrollment_id)
            .await?
            .ok_or(EnrollmentError::NotFound)
    }

    async fn load_owned(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<Enrollment, EnrollmentError> {
        let enrollment = self.load(enrollment_id).await?;
        if !enrollment.is_owned_by(user_id) {
            return Err(EnrollmentError::NotOwner);
        }
        Ok(enrollment)
    }

    async fn summary_of(&self, enrollment: &Enrollment) -> Result<EnrollmentDto, EnrollmentError> {
        let filter = EnrollmentFilter {
            user_id: Some(enrollment.user_id),
            course_id: Some(enrollment.course_id),
            ..Default::default()
        };
        self.enrollment_repo
            .find_summaries(filter, Some(1))
            .await?
            .into_iter()
            .next()
            .map(EnrollmentDto::from)
            .ok_or(EnrollmentError::NotFound)
    }

    async fn summaries(&self, filter: EnrollmentFilter) -> Result<Vec<EnrollmentDto>, EnrollmentError> {
        let summaries = self.enrollment_repo.find_summaries(filter, None).await?;
        Ok(summaries.into_iter().map(EnrollmentDto::from).collect())
    }

    /// Notifications are best effort; a failed insert never fails the caller.
    async fn notify(&self, user_id: Uuid, message: String, link: Option<String>) {
        if let Err(e) = self.notification_repo.create(user_id, &message, link).await {
            warn!(error = %e, %user_id, "Failed to create notification");
        }
    }
}

#[async_trait]
impl<E, C, S, L, P, N> EnrollmentService for EnrollmentServiceImpl<E, C, S, L, P, N>
where
    E: EnrollmentRepository + 'static,
    C: CourseRepository + 'static,
    S: SectionRepository + 'static,
    L: LessonRepository + 'static,
    P: LessonProgressRepository + 'static,
    N: NotificationRepository + 'static,
{
    #[instrument(skip(self))]
    async fn enroll(&self, user_id: Uuid, course_id: i64) -> Result<EnrollmentDto, EnrollmentError> {
        let course = self
            .course_repo
            .find_by_id(course_id)
            .await?
            .ok_or(EnrollmentError::CourseNotFound)?;

        if !course.is_published {
            return Err(EnrollmentError::CourseNotPublished);
        }
        if self
            .enrollment_repo
            .find_by_user_and_course(user_id, course_id)
            .await?
            .is_some()
        {
            return Err(EnrollmentError::AlreadyEnrolled);
        }

        let enrollment = self.enrollment_repo.create(user_id, course_id).await?;
        metrics::record_enrollment();
        info!(enrollment_id = enrollment.id, %user_id, course_id, "User enrolled");

        self.notify(
            user_id,
            format!("You enrolled in {}", course.title),
            Some(format!("/courses/{}", course_id)),
        )
        .await;

        self.summary_of(&enrollment).await
    }

    #[instrument(skip(self))]
    async fn unenroll(&self, user_id: Uuid, enrollment_id: i64) -> Result<(), EnrollmentError> {
        let enrollment = self.load_owned(user_id, enrollment_id).await?;
        if enrollment.is_completed {
            return Err(EnrollmentError::AlreadyCompleted);
        }

        if !self.enrollment_repo.delete(enrollment_id).await? {
            return Err(EnrollmentError::NotFound);
        }
        info!(enrollment_id, %user_id, "User unenrolled");
        Ok(())
    }

    async fn get(&self, enrollment_id: i64) -> Result<EnrollmentDto, EnrollmentError> {
        let enrollment = self.load(enrollment_id).await?;
        self.summary_of(&enrollment).await
    }

    async fn get_details(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<EnrollmentDetailsDto, EnrollmentError> {
        let enrollment = self.load_owned(user_id, enrollment_id).await?;
        let summary = self.summary_of(&enrollment).await?;

        let sections = self.section_repo.find_by_course(enrollment.course_id).await?;
        let lessons = self.lesson_repo.find_by_course(enrollment.course_id).await?;
        let progress: HashMap<i64, _> = self
            .progress_repo
            .find_by_enrollment(enrollment_id)
            .await?
            .into_iter()
            .map(|p| (p.lesson_id, p))
            .collect();

        let mut by_section: HashMap<i64, Vec<LessonWithProgressDto>> = HashMap::new();
        for lesson in lessons {
            let entry = LessonWithProgressDto::new(lesson.clone(), progress.get(&lesson.id));
            by_section.entry(lesson.section_id).or_default().push(entry);
        }

        let sections = sections
            .into_iter()
            .map(|section| SectionProgressDto {
                lessons: by_section.remove(&section.id).unwrap_or_default(),
                id: section.id,
                title: section.title,
                order: section.order,
            })
            .collect();

        Ok(EnrollmentDetailsDto {
            enrollment: summary,
            sections,
        })
    }

    async fn get_user_enrollments(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EnrollmentDto>, EnrollmentError> {
        self.summaries(EnrollmentFilter {
            user_id: Some(user_id),
            ..Default::default()
        })
        .await
    }

    async fn get_course_enrollments(
        &self,
        instructor_id: Uuid,
        course_id: i64,
    ) -> Result<Vec<EnrollmentDto>, EnrollmentError> {
        let course = self
            .course_repo
            .find_by_id(course_id)
            .await?
            .ok_or(EnrollmentError::CourseNotFound)?;
        if !course.is_owned_by(instructor_id) {
            return Err(EnrollmentError::NotCourseOwner);
        }

        self.summaries(EnrollmentFilter {
            course_id: Some(course_id),
            ..Default::default()
        })
        .await
    }

    async fn get_instructor_enrollments(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<EnrollmentDto>, EnrollmentError> {
        self.summaries(EnrollmentFilter {
            instructor_id: Some(instructor_id),
            ..Default::default()
        })
        .await
    }

    async fn get_completed(&self, user_id: Uuid) -> Result<Vec<EnrollmentDto>, EnrollmentError> {
        self.summaries(EnrollmentFilter {
            user_id: Some(user_id),
            completed: Some(true),
            ..Default::default()
        })
        .await
    }

    async fn get_in_progress(&self, user_id: Uuid) -> Result<Vec<EnrollmentDto>, EnrollmentError> {
        self.summaries(EnrollmentFilter {
            user_id: Some(user_id),
            completed: Some(false),
            ..Default::default()
        })
        .await
    }

    async fn is_enrolled(&self, user_id: Uuid, course_id: i64) -> Result<bool, EnrollmentError> {
        Ok(self
            .enrollment_repo
            .find_by_user_and_course(user_id, course_id)
            .await?
            .is_some())
    }

    #[instrument(skip(self))]
    async fn update_lesson_progress(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
        lesson_id: i64,
        is_completed: bool,
        watched_seconds: i32,
    ) -> Result<ProgressResultDto, EnrollmentError> {
        let write = self
            .enrollment_repo
            .record_lesson_progress(ProgressUpdate {
                user_id,
                enrollment_id,
                lesson_id,
                is_completed,
                watched_seconds: watched_seconds.max(0),
                at: Utc::now(),
            })
            .await;

        let outcome = match write {
            Ok(ProgressWrite::Recorded(outcome)) => outcome,
            Ok(ProgressWrite::NotOwner) => return Err(EnrollmentError::NotProgressOwner),
            Ok(ProgressWrite::LessonNotInCourse) => return Err(EnrollmentError::LessonNotFound),
            Err(AppError::NotFound(_)) => return Err(EnrollmentError::NotFound),
            Err(e) => return Err(e.into()),
        };

        metrics::record_lesson_progress(outcome.newly_completed);

        if outcome.newly_completed {
            info!(enrollment_id, %user_id, "Course completed");
            let title = match self.course_repo.find_by_id(outcome.enrollment.course_id).await {
                Ok(Some(course)) => course.title,
                _ => String::from("your course"),
            };
            self.notify(
                user_id,
                format!("Congratulations! You completed {}", title),
                Some(format!("/enrollments/{}", enrollment_id)),
            )
            .await;
        }

        Ok(ProgressResultDto {
            lesson: LessonProgressDto::from(outcome.progress),
            enrollment: EnrollmentStateDto::from(outcome.enrollment),
            course_completed_now: outcome.newly_completed,
        })
    }

    async fn mark_lesson_complete(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
        lesson_id: i64,
    ) -> Result<LessonProgressDto, EnrollmentError> {
        let result = self
            .update_lesson_progress(user_id, enrollment_id, lesson_id, true, 0)
            .await?;
        Ok(result.lesson)
    }

    async fn calculate_progress(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<CourseProgressDto, EnrollmentError> {
        let enrollment = self.load_owned(user_id, enrollment_id).await?;

        let total_lessons = self.lesson_repo.count_by_course(enrollment.course_id).await?;
        let completed_lessons = self.progress_repo.count_completed(enrollment_id).await?;

        Ok(CourseProgressDto {
            enrollment_id,
            total_lessons,
            completed_lessons,
            progress_percent: progress_percent(completed_lessons, total_lessons),
            is_completed: enrollment.is_completed,
        })
    }

    #[instrument(skip(self))]
    async fn mark_enrollment_complete(
        &self,
        user_id: Uuid,
        enrollment_id: i64,
    ) -> Result<EnrollmentStateDto, EnrollmentError> {
        self.load_owned(user_id, enrollment_id).await?;

        let enrollment = self
            .enrollment_repo
            .mark_complete(enrollment_id, Utc::now())
            .await?
            .ok_or(EnrollmentError::NotFound)?;

        info!(enrollment_id, %user_id, "Enrollment marked complete");
        Ok(EnrollmentStateDto::from(enrollment))
    }
}
