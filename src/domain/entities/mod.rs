//! # Domain Entities
//!
//! Core domain entities of the course marketplace. All entities map directly
//! to their corresponding database tables.
//!
//! ## Catalogue
//!
//! - **Category**: Grouping of courses
//! - **Skill**: Tag shared by courses and user profiles
//! - **Course**: Instructor-owned course with ordered sections
//! - **Section** / **Lesson**: Ordered course content
//!
//! ## Learning
//!
//! - **Enrollment**: A student's registration in a course with cached progress
//! - **LessonProgress**: Per-lesson completion and watch time
//! - **Review**: One rating per user and course
//! - **Notification**: Per-user message feed
//!
//! ## Accounts
//!
//! - **User**: Account with profile data and role set
//! - **Session**: Refresh token session
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod category;
mod course;
mod enrollment;
mod lesson;
mod lesson_progress;
mod notification;
mod review;
mod section;
mod session;
mod skill;
mod user;

pub use category::{Category, CategoryInput, CategoryRepository, CategoryWithCount};
pub use course::{
    Course, CourseInput, CourseLevel, CourseOrder, CourseQuery, CourseRepository, CourseScope,
    CourseSort, CourseSummary,
};
pub use enrollment::{
    Enrollment, EnrollmentFilter, EnrollmentRepository, EnrollmentSummary, ProgressOutcome,
    ProgressUpdate, ProgressWrite,
};
pub use lesson::{ContentType, Lesson, LessonInput, LessonRepository};
pub use lesson_progress::{LessonProgress, LessonProgressRepository};
pub use notification::{Notification, NotificationRepository};
pub use review::{RatingStats, Review, ReviewDetails, ReviewRepository, MAX_RATING, MIN_RATING};
pub use section::{Section, SectionInput, SectionRepository};
pub use session::{Session, SessionRepository};
pub use skill::{
    Skill, SkillInput, SkillRepository, SkillWithCount, UserSkill, DEFAULT_PROFICIENCY_LEVEL,
};
pub use user::{User, UserRepository};

#[cfg(test)]
pub use category::MockCategoryRepository;
#[cfg(test)]
pub use course::MockCourseRepository;
#[cfg(test)]
pub use enrollment::MockEnrollmentRepository;
#[cfg(test)]
pub use lesson::MockLessonRepository;
#[cfg(test)]
pub use lesson_progress::MockLessonProgressRepository;
#[cfg(test)]
pub use notification::MockNotificationRepository;
#[cfg(test)]
pub use review::MockReviewRepository;
#[cfg(test)]
pub use section::MockSectionRepository;
#[cfg(test)]
pub use session::MockSessionRepository;
#[cfg(test)]
pub use skill::MockSkillRepository;
#[cfg(test)]
pub use user::MockUserRepository;
