//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! Each repository owns a `PgPool` clone, maps rows through a private
//! `FromRow` struct, and filters soft-deleted rows explicitly in SQL.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository** - Accounts and role membership
//! - **PgSessionRepository** - Refresh token sessions
//! - **PgCategoryRepository** / **PgSkillRepository** - Catalogue taxonomy
//! - **PgCourseRepository** - Courses, catalogue search and skill links
//! - **PgSectionRepository** / **PgLessonRepository** - Course content
//! - **PgEnrollmentRepository** - Enrollments and transactional progress writes
//! - **PgLessonProgressRepository** - Per-lesson progress reads
//! - **PgReviewRepository** - Reviews and rating aggregates
//! - **PgNotificationRepository** - User notifications
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgCourseRepository, PgSectionRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let course_repo = PgCourseRepository::new(pool.clone());
//!     let section_repo = PgSectionRepository::new(pool.clone());
//! }
//! ```

pub mod category_repository;
pub mod course_repository;
pub mod enrollment_repository;
pub mod lesson_progress_repository;
pub mod lesson_repository;
pub mod notification_repository;
pub mod review_repository;
pub mod section_repository;
pub mod session_repository;
pub mod skill_repository;
pub mod user_repository;

pub use category_repository::PgCategoryRepository;
pub use course_repository::PgCourseRepository;
pub use enrollment_repository::PgEnrollmentRepository;
pub use lesson_progress_repository::PgLessonProgressRepository;
pub use lesson_repository::PgLessonRepository;
pub use notification_repository::PgNotificationRepository;
pub use review_repository::PgReviewRepository;
pub use section_repository::PgSectionRepository;
pub use session_repository::PgSessionRepository;
pub use skill_repository::PgSkillRepository;
pub use user_repository::PgUserRepository;
