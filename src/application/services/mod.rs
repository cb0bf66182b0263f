//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AuthService**: Registration, login, JWT tokens, refresh rotation, passwords
//! - **UserService**: Profiles, user skills, admin account management
//! - **CategoryService** / **SkillService**: Catalogue taxonomy
//! - **CourseService**: Courses, sections, lessons and publishing
//! - **EnrollmentService**: Enrollments, lesson progress and completion
//! - **ReviewService**: Course reviews and ratings
//! - **DashboardService**: Admin, instructor and student statistics
//! - **NotificationService**: Per-user notification feed
//! - **FileService**: Upload validation and storage

pub mod auth_service;
pub mod category_service;
pub mod course_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod file_service;
pub mod notification_service;
pub mod review_service;
pub mod skill_service;
pub mod user_service;

pub use auth_service::{
    decode_access_token, AuthError, AuthService, AuthServiceImpl, AuthTokens, Claims,
};
pub use category_service::{CategoryError, CategoryService, CategoryServiceImpl};
pub use course_service::{CourseError, CourseService, CourseServiceImpl};
pub use dashboard_service::{DashboardError, DashboardService, DashboardServiceImpl};
pub use enrollment_service::{EnrollmentError, EnrollmentService, EnrollmentServiceImpl};
pub use file_service::{folders, FileError, FilePolicy, FileService, FileServiceImpl};
pub use notification_service::{NotificationError, NotificationService, NotificationServiceImpl};
pub use review_service::{ReviewError, ReviewService, ReviewServiceImpl};
pub use skill_service::{SkillError, SkillService, SkillServiceImpl};
pub use user_service::{UserError, UserService, UserServiceImpl};
