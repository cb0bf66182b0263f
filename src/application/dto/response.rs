//! Response DTOs
//!
//! Data structures for API response bodies, with explicit conversions from
//! domain entities.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryWithCount, ContentType, Course, CourseLevel, CourseSummary, Enrollment,
    EnrollmentSummary, Lesson, LessonProgress, Notification, Review, ReviewDetails, Role, Section,
    Skill, SkillWithCount, User, UserSkill,
};

/// Round a float to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Accounts
// ============================================================================

/// Authentication tokens
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

/// Register/login response (user plus tokens)
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_picture_path: Option<String>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub lockout_end: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            profile_picture_path: user.profile_picture_path,
            roles: user.roles,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
            lockout_end: user.lockout_end,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSkillDto {
    pub skill_id: i64,
    pub name: String,
    pub proficiency_level: i32,
    pub added_at: DateTime<Utc>,
}

impl From<UserSkill> for UserSkillDto {
    fn from(skill: UserSkill) -> Self {
        Self {
            skill_id: skill.skill_id,
            name: skill.skill_name,
            proficiency_level: skill.proficiency_level,
            added_at: skill.added_at,
        }
    }
}

/// Profile view: user with skills
#[derive(Debug, Serialize)]
pub struct ProfileDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub skills: Vec<UserSkillDto>,
}

#[derive(Debug, Serialize)]
pub struct EmailAvailabilityDto {
    pub email: String,
    pub available: bool,
}

// ============================================================================
// Catalogue
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_count: Option<i64>,
    pub created_on: DateTime<Utc>,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            icon_path: category.icon_path,
            course_count: None,
            created_on: category.audit.created_on,
        }
    }
}

impl From<CategoryWithCount> for CategoryDto {
    fn from(value: CategoryWithCount) -> Self {
        Self {
            course_count: Some(value.course_count),
            ..Self::from(value.category)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryWithCoursesDto {
    #[serde(flatten)]
    pub category: CategoryDto,
    pub courses: Vec<CourseSummaryDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkillDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_count: Option<i64>,
}

impl From<Skill> for SkillDto {
    fn from(skill: Skill) -> Self {
        Self {
            id: skill.id,
            name: skill.name,
            description: skill.description,
            course_count: None,
        }
    }
}

impl From<SkillWithCount> for SkillDto {
    fn from(value: SkillWithCount) -> Self {
        Self {
            course_count: Some(value.course_count),
            ..Self::from(value.skill)
        }
    }
}

// ============================================================================
// Courses
// ============================================================================

/// Plain course record as stored.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub thumbnail_path: Option<String>,
    pub level: CourseLevel,
    pub is_published: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub duration_in_hours: i32,
    pub category_id: i64,
    pub instructor_id: Uuid,
    pub created_on: DateTime<Utc>,
    pub last_modified_on: DateTime<Utc>,
}

impl From<Course> for CourseDto {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            short_description: course.short_description,
            thumbnail_path: course.thumbnail_path,
            level: course.level,
            is_published: course.is_published,
            price: course.price,
            duration_in_hours: course.duration_in_hours,
            category_id: course.category_id,
            instructor_id: course.instructor_id,
            created_on: course.audit.created_on,
            last_modified_on: course.audit.last_modified_on,
        }
    }
}

/// Catalogue card: course plus names and aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseSummaryDto {
    pub id: i64,
    pub title: String,
    pub short_description: Option<String>,
    pub thumbnail_path: Option<String>,
    pub level: CourseLevel,
    pub is_published: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub is_free: bool,
    pub duration_in_hours: i32,
    pub category_id: i64,
    pub category_name: String,
    pub instructor_id: Uuid,
    pub instructor_name: String,
    pub enrollment_count: i64,
    pub review_count: i64,
    pub average_rating: f64,
    pub skills: Vec<String>,
    pub created_on: DateTime<Utc>,
}

impl From<CourseSummary> for CourseSummaryDto {
    fn from(summary: CourseSummary) -> Self {
        let course = summary.course;
        Self {
            id: course.id,
            title: course.title,
            short_description: course.short_description,
            thumbnail_path: course.thumbnail_path,
            level: course.level,
            is_published: course.is_published,
            is_free: course.price.map_or(true, |p| p.is_zero()),
            price: course.price,
            duration_in_hours: course.duration_in_hours,
            category_id: course.category_id,
            category_name: summary.category_name,
            instructor_id: course.instructor_id,
            instructor_name: summary.instructor_name,
            enrollment_count: summary.enrollment_count,
            review_count: summary.review_count,
            average_rating: round2(summary.average_rating),
            skills: summary.skill_names,
            created_on: course.audit.created_on,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonDto {
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
}

impl From<Lesson> for LessonDto {
    fn from(lesson: Lesson) -> Self {
        Self {
            id: lesson.id,
            section_id: lesson.section_id,
            title: lesson.title,
            description: lesson.description,
            content_type: lesson.content_type,
            content_path: lesson.content_path,
            external_url: lesson.external_url,
            duration_in_minutes: lesson.duration_in_minutes,
            order: lesson.order,
            is_free: lesson.is_free,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SectionDto {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub order: i32,
    pub lessons: Vec<LessonDto>,
}

impl SectionDto {
    pub fn new(section: Section, lessons: Vec<LessonDto>) -> Self {
        Self {
            id: section.id,
            course_id: section.course_id,
            title: section.title,
            description: section.description,
            order: section.order,
            lessons,
        }
    }
}

impl From<Section> for SectionDto {
    fn from(section: Section) -> Self {
        Self::new(section, Vec::new())
    }
}

/// Full course page: summary, description and ordered content.
#[derive(Debug, Serialize)]
pub struct CourseDetailsDto {
    #[serde(flatten)]
    pub summary: CourseSummaryDto,
    pub description: String,
    pub sections: Vec<SectionDto>,
    pub total_lessons: usize,
    pub total_duration_minutes: i64,
}

// ============================================================================
// Enrollments & progress
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrollmentDto {
    pub id: i64,
    pub user_id: Uuid,
    pub user_name: String,
    pub course_id: i64,
    pub course_title: String,
    pub course_thumbnail: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub progress_percent: Decimal,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

impl From<EnrollmentSummary> for EnrollmentDto {
    fn from(summary: EnrollmentSummary) -> Self {
        let enrollment = summary.enrollment;
        Self {
            id: enrollment.id,
            user_id: enrollment.user_id,
            user_name: summary.user_name,
            course_id: enrollment.course_id,
            course_title: summary.course_title,
            course_thumbnail: summary.course_thumbnail,
            enrolled_at: enrollment.enrolled_at,
            progress_percent: enrollment.progress_percent,
            is_completed: enrollment.is_completed,
            completed_at: enrollment.completed_at,
            total_lessons: summary.total_lessons,
            completed_lessons: summary.completed_lessons,
        }
    }
}

/// Enrollment state without joined names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrollmentStateDto {
    pub id: i64,
    pub course_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub progress_percent: Decimal,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Enrollment> for EnrollmentStateDto {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            course_id: enrollment.course_id,
            progress_percent: enrollment.progress_percent,
            is_completed: enrollment.is_completed,
            completed_at: enrollment.completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonProgressDto {
    pub enrollment_id: i64,
    pub lesson_id: i64,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub watched_seconds: i32,
}

impl From<LessonProgress> for LessonProgressDto {
    fn from(progress: LessonProgress) -> Self {
        Self {
            enrollment_id: progress.enrollment_id,
            lesson_id: progress.lesson_id,
            is_completed: progress.is_completed,
            completed_at: progress.completed_at,
            watched_seconds: progress.watched_seconds,
        }
    }
}

/// Result of a lesson progress write.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressResultDto {
    pub lesson: LessonProgressDto,
    pub enrollment: EnrollmentStateDto,
    /// True only on the update that completed the course
    pub course_completed_now: bool,
}

/// Recomputed course progress for one enrollment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseProgressDto {
    pub enrollment_id: i64,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub progress_percent: Decimal,
    pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LessonWithProgressDto {
    #[serde(flatten)]
    pub lesson: LessonDto,
    pub is_completed: bool,
    pub watched_seconds: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonWithProgressDto {
    pub fn new(lesson: Lesson, progress: Option<&LessonProgress>) -> Self {
        Self {
            lesson: LessonDto::from(lesson),
            is_completed: progress.is_some_and(|p| p.is_completed),
            watched_seconds: progress.map_or(0, |p| p.watched_seconds),
            completed_at: progress.and_then(|p| p.completed_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SectionProgressDto {
    pub id: i64,
    pub title: String,
    pub order: i32,
    pub lessons: Vec<LessonWithProgressDto>,
}

/// Enrollment with the course structure and per-lesson progress.
#[derive(Debug, Serialize)]
pub struct EnrollmentDetailsDto {
    #[serde(flatten)]
    pub enrollment: EnrollmentDto,
    pub sections: Vec<SectionProgressDto>,
}

// ============================================================================
// Reviews & notifications
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewDto {
    pub id: i64,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub course_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_on: DateTime<Utc>,
    pub last_modified_on: DateTime<Utc>,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            user_name: None,
            course_id: review.course_id,
            course_title: None,
            rating: review.rating,
            comment: review.comment,
            created_on: review.audit.created_on,
            last_modified_on: review.audit.last_modified_on,
        }
    }
}

impl From<ReviewDetails> for ReviewDto {
    fn from(details: ReviewDetails) -> Self {
        Self {
            user_name: Some(details.user_name),
            course_title: Some(details.course_title),
            ..Self::from(details.review)
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RatingSummaryDto {
    pub course_id: i64,
    pub review_count: i64,
    pub average_rating: f64,
}

/// Rating summary plus whether the caller, when signed in, has reviewed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CourseRatingDto {
    #[serde(flatten)]
    pub summary: RatingSummaryDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_reviewed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NotificationDto {
    pub id: i64,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_on: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id,
            message: notification.message,
            link: notification.link,
            is_read: notification.is_read,
            created_on: notification.created_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCountDto {
    pub unread: i64,
}

// ============================================================================
// Dashboards
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminDashboardDto {
    pub total_users: i64,
    pub total_students: i64,
    pub total_instructors: i64,
    pub total_admins: i64,
    pub total_courses: i64,
    pub published_courses: i64,
    pub unpublished_courses: i64,
    pub total_enrollments: i64,
    pub total_categories: i64,
    pub recent_courses: Vec<CourseSummaryDto>,
    pub top_rated_courses: Vec<CourseSummaryDto>,
    pub recent_enrollments: Vec<EnrollmentDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstructorDashboardDto {
    pub total_courses: i64,
    pub published_courses: i64,
    pub total_enrollments: i64,
    pub total_reviews: i64,
    pub average_rating: f64,
    pub courses: Vec<CourseSummaryDto>,
    pub recent_reviews: Vec<ReviewDto>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentDashboardDto {
    pub enrolled_courses: i64,
    pub completed_courses: i64,
    pub in_progress_courses: i64,
    pub overall_progress: f64,
    pub recent_enrollments: Vec<EnrollmentDto>,
    pub top_in_progress: Vec<EnrollmentDto>,
    pub recommended_courses: Vec<CourseSummaryDto>,
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileUploadDto {
    /// Relative path as stored on the entity
    pub path: String,
    /// Public URL path
    pub url: String,
}

/// Percentage as f64 for aggregates computed in memory.
pub fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditInfo;
    use pretty_assertions::assert_eq;

    fn course(price: Option<Decimal>) -> Course {
        Course {
            id: 5,
            title: "Rust Fundamentals".into(),
            description: "Ownership".into(),
            short_description: None,
            thumbnail_path: None,
            level: CourseLevel::Beginner,
            is_published: true,
            price,
            duration_in_hours: 12,
            category_id: 1,
            instructor_id: Uuid::nil(),
            audit: AuditInfo::new(None),
        }
    }

    fn summary(price: Option<Decimal>) -> CourseSummary {
        CourseSummary {
            course: course(price),
            category_name: "Programming".into(),
            instructor_name: "Sara Haddad".into(),
            enrollment_count: 3,
            review_count: 2,
            average_rating: 4.666666,
            skill_names: vec!["Rust".into()],
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(4.666666), 4.67);
        assert_eq!(round2(3.0), 3.0);
    }

    #[test]
    fn test_course_summary_conversion() {
        let dto = CourseSummaryDto::from(summary(Some(Decimal::new(4999, 2))));
        assert_eq!(dto.average_rating, 4.67);
        assert!(!dto.is_free);
        assert_eq!(dto.skills, vec!["Rust".to_string()]);

        assert!(CourseSummaryDto::from(summary(None)).is_free);
        assert!(CourseSummaryDto::from(summary(Some(Decimal::ZERO))).is_free);
    }

    #[test]
    fn test_price_serializes_as_number() {
        let dto = CourseSummaryDto::from(summary(Some(Decimal::new(4999, 2))));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["price"], serde_json::json!(49.99));
        assert_eq!(json["level"], "Beginner");
    }

    #[test]
    fn test_category_dto_count_only_when_known() {
        let category = Category {
            id: 1,
            name: "Programming".into(),
            description: None,
            icon_path: None,
            audit: AuditInfo::new(None),
        };
        let plain = serde_json::to_value(CategoryDto::from(category.clone())).unwrap();
        assert!(plain.get("course_count").is_none());

        let counted = CategoryDto::from(CategoryWithCount {
            category,
            course_count: 4,
        });
        assert_eq!(counted.course_count, Some(4));
    }

    #[test]
    fn test_lesson_with_progress_defaults() {
        let lesson = Lesson {
            id: 9,
            section_id: 2,
            title: "Borrowing".into(),
            description: None,
            content_type: ContentType::Video,
            content_path: None,
            external_url: None,
            duration_in_minutes: 30,
            order: 1,
            is_free: false,
            audit: AuditInfo::new(None),
        };

        let none = LessonWithProgressDto::new(lesson.clone(), None);
        assert!(!none.is_completed);
        assert_eq!(none.watched_seconds, 0);

        let mut progress = LessonProgress::new(1, 9);
        progress.apply(true, 120, Utc::now());
        let done = LessonWithProgressDto::new(lesson, Some(&progress));
        assert!(done.is_completed);
        assert_eq!(done.watched_seconds, 120);
        assert!(done.completed_at.is_some());
    }
}
