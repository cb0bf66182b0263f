//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::{
    CategoryInput, ContentType, CourseInput, CourseLevel, CourseQuery, CourseSort, LessonInput,
    Role, SectionInput, SkillInput,
};
use crate::shared::pagination::PageRequest;

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        return Err(ValidationError::new("range").with_message("Price cannot be negative".into()));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Accounts
// ============================================================================

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 64, message = "Username must be 2-64 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Refresh token request (also used for logout)
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// Profile update. Missing fields keep their current value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters"))]
    pub bio: Option<String>,

    pub profile_picture_path: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddSkillsRequest {
    #[validate(length(min = 1, message = "Select at least one skill"))]
    pub skill_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetRolesRequest {
    #[validate(length(min = 1, message = "At least one role is required"))]
    pub roles: Vec<Role>,
}

/// Lock request; without `until` the account is locked indefinitely.
#[derive(Debug, Default, Deserialize)]
pub struct LockUserRequest {
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub role: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl UserListParams {
    /// Unknown role names are treated as no filter.
    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

// ============================================================================
// Catalogue
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    pub icon_path: Option<String>,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(request: CategoryRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            description: trimmed(request.description),
            icon_path: trimmed(request.icon_path),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SkillRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

impl From<SkillRequest> for SkillInput {
    fn from(request: SkillRequest) -> Self {
        Self {
            name: request.name.trim().to_string(),
            description: trimmed(request.description),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }
}

pub const DEFAULT_LIST_COUNT: i64 = 10;
pub const MAX_LIST_COUNT: i64 = 50;

/// `?count=` for top-N lists.
#[derive(Debug, Default, Deserialize)]
pub struct CountParams {
    pub count: Option<i64>,
}

impl CountParams {
    pub fn count(&self) -> i64 {
        self.count
            .unwrap_or(DEFAULT_LIST_COUNT)
            .clamp(1, MAX_LIST_COUNT)
    }
}

// ============================================================================
// Courses
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters"))]
    pub description: String,

    #[validate(length(max = 300, message = "Short description must be at most 300 characters"))]
    pub short_description: Option<String>,

    pub thumbnail_path: Option<String>,

    #[serde(default)]
    pub level: CourseLevel,

    #[validate(custom(function = "non_negative"))]
    pub price: Option<Decimal>,

    #[validate(range(min = 1, max = 1000, message = "Duration must be between 1 and 1000 hours"))]
    pub duration_in_hours: i32,

    pub category_id: i64,

    #[serde(default)]
    pub skill_ids: Vec<i64>,
}

impl CourseRequest {
    /// Split into the stored fields and the skill links.
    pub fn into_parts(self) -> (CourseInput, Vec<i64>) {
        let mut skill_ids = self.skill_ids;
        skill_ids.sort_unstable();
        skill_ids.dedup();

        let input = CourseInput {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            short_description: trimmed(self.short_description),
            thumbnail_path: trimmed(self.thumbnail_path),
            level: self.level,
            price: self.price.map(|p| p.round_dp(2)),
            duration_in_hours: self.duration_in_hours,
            category_id: self.category_id,
        };
        (input, skill_ids)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SectionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[validate(range(min = 1, message = "Order must be positive"))]
    pub order: Option<i32>,
}

impl From<SectionRequest> for SectionInput {
    fn from(request: SectionRequest) -> Self {
        Self {
            title: request.title.trim().to_string(),
            description: trimmed(request.description),
            order: request.order,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LessonRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub content_type: ContentType,

    pub content_path: Option<String>,

    #[validate(url(message = "External URL must be a valid URL"))]
    pub external_url: Option<String>,

    #[validate(range(min = 1, max = 1440, message = "Duration must be between 1 and 1440 minutes"))]
    pub duration_in_minutes: i32,

    #[validate(range(min = 1, message = "Order must be positive"))]
    pub order: Option<i32>,

    #[serde(default)]
    pub is_free: bool,
}

impl From<LessonRequest> for LessonInput {
    fn from(request: LessonRequest) -> Self {
        Self {
            title: request.title.trim().to_string(),
            description: trimmed(request.description),
            content_type: request.content_type,
            content_path: trimmed(request.content_path),
            external_url: trimmed(request.external_url),
            duration_in_minutes: request.duration_in_minutes,
            order: request.order,
            is_free: request.is_free,
        }
    }
}

/// Catalogue query string.
#[derive(Debug, Default, Deserialize)]
pub struct CourseSearchParams {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub level: Option<String>,
    pub skill_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl CourseSearchParams {
    pub fn to_query(&self) -> CourseQuery {
        CourseQuery {
            search: trimmed(self.search.clone()),
            category_id: self.category_id,
            level: self.level.as_deref().and_then(CourseLevel::parse),
            skill_id: self.skill_id,
            min_price: self.min_price,
            max_price: self.max_price,
            sort: self
                .sort_by
                .as_deref()
                .map(CourseSort::parse)
                .unwrap_or_default(),
            descending: self
                .sort_order
                .as_deref()
                .is_some_and(|o| o.eq_ignore_ascii_case("desc")),
            page: PageRequest::new(self.page, self.page_size),
        }
    }
}

// ============================================================================
// Enrollments & reviews
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct EnrollRequest {
    #[validate(range(min = 1, message = "Course ID is required"))]
    pub course_id: i64,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LessonProgressRequest {
    #[serde(default)]
    pub is_completed: bool,

    #[serde(default)]
    #[validate(range(min = 0, message = "Watched seconds cannot be negative"))]
    pub watched_seconds: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub course_id: i64,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::AppError;
    use crate::shared::validation::validate;
    use fake::faker::internet::en::{Password, SafeEmail, Username};
    use fake::Fake;
    use test_case::test_case;

    fn course_request() -> CourseRequest {
        CourseRequest {
            title: "  Rust Fundamentals ".into(),
            description: "Ownership and borrowing".into(),
            short_description: Some("   ".into()),
            thumbnail_path: None,
            level: CourseLevel::Beginner,
            price: Some(Decimal::new(49999, 3)),
            duration_in_hours: 12,
            category_id: 1,
            skill_ids: vec![3, 1, 3],
        }
    }

    #[test]
    fn test_register_request_with_generated_data_is_valid() {
        let request = RegisterRequest {
            username: Username().fake(),
            email: SafeEmail().fake(),
            password: Password(8..20).fake(),
            first_name: "Lina".into(),
            last_name: "Mostafa".into(),
        };
        assert!(validate(&request).is_ok());
    }

    #[test]
    fn test_register_request_rejects_short_password() {
        let request = RegisterRequest {
            username: "lina".into(),
            email: "lina@example.com".into(),
            password: "short".into(),
            first_name: "Lina".into(),
            last_name: "Mostafa".into(),
        };
        match validate(&request) {
            Err(AppError::Validation { fields, .. }) => assert_eq!(fields[0].field, "password"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_course_request_into_parts() {
        let (input, skills) = course_request().into_parts();
        assert_eq!(input.title, "Rust Fundamentals");
        assert_eq!(input.short_description, None);
        assert_eq!(input.price, Some(Decimal::new(5000, 2)));
        assert_eq!(skills, vec![1, 3]);
    }

    #[test_case(0 => false; "zero hours")]
    #[test_case(1 => true; "lower bound")]
    #[test_case(1000 => true; "upper bound")]
    #[test_case(1001 => false; "over limit")]
    fn test_course_duration_bounds(hours: i32) -> bool {
        let mut request = course_request();
        request.duration_in_hours = hours;
        validate(&request).is_ok()
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut request = course_request();
        request.price = Some(Decimal::new(-1, 0));
        assert!(validate(&request).is_err());
    }

    #[test_case(0 => false)]
    #[test_case(1 => true)]
    #[test_case(5 => true)]
    #[test_case(6 => false)]
    fn test_review_rating_bounds(rating: i32) -> bool {
        let request = CreateReviewRequest {
            course_id: 1,
            rating,
            comment: None,
        };
        validate(&request).is_ok()
    }

    #[test]
    fn test_search_params_to_query() {
        let params = CourseSearchParams {
            search: Some("  rust ".into()),
            level: Some("advanced".into()),
            sort_by: Some("price".into()),
            sort_order: Some("DESC".into()),
            page_size: Some(500),
            ..Default::default()
        };

        let query = params.to_query();
        assert_eq!(query.search.as_deref(), Some("rust"));
        assert_eq!(query.level, Some(CourseLevel::Advanced));
        assert_eq!(query.sort, CourseSort::Price);
        assert!(query.descending);
        assert_eq!(query.page.page_size, 100);
    }

    #[test]
    fn test_search_params_defaults() {
        let query = CourseSearchParams::default().to_query();
        assert_eq!(query.sort, CourseSort::Newest);
        assert!(!query.descending);
        assert_eq!(query.page, PageRequest::new(Some(1), Some(12)));
    }

    #[test_case(None => 10)]
    #[test_case(Some(0) => 1)]
    #[test_case(Some(500) => 50)]
    fn test_count_params(count: Option<i64>) -> i64 {
        CountParams { count }.count()
    }
}
