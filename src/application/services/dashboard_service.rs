//! Dashboard Service
//!
//! Aggregated statistics for the admin, instructor and student dashboards.
//! Independent queries run concurrently with `futures::try_join!`. The admin
//! dashboard is cached for the configured TTL.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::application::dto::response::{
    decimal_to_f64, round2, AdminDashboardDto, CourseSummaryDto, EnrollmentDto,
    InstructorDashboardDto, ReviewDto, StudentDashboardDto,
};
use crate::domain::{
    CategoryRepository, CourseOrder, CourseRepository, CourseScope, EnrollmentFilter,
    EnrollmentRepository, ReviewRepository, Role, UserRepository,
};
use crate::infrastructure::cache::{keys, Cache};
use crate::shared::error::AppError;

const ADMIN_RECENT_COURSES: i64 = 5;
const ADMIN_TOP_RATED_COURSES: i64 = 5;
const ADMIN_RECENT_ENROLLMENTS: i64 = 10;
const INSTRUCTOR_RECENT_REVIEWS: i64 = 10;
const STUDENT_RECENT_ENROLLMENTS: usize = 5;
const STUDENT_TOP_IN_PROGRESS: usize = 5;
const STUDENT_RECOMMENDATIONS: i64 = 6;

#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn admin(&self) -> Result<AdminDashboardDto, DashboardError>;

    async fn instructor(&self, instructor_id: Uuid) -> Result<InstructorDashboardDto, DashboardError>;

    async fn student(&self, user_id: Uuid) -> Result<StudentDashboardDto, DashboardError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Repository(e) => e,
        }
    }
}

pub struct DashboardServiceImpl<U, C, E, G, R, K>
where
    U: UserRepository,
    C: CourseRepository,
    E: EnrollmentRepository,
    G: CategoryRepository,
    R: ReviewRepository,
    K: Cache,
{
    user_repo: Arc<U>,
    course_repo: Arc<C>,
    enrollment_repo: Arc<E>,
    category_repo: Arc<G>,
    review_repo: Arc<R>,
    cache: Arc<K>,
    cache_ttl_seconds: u64,
}

impl<U, C, E, G, R, K> DashboardServiceImpl<U, C, E, G, R, K>
where
    U: UserRepository,
    C: CourseRepository,
    E: EnrollmentRepository,
    G: CategoryRepository,
    R: ReviewRepository,
    K: Cache,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<U>,
        course_repo: Arc<C>,
        enrollment_repo: Arc<E>,
        category_repo: Arc<G>,
        review_repo: Arc<R>,
        cache: Arc<K>,
        cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            user_repo,
            course_repo,
            enrollment_repo,
            category_repo,
            review_repo,
            cache,
            cache_ttl_seconds,
        }
    }

    async fn build_admin(&self) -> Result<AdminDashboardDto, AppError> {
        let all = EnrollmentFilter::default();

        let (
            total_users,
            total_students,
            total_instructors,
            total_admins,
            total_courses,
            published_courses,
            total_enrollments,
            total_categories,
            recent_courses,
            top_rated_courses,
            recent_enrollments,
        ) = futures::try_join!(
            self.user_repo.count(),
            self.user_repo.count_by_role(Role::Student),
            self.user_repo.count_by_role(Role::Instructor),
            self.user_repo.count_by_role(Role::Admin),
            self.course_repo.count(None),
            self.course_repo.count(Some(true)),
            self.enrollment_repo.count(all),
            self.category_repo.count(),
            self.course_repo
                .list(CourseScope::All, CourseOrder::Newest, Some(ADMIN_RECENT_COURSES)),
            self.course_repo.list(
                CourseScope::Published,
                CourseOrder::TopRated,
                Some(ADMIN_TOP_RATED_COURSES)
            ),
            self.enrollment_repo
                .find_summaries(all, Some(ADMIN_RECENT_ENROLLMENTS)),
        )?;

        Ok(AdminDashboardDto {
            total_users,
            total_students,
            total_instructors,
            total_admins,
            total_courses,
            published_courses,
            unpublished_courses: total_courses - published_courses,
            total_enrollments,
            total_categories,
            recent_courses: recent_courses.into_iter().map(CourseSummaryDto::from).collect(),
            top_rated_courses: top_rated_courses
                .into_iter()
                .map(CourseSummaryDto::from)
                .collect(),
            recent_enrollments: recent_enrollments
                .into_iter()
                .map(EnrollmentDto::from)
                .collect(),
        })
    }
}

/// Student figures computed from the user's enrollments (newest first).
fn summarize_student(
    enrollments: Vec<EnrollmentDto>,
    recommended_courses: Vec<CourseSummaryDto>,
) -> StudentDashboardDto {
    let enrolled_courses = enrollments.len() as i64;
    let completed_courses = enrollments.iter().filter(|e| e.is_completed).count() as i64;

    let overall_progress = if enrollments.is_empty() {
        0.0
    } else {
        let sum: Decimal = enrollments.iter().map(|e| e.progress_percent).sum();
        decimal_to_f64((sum / Decimal::from(enrolled_courses)).round_dp(2))
    };

    let recent_enrollments = enrollments
        .iter()
        .take(STUDENT_RECENT_ENROLLMENTS)
        .cloned()
        .collect();

    let mut top_in_progress: Vec<EnrollmentDto> =
        enrollments.into_iter().filter(|e| !e.is_completed).collect();
    top_in_progress.sort_by(|a, b| b.progress_percent.cmp(&a.progress_percent));
    let in_progress_courses = top_in_progress.len() as i64;
    top_in_progress.truncate(STUDENT_TOP_IN_PROGRESS);

    StudentDashboardDto {
        enrolled_courses,
        completed_courses,
        in_progress_courses,
        overall_progress,
        recent_enrollments,
        top_in_progress,
        recommended_courses,
    }
}

#[async_trait]
impl<U, C, E, G, R, K> DashboardService for DashboardServiceImpl<U, C, E, G, R, K>
where
    U: UserRepository + 'static,
    C: CourseRepository + 'static,
    E: EnrollmentRepository + 'static,
    G: CategoryRepository + 'static,
    R: ReviewRepository + 'static,
    K: Cache + 'static,
{
    async fn admin(&self) -> Result<AdminDashboardDto, DashboardError> {
        match self.cache.get::<AdminDashboardDto>(keys::ADMIN_DASHBOARD).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Dashboard cache read failed"),
        }

        let dashboard = self.build_admin().await?;

        if let Err(e) = self
            .cache
            .set_ex(keys::ADMIN_DASHBOARD, &dashboard, self.cache_ttl_seconds)
            .await
        {
            warn!(error = %e, "Dashboard cache write failed");
        }
        Ok(dashboard)
    }

    async fn instructor(&self, instructor_id: Uuid) -> Result<InstructorDashboardDto, DashboardError> {
        let filter = EnrollmentFilter {
            instructor_id: Some(instructor_id),
            ..Default::default()
        };

        let (total_courses, published_courses, total_enrollments, stats, courses, recent_reviews) =
            futures::try_join!(
                self.course_repo.count_by_instructor(instructor_id, None),
                self.course_repo.count_by_instructor(instructor_id, Some(true)),
                self.enrollment_repo.count(filter),
                self.review_repo.stats_for_instructor(instructor_id),
                self.course_repo.list(
                    CourseScope::Instructor(instructor_id),
                    CourseOrder::Newest,
                    None
                ),
                self.review_repo
                    .find_recent_for_instructor(instructor_id, INSTRUCTOR_RECENT_REVIEWS),
            )?;

        Ok(InstructorDashboardDto {
            total_courses,
            published_courses,
            total_enrollments,
            total_reviews: stats.review_count,
            average_rating: round2(stats.average_rating),
            courses: courses.into_iter().map(CourseSummaryDto::from).collect(),
            recent_reviews: recent_reviews.into_iter().map(ReviewDto::from).collect(),
        })
    }

    async fn student(&self, user_id: Uuid) -> Result<StudentDashboardDto, DashboardError> {
        let filter = EnrollmentFilter {
            user_id: Some(user_id),
            ..Default::default()
        };

        let (enrollments, recommended) = futures::try_join!(
            self.enrollment_repo.find_summaries(filter, None),
            self.course_repo.list(
                CourseScope::NotEnrolledBy(user_id),
                CourseOrder::MostEnrolled,
                Some(STUDENT_RECOMMENDATIONS)
            ),
        )?;

        Ok(summarize_student(
            enrollments.into_iter().map(EnrollmentDto::from).collect(),
            recommended.into_iter().map(CourseSummaryDto::from).collect(),
        ))
    }
}
