//! Service wiring
//!
//! Handlers build their services per request from the shared [`AppState`].
//! Repositories only hold a pool clone, so construction is cheap.

use std::sync::Arc;

use crate::application::services::{
    AuthServiceImpl, CategoryServiceImpl, CourseServiceImpl, DashboardServiceImpl,
    EnrollmentServiceImpl, FileServiceImpl, NotificationServiceImpl, ReviewServiceImpl,
    SkillServiceImpl, UserServiceImpl,
};
use crate::infrastructure::cache::RedisCache;
use crate::infrastructure::repositories::{
    PgCategoryRepository, PgCourseRepository, PgEnrollmentRepository, PgLessonProgressRepository,
    PgLessonRepository, PgNotificationRepository, PgReviewRepository, PgSectionRepository,
    PgSessionRepository, PgSkillRepository, PgUserRepository,
};
use crate::infrastructure::storage::LocalFileStorage;
use crate::startup::AppState;

pub type AppAuthService = AuthServiceImpl<PgUserRepository, PgSessionRepository>;
pub type AppUserService = UserServiceImpl<PgUserRepository, PgSkillRepository, PgSessionRepository>;
pub type AppCategoryService =
    CategoryServiceImpl<PgCategoryRepository, PgCourseRepository, RedisCache>;
pub type AppSkillService = SkillServiceImpl<PgSkillRepository>;
pub type AppCourseService = CourseServiceImpl<
    PgCourseRepository,
    PgCategoryRepository,
    PgSkillRepository,
    PgSectionRepository,
    PgLessonRepository,
>;
pub type AppEnrollmentService = EnrollmentServiceImpl<
    PgEnrollmentRepository,
    PgCourseRepository,
    PgSectionRepository,
    PgLessonRepository,
    PgLessonProgressRepository,
    PgNotificationRepository,
>;
pub type AppReviewService =
    ReviewServiceImpl<PgReviewRepository, PgCourseRepository, PgEnrollmentRepository>;
pub type AppNotificationService = NotificationServiceImpl<PgNotificationRepository>;
pub type AppDashboardService = DashboardServiceImpl<
    PgUserRepository,
    PgCourseRepository,
    PgEnrollmentRepository,
    PgCategoryRepository,
    PgReviewRepository,
    RedisCache,
>;
pub type AppFileService = FileServiceImpl<LocalFileStorage>;

impl AppState {
    fn users(&self) -> Arc<PgUserRepository> {
        Arc::new(PgUserRepository::new(self.db.clone()))
    }

    fn sessions(&self) -> Arc<PgSessionRepository> {
        Arc::new(PgSessionRepository::new(self.db.clone()))
    }

    fn categories(&self) -> Arc<PgCategoryRepository> {
        Arc::new(PgCategoryRepository::new(self.db.clone()))
    }

    fn skills(&self) -> Arc<PgSkillRepository> {
        Arc::new(PgSkillRepository::new(self.db.clone()))
    }

    fn courses(&self) -> Arc<PgCourseRepository> {
        Arc::new(PgCourseRepository::new(self.db.clone()))
    }

    fn sections(&self) -> Arc<PgSectionRepository> {
        Arc::new(PgSectionRepository::new(self.db.clone()))
    }

    fn lessons(&self) -> Arc<PgLessonRepository> {
        Arc::new(PgLessonRepository::new(self.db.clone()))
    }

    fn enrollments(&self) -> Arc<PgEnrollmentRepository> {
        Arc::new(PgEnrollmentRepository::new(self.db.clone()))
    }

    fn reviews(&self) -> Arc<PgReviewRepository> {
        Arc::new(PgReviewRepository::new(self.db.clone()))
    }

    fn notifications(&self) -> Arc<PgNotificationRepository> {
        Arc::new(PgNotificationRepository::new(self.db.clone()))
    }

    fn cache(&self) -> Arc<RedisCache> {
        Arc::new(RedisCache::new(self.redis.clone()))
    }

    pub fn auth_service(&self) -> AppAuthService {
        AuthServiceImpl::new(self.users(), self.sessions(), self.settings.jwt.clone())
    }

    pub fn user_service(&self) -> AppUserService {
        UserServiceImpl::new(self.users(), self.skills(), self.sessions())
    }

    pub fn category_service(&self) -> AppCategoryService {
        CategoryServiceImpl::new(
            self.categories(),
            self.courses(),
            self.cache(),
            self.settings.redis.cache_ttl_seconds,
        )
    }

    pub fn skill_service(&self) -> AppSkillService {
        SkillServiceImpl::new(self.skills())
    }

    pub fn course_service(&self) -> AppCourseService {
        CourseServiceImpl::new(
            self.courses(),
            self.categories(),
            self.skills(),
            self.sections(),
            self.lessons(),
        )
    }

    pub fn enrollment_service(&self) -> AppEnrollmentService {
        EnrollmentServiceImpl::new(
            self.enrollments(),
            self.courses(),
            self.sections(),
            self.lessons(),
            Arc::new(PgLessonProgressRepository::new(self.db.clone())),
            self.notifications(),
        )
    }

    pub fn review_service(&self) -> AppReviewService {
        ReviewServiceImpl::new(self.reviews(), self.courses(), self.enrollments())
    }

    pub fn notification_service(&self) -> AppNotificationService {
        NotificationServiceImpl::new(self.notifications())
    }

    pub fn dashboard_service(&self) -> AppDashboardService {
        DashboardServiceImpl::new(
            self.users(),
            self.courses(),
            self.enrollments(),
            self.categories(),
            self.reviews(),
            self.cache(),
            self.settings.redis.cache_ttl_seconds,
        )
    }

    pub fn file_service(&self) -> AppFileService {
        FileServiceImpl::new(Arc::new(LocalFileStorage::new(
            self.settings.storage.root_dir.clone(),
        )))
    }
}
