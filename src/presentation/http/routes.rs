//! Route Configuration
//!
//! Configures all HTTP routes for the API.
//!
//! Layer order matters: `route_layer` calls added later wrap the earlier
//! ones, so authentication is added last to run first and the role guards
//! and per-user rate limiting see the [`AuthUser`](crate::presentation::middleware::AuthUser).

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use super::handlers::{
    admin, auth, category, course, dashboard, enrollment, health, instructor, notification,
    review, skill, user,
};
use crate::infrastructure::storage::LocalFileStorage;
use crate::presentation::middleware::{
    auth_middleware, create_security_headers_layer, metrics_middleware, optional_auth_middleware,
    rate_limit_api, rate_limit_auth, require_admin, require_instructor,
};
use crate::startup::AppState;

/// Create the main router: API, health probes, metrics and uploaded files
pub fn create_router(state: AppState) -> Router {
    let uploads = LocalFileStorage::new(state.settings.storage.root_dir.clone()).uploads_root();

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(health::metrics_handler))
        .nest_service("/uploads", ServeDir::new(uploads))
        .layer(middleware::from_fn(metrics_middleware))
        // Outermost so every response carries the headers
        .layer(create_security_headers_layer(&state.settings.environment))
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .merge(public_routes(state.clone()))
        .merge(protected_routes(state))
}

/// Credential endpoints with the stricter rate limit
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh_token))
        .route("/logout", post(auth::logout))
        .route("/email-available", get(auth::email_available))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_auth))
}

/// Catalogue reads; a token is optional and only personalizes the response
fn public_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/courses", get(course::search_courses))
        .route("/courses/published", get(course::published))
        .route("/courses/category/{category_id}", get(course::by_category))
        .route("/courses/top-rated", get(course::top_rated))
        .route("/courses/most-enrolled", get(course::most_enrolled))
        .route("/courses/recent", get(course::recent))
        .route("/courses/{id}", get(course::get_course))
        .route("/courses/{id}/reviews", get(course::course_reviews))
        .route("/courses/{id}/skills", get(course::course_skills))
        .route("/courses/{id}/rating", get(course::course_rating))
        .route("/categories", get(category::list_categories))
        .route("/categories/{id}", get(category::get_category))
        .route("/categories/{id}/courses", get(category::category_courses))
        .route("/skills", get(skill::list_skills))
        .route("/skills/popular", get(skill::popular_skills))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_api))
        .route_layer(middleware::from_fn_with_state(
            state.settings.clone(),
            optional_auth_middleware,
        ))
}

/// Everything behind a valid access token
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(learning_routes())
        .nest("/instructor", instructor_routes())
        .nest("/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_api))
        .route_layer(middleware::from_fn_with_state(
            state.settings.clone(),
            auth_middleware,
        ))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(user::get_me).put(user::update_me))
        .route("/me/password", post(auth::change_password))
        .route("/me/skills", get(user::get_my_skills).post(user::add_my_skills))
        .route("/me/skills/{skill_id}", delete(user::remove_my_skill))
        .route("/me/profile-picture", post(user::upload_profile_picture))
        .route("/notifications", get(notification::list_notifications))
        .route("/notifications/unread-count", get(notification::unread_count))
        .route("/notifications/read-all", post(notification::mark_all_as_read))
        .route("/notifications/{id}/read", post(notification::mark_as_read))
        .route("/dashboard", get(dashboard::student_dashboard))
}

fn learning_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/enrollments",
            get(enrollment::my_enrollments).post(enrollment::enroll),
        )
        .route("/enrollments/completed", get(enrollment::completed))
        .route("/enrollments/in-progress", get(enrollment::in_progress))
        .route("/enrollments/check/{course_id}", get(enrollment::is_enrolled))
        .route(
            "/enrollments/{id}",
            get(enrollment::get_enrollment).delete(enrollment::unenroll),
        )
        .route("/enrollments/{id}/progress", get(enrollment::progress))
        .route("/enrollments/{id}/complete", post(enrollment::complete_enrollment))
        .route(
            "/enrollments/{id}/lessons/{lesson_id}/progress",
            put(enrollment::update_lesson_progress),
        )
        .route(
            "/enrollments/{id}/lessons/{lesson_id}/complete",
            post(enrollment::complete_lesson),
        )
        .route("/reviews", post(review::create_review))
        .route("/reviews/mine", get(review::my_reviews))
        .route(
            "/reviews/{id}",
            put(review::update_review).delete(review::delete_review),
        )
}

fn instructor_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::instructor_dashboard))
        .route(
            "/courses",
            get(instructor::my_courses).post(instructor::create_course),
        )
        .route(
            "/courses/{id}",
            get(instructor::get_course)
                .put(instructor::update_course)
                .delete(instructor::delete_course),
        )
        .route("/courses/{id}/publish", post(instructor::publish_course))
        .route("/courses/{id}/unpublish", post(instructor::unpublish_course))
        .route("/courses/{id}/thumbnail", post(instructor::upload_thumbnail))
        .route("/courses/{id}/enrollments", get(instructor::course_enrollments))
        .route("/courses/{id}/sections", post(instructor::add_section))
        .route(
            "/sections/{id}",
            put(instructor::update_section).delete(instructor::delete_section),
        )
        .route("/sections/{id}/lessons", post(instructor::add_lesson))
        .route(
            "/lessons/{id}",
            put(instructor::update_lesson).delete(instructor::delete_lesson),
        )
        .route("/lessons/{id}/content", post(instructor::upload_lesson_content))
        .route("/enrollments", get(instructor::all_enrollments))
        .route_layer(middleware::from_fn(require_instructor))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::admin_dashboard))
        .route(
            "/categories",
            get(category::admin_list_categories).post(category::create_category),
        )
        .route(
            "/categories/{id}",
            put(category::update_category).delete(category::delete_category),
        )
        .route("/categories/{id}/icon", post(category::upload_category_icon))
        .route(
            "/skills",
            get(skill::admin_list_skills).post(skill::create_skill),
        )
        .route(
            "/skills/{id}",
            put(skill::update_skill).delete(skill::delete_skill),
        )
        .route("/users", get(admin::list_users))
        .route("/users/by-email", get(admin::find_user_by_email))
        .route("/users/{id}", get(admin::get_user).delete(admin::delete_user))
        .route("/users/{id}/roles", put(admin::set_roles))
        .route("/users/{id}/lock", post(admin::lock_user))
        .route("/users/{id}/unlock", post(admin::unlock_user))
        .route("/courses", get(admin::list_courses))
        .route("/courses/{id}", delete(admin::delete_course))
        .route_layer(middleware::from_fn(require_admin))
}
