//! Common Test Utilities
//!
//! Builds the full router against a real PostgreSQL and Redis. Set
//! `TEST_DATABASE_URL` and `TEST_REDIS_URL` to run these tests; without
//! them every test returns early.

use std::sync::Arc;

use axum_test::TestServer;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use serde_json::{json, Value};
use sqlx::PgPool;
use tempfile::TempDir;
use uuid::Uuid;

use smart_courses::config::{
    CorsSettings, DatabaseSettings, JwtSettings, RateLimitSettings, RedisSettings, SeedSettings,
    ServerSettings, Settings, StorageSettings,
};
use smart_courses::infrastructure::{cache, database};
use smart_courses::startup::{build_router, AppState};

pub const TEST_PASSWORD: &str = "Sup3rSecret!";

/// A registered account and its tokens
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Test application wired to real dependencies
pub struct TestApp {
    pub server: TestServer,
    pub db: PgPool,
    _uploads: TempDir,
}

impl TestApp {
    /// `None` when the test database or Redis is not configured
    pub async fn spawn() -> Option<Self> {
        let (Ok(database_url), Ok(redis_url)) = (
            std::env::var("TEST_DATABASE_URL"),
            std::env::var("TEST_REDIS_URL"),
        ) else {
            eprintln!("TEST_DATABASE_URL / TEST_REDIS_URL not set, skipping");
            return None;
        };
        let uploads = TempDir::new().expect("temp dir");

        let settings = test_settings(
            database_url,
            redis_url,
            uploads.path().to_string_lossy().into_owned(),
        );

        let db = database::create_pool(&settings.database)
            .await
            .expect("Failed to connect to test database");
        database::run_migrations(&db)
            .await
            .expect("Failed to run migrations");
        let redis = cache::create_redis_client(&settings.redis)
            .await
            .expect("Failed to connect to test Redis");

        let state = AppState {
            db: db.clone(),
            redis,
            settings: Arc::new(settings),
        };
        let server = TestServer::new(build_router(state)).expect("Failed to build test server");

        Some(Self {
            server,
            db,
            _uploads: uploads,
        })
    }

    /// Register a fresh student account
    pub async fn register_user(&self) -> TestUser {
        let email = unique_email();
        let response = self
            .server
            .post("/api/v1/auth/register")
            .json(&json!({
                "username": unique_username(),
                "email": email,
                "password": TEST_PASSWORD,
                "first_name": FirstName().fake::<String>(),
                "last_name": LastName().fake::<String>(),
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        let data = &body["data"];
        TestUser {
            id: data["user"]["id"]
                .as_str()
                .and_then(|id| id.parse().ok())
                .expect("user id"),
            email,
            access_token: data["access_token"].as_str().expect("access token").into(),
            refresh_token: data["refresh_token"].as_str().expect("refresh token").into(),
        }
    }

    /// Register an account holding `role` and log in again so the token carries it
    pub async fn register_with_role(&self, role: &str) -> TestUser {
        let user = self.register_user().await;
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user.id)
            .bind(role)
            .execute(&self.db)
            .await
            .expect("Failed to grant role");
        self.login(&user).await
    }

    pub async fn login(&self, user: &TestUser) -> TestUser {
        let response = self
            .server
            .post("/api/v1/auth/login")
            .json(&json!({ "email": user.email, "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        TestUser {
            access_token: body["data"]["access_token"].as_str().expect("access token").into(),
            refresh_token: body["data"]["refresh_token"].as_str().expect("refresh token").into(),
            ..user.clone()
        }
    }

    /// Create a category as `admin`, returning its id
    pub async fn create_category(&self, admin: &TestUser) -> i64 {
        let response = self
            .server
            .post("/api/v1/admin/categories")
            .authorization_bearer(&admin.access_token)
            .json(&json!({ "name": format!("Category {}", Uuid::new_v4().simple()) }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["id"].as_i64().expect("category id")
    }

    /// Create a course with one section and one lesson, returning
    /// `(course_id, lesson_id)`
    pub async fn create_course_with_lesson(&self, instructor: &TestUser, category_id: i64) -> (i64, i64) {
        let course: Value = self
            .server
            .post("/api/v1/instructor/courses")
            .authorization_bearer(&instructor.access_token)
            .json(&json!({
                "title": "Rust for Services",
                "description": "Building HTTP services with axum and sqlx",
                "duration_in_hours": 12,
                "category_id": category_id,
            }))
            .await
            .json();
        let course_id = course["data"]["id"].as_i64().expect("course id");

        let section: Value = self
            .server
            .post(&format!("/api/v1/instructor/courses/{}/sections", course_id))
            .authorization_bearer(&instructor.access_token)
            .json(&json!({ "title": "Getting started" }))
            .await
            .json();
        let section_id = section["data"]["id"].as_i64().expect("section id");

        let lesson: Value = self
            .server
            .post(&format!("/api/v1/instructor/sections/{}/lessons", section_id))
            .authorization_bearer(&instructor.access_token)
            .json(&json!({
                "title": "Hello, axum",
                "content_type": "Article",
                "duration_in_minutes": 10,
            }))
            .await
            .json();
        let lesson_id = lesson["data"]["id"].as_i64().expect("lesson id");

        (course_id, lesson_id)
    }

    /// Create and publish a course with the given title and price
    pub async fn create_published_course(
        &self,
        instructor: &TestUser,
        category_id: i64,
        title: &str,
        price: Option<f64>,
    ) -> i64 {
        let (course_id, _) = self.create_course_with_lesson(instructor, category_id).await;
        self.server
            .put(&format!("/api/v1/instructor/courses/{}", course_id))
            .authorization_bearer(&instructor.access_token)
            .json(&json!({
                "title": title,
                "description": "Building HTTP services with axum and sqlx",
                "duration_in_hours": 12,
                "category_id": category_id,
                "price": price,
            }))
            .await
            .assert_status_ok();
        self.server
            .post(&format!("/api/v1/instructor/courses/{}/publish", course_id))
            .authorization_bearer(&instructor.access_token)
            .await
            .assert_status_ok();
        course_id
    }
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}

pub fn unique_username() -> String {
    format!("user_{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn test_settings(database_url: String, redis_url: String, root_dir: String) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: database_url,
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: 5,
            run_migrations: true,
        },
        redis: RedisSettings {
            url: redis_url,
            cache_ttl_seconds: 1,
        },
        jwt: JwtSettings {
            secret: "integration-test-secret-0123456789abcdef".into(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        // Every request in the suite shares one client identifier
        rate_limit: RateLimitSettings {
            auth_requests_per_window: 10_000,
            api_requests_per_window: 10_000,
            window_seconds: 60,
            burst_size: 0,
        },
        cors: CorsSettings {
            allowed_origins: vec!["http://localhost:3000".into()],
        },
        storage: StorageSettings {
            root_dir,
            max_upload_mb: 5,
        },
        seed: SeedSettings {
            enabled: false,
            directory: "seeds".into(),
            default_password: TEST_PASSWORD.into(),
        },
        environment: "test".into(),
    }
}
