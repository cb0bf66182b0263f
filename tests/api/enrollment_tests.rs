//! Enrollment, Progress and Review Flow Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{TestApp, TestUser};

/// Published course with one lesson, plus its instructor
async fn published_course(app: &TestApp) -> (TestUser, i64, i64) {
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    let (course_id, lesson_id) = app.create_course_with_lesson(&instructor, category_id).await;

    app.server
        .post(&format!("/api/v1/instructor/courses/{}/publish", course_id))
        .authorization_bearer(&instructor.access_token)
        .await
        .assert_status_ok();

    (instructor, course_id, lesson_id)
}

async fn enroll(app: &TestApp, student: &TestUser, course_id: i64) -> i64 {
    let response = app
        .server
        .post("/api/v1/enrollments")
        .authorization_bearer(&student.access_token)
        .json(&json!({ "course_id": course_id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().expect("enrollment id")
}

#[tokio::test]
async fn test_enroll_twice_conflicts() {
    let Some(app) = TestApp::spawn().await else { return };
    let (_, course_id, _) = published_course(&app).await;
    let student = app.register_user().await;

    enroll(&app, &student, course_id).await;

    app.server
        .post("/api/v1/enrollments")
        .authorization_bearer(&student.access_token)
        .json(&json!({ "course_id": course_id }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let check: Value = app
        .server
        .get(&format!("/api/v1/enrollments/check/{}", course_id))
        .authorization_bearer(&student.access_token)
        .await
        .json();
    assert_eq!(check["data"], true);
}

#[tokio::test]
async fn test_enroll_in_draft_course_rejected() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    let (course_id, _) = app.create_course_with_lesson(&instructor, category_id).await;
    let student = app.register_user().await;

    app.server
        .post("/api/v1/enrollments")
        .authorization_bearer(&student.access_token)
        .json(&json!({ "course_id": course_id }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_completing_last_lesson_completes_course() {
    let Some(app) = TestApp::spawn().await else { return };
    let (instructor, course_id, lesson_id) = published_course(&app).await;
    let student = app.register_user().await;
    let enrollment_id = enroll(&app, &student, course_id).await;

    let response = app
        .server
        .put(&format!(
            "/api/v1/enrollments/{}/lessons/{}/progress",
            enrollment_id, lesson_id
        ))
        .authorization_bearer(&student.access_token)
        .json(&json!({ "is_completed": true, "watched_seconds": 600 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["course_completed_now"], true);
    assert_eq!(body["data"]["enrollment"]["is_completed"], true);
    assert_eq!(body["data"]["enrollment"]["progress_percent"], 100.0);

    let progress: Value = app
        .server
        .get(&format!("/api/v1/enrollments/{}/progress", enrollment_id))
        .authorization_bearer(&student.access_token)
        .await
        .json();
    assert_eq!(progress["data"]["completed_lessons"], 1);

    // The instructor sees the enrollment on their course
    let roster: Value = app
        .server
        .get(&format!("/api/v1/instructor/courses/{}/enrollments", course_id))
        .authorization_bearer(&instructor.access_token)
        .await
        .json();
    assert_eq!(roster["data"][0]["user_id"], student.id.to_string());
}

#[tokio::test]
async fn test_other_student_cannot_touch_enrollment() {
    let Some(app) = TestApp::spawn().await else { return };
    let (_, course_id, lesson_id) = published_course(&app).await;
    let owner = app.register_user().await;
    let intruder = app.register_user().await;
    let enrollment_id = enroll(&app, &owner, course_id).await;

    app.server
        .post(&format!(
            "/api/v1/enrollments/{}/lessons/{}/complete",
            enrollment_id, lesson_id
        ))
        .authorization_bearer(&intruder.access_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_progress_on_deleted_lesson_writes_nothing() {
    let Some(app) = TestApp::spawn().await else { return };
    let (instructor, course_id, lesson_id) = published_course(&app).await;
    let student = app.register_user().await;
    let enrollment_id = enroll(&app, &student, course_id).await;

    app.server
        .delete(&format!("/api/v1/instructor/lessons/{}", lesson_id))
        .authorization_bearer(&instructor.access_token)
        .await
        .assert_status_ok();

    app.server
        .post(&format!(
            "/api/v1/enrollments/{}/lessons/{}/complete",
            enrollment_id, lesson_id
        ))
        .authorization_bearer(&student.access_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM lesson_progress WHERE enrollment_id = $1")
            .bind(enrollment_id)
            .fetch_one(&app.db)
            .await
            .expect("count progress rows");
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn test_review_requires_enrollment() {
    let Some(app) = TestApp::spawn().await else { return };
    let (_, course_id, _) = published_course(&app).await;
    let student = app.register_user().await;
    let review = json!({ "course_id": course_id, "rating": 5, "comment": "Great pacing" });

    app.server
        .post("/api/v1/reviews")
        .authorization_bearer(&student.access_token)
        .json(&review)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    enroll(&app, &student, course_id).await;

    app.server
        .post("/api/v1/reviews")
        .authorization_bearer(&student.access_token)
        .json(&review)
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .post("/api/v1/reviews")
        .authorization_bearer(&student.access_token)
        .json(&review)
        .await
        .assert_status(StatusCode::CONFLICT);

    let reviews: Value = app
        .server
        .get(&format!("/api/v1/courses/{}/reviews", course_id))
        .await
        .json();
    assert_eq!(reviews["data"][0]["rating"], 5);

    let rating: Value = app
        .server
        .get(&format!("/api/v1/courses/{}/rating", course_id))
        .authorization_bearer(&student.access_token)
        .await
        .json();
    assert_eq!(rating["data"]["average_rating"], 5.0);
    assert_eq!(rating["data"]["has_reviewed"], true);

    let anonymous: Value = app
        .server
        .get(&format!("/api/v1/courses/{}/rating", course_id))
        .await
        .json();
    assert!(anonymous["data"].get("has_reviewed").is_none());
}

#[tokio::test]
async fn test_enrollment_notifies_student() {
    let Some(app) = TestApp::spawn().await else { return };
    let (_, course_id, _) = published_course(&app).await;
    let student = app.register_user().await;
    enroll(&app, &student, course_id).await;

    let unread: Value = app
        .server
        .get("/api/v1/notifications/unread-count")
        .authorization_bearer(&student.access_token)
        .await
        .json();
    assert!(unread["data"]["unread"].as_i64().unwrap_or_default() >= 1);

    app.server
        .post("/api/v1/notifications/read-all")
        .authorization_bearer(&student.access_token)
        .await
        .assert_status_ok();

    let unread: Value = app
        .server
        .get("/api/v1/notifications/unread-count")
        .authorization_bearer(&student.access_token)
        .await
        .json();
    assert_eq!(unread["data"]["unread"], 0);
}

#[tokio::test]
async fn test_student_dashboard_counts_enrollments() {
    let Some(app) = TestApp::spawn().await else { return };
    let (_, course_id, _) = published_course(&app).await;
    let student = app.register_user().await;
    enroll(&app, &student, course_id).await;

    let response = app
        .server
        .get("/api/v1/dashboard")
        .authorization_bearer(&student.access_token)
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["enrolled_courses"], 1);
}
