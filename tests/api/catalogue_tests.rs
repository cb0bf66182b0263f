//! Catalogue Endpoint Tests
//!
//! Categories, course authoring and the public course listings.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;

#[tokio::test]
async fn test_admin_creates_category_visible_publicly() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let category_id = app.create_category(&admin).await;

    let response = app
        .server
        .get(&format!("/api/v1/categories/{}", category_id))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["id"], category_id);
}

#[tokio::test]
async fn test_duplicate_category_name_conflicts() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let name = format!("Data {}", uuid::Uuid::new_v4().simple());

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        app.server
            .post("/api/v1/admin/categories")
            .authorization_bearer(&admin.access_token)
            .json(&json!({ "name": name }))
            .await
            .assert_status(expected);
    }
}

#[tokio::test]
async fn test_student_cannot_create_course() {
    let Some(app) = TestApp::spawn().await else { return };
    let student = app.register_user().await;

    let response = app
        .server
        .post("/api/v1/instructor/courses")
        .authorization_bearer(&student.access_token)
        .json(&json!({
            "title": "Sneaky",
            "description": "Not allowed",
            "duration_in_hours": 1,
            "category_id": 1,
        }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unpublished_course_hidden_until_published() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    let (course_id, _) = app.create_course_with_lesson(&instructor, category_id).await;
    let path = format!("/api/v1/courses/{}", course_id);

    app.server.get(&path).await.assert_status(StatusCode::NOT_FOUND);

    app.server
        .post(&format!("/api/v1/instructor/courses/{}/publish", course_id))
        .authorization_bearer(&instructor.access_token)
        .await
        .assert_status_ok();

    let response = app.server.get(&path).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["is_published"], true);
    assert_eq!(body["data"]["total_lessons"], 1);
    assert_eq!(body["data"]["sections"][0]["lessons"][0]["title"], "Hello, axum");

    let listing: Value = app
        .server
        .get("/api/v1/courses")
        .add_query_param("category_id", category_id)
        .await
        .json();
    assert_eq!(listing["data"]["total_count"], 1);
    assert_eq!(listing["data"]["items"][0]["id"], course_id);
}

#[tokio::test]
async fn test_empty_course_cannot_be_published() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;

    let course: Value = app
        .server
        .post("/api/v1/instructor/courses")
        .authorization_bearer(&instructor.access_token)
        .json(&json!({
            "title": "Empty",
            "description": "No content yet",
            "duration_in_hours": 1,
            "category_id": category_id,
        }))
        .await
        .json();
    let course_id = course["data"]["id"].as_i64().expect("course id");

    app.server
        .post(&format!("/api/v1/instructor/courses/{}/publish", course_id))
        .authorization_bearer(&instructor.access_token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_instructor_cannot_edit_course() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let owner = app.register_with_role("Instructor").await;
    let other = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    let (course_id, _) = app.create_course_with_lesson(&owner, category_id).await;

    app.server
        .delete(&format!("/api/v1/instructor/courses/{}", course_id))
        .authorization_bearer(&other.access_token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_thumbnail_upload_served_from_uploads() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    let (course_id, _) = app.create_course_with_lesson(&instructor, category_id).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec())
            .file_name("cover.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post(&format!("/api/v1/instructor/courses/{}/thumbnail", course_id))
        .authorization_bearer(&instructor.access_token)
        .multipart(form)
        .await;

    response.assert_status_ok();
    let path = response.json::<Value>()["data"]["thumbnail_path"]
        .as_str()
        .expect("thumbnail path")
        .to_string();
    assert!(path.starts_with("uploads/thumbnails/"));
    assert!(path.ends_with("_cover.png"));

    app.server.get(&format!("/{}", path)).await.assert_status_ok();
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let Some(app) = TestApp::spawn().await else { return };
    let student = app.register_user().await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"#!/bin/sh".to_vec()).file_name("avatar.sh"),
    );
    let response = app
        .server
        .post("/api/v1/me/profile-picture")
        .authorization_bearer(&student.access_token)
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_at_size_limit_accepted() {
    let Some(app) = TestApp::spawn().await else { return };
    let student = app.register_user().await;

    // Exactly the 5 MiB image cap; multipart framing pushes the body past it
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 5 * 1024 * 1024])
            .file_name("avatar.png")
            .mime_type("image/png"),
    );
    let response = app
        .server
        .post("/api/v1/me/profile-picture")
        .authorization_bearer(&student.access_token)
        .multipart(form)
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_search_matches_underscore_literally() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    app.create_published_course(&instructor, category_id, "Rust Basics", None)
        .await;
    let snake = app
        .create_published_course(&instructor, category_id, "snake_case naming", None)
        .await;

    let listing: Value = app
        .server
        .get("/api/v1/courses")
        .add_query_param("category_id", category_id)
        .add_query_param("search", "_")
        .await
        .json();

    assert_eq!(listing["data"]["total_count"], 1);
    assert_eq!(listing["data"]["items"][0]["id"], snake);
}

#[tokio::test]
async fn test_price_sort_treats_free_courses_as_zero() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let instructor = app.register_with_role("Instructor").await;
    let category_id = app.create_category(&admin).await;
    let free = app
        .create_published_course(&instructor, category_id, "Free intro", None)
        .await;
    let cheap = app
        .create_published_course(&instructor, category_id, "Cheap course", Some(10.0))
        .await;
    let premium = app
        .create_published_course(&instructor, category_id, "Premium course", Some(99.0))
        .await;

    let ids = |listing: Value| -> Vec<i64> {
        listing["data"]["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|item| item["id"].as_i64().expect("id"))
            .collect()
    };

    for (order, expected) in [
        ("asc", vec![free, cheap, premium]),
        ("desc", vec![premium, cheap, free]),
    ] {
        let listing: Value = app
            .server
            .get("/api/v1/courses")
            .add_query_param("category_id", category_id)
            .add_query_param("sort_by", "price")
            .add_query_param("sort_order", order)
            .await
            .json();
        assert_eq!(ids(listing), expected, "sort_order={}", order);
    }
}
