//! Authentication Endpoint Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{unique_email, unique_username, TestApp, TEST_PASSWORD};

#[tokio::test]
async fn test_register_success() {
    let Some(app) = TestApp::spawn().await else { return };
    let email = unique_email();

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": unique_username(),
            "email": email,
            "password": TEST_PASSWORD,
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["is_success"], true);
    assert_eq!(body["message"], "Registration successful");
    assert_eq!(body["data"]["user"]["email"], email.as_str());
    assert_eq!(body["data"]["user"]["full_name"], "Ada Lovelace");
    assert_eq!(body["data"]["user"]["roles"], json!(["Student"]));
    assert_eq!(body["data"]["token_type"], "Bearer");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let Some(app) = TestApp::spawn().await else { return };
    let existing = app.register_user().await;

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": unique_username(),
            "email": existing.email,
            "password": TEST_PASSWORD,
            "first_name": "Grace",
            "last_name": "Hopper",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["is_success"], false);
}

#[tokio::test]
async fn test_register_invalid_email() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app
        .server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": unique_username(),
            "email": "not-an-email",
            "password": TEST_PASSWORD,
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], 10007);
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn test_login_wrong_password() {
    let Some(app) = TestApp::spawn().await else { return };
    let user = app.register_user().await;

    let response = app
        .server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": user.email, "password": "wrong-password" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_token() {
    let Some(app) = TestApp::spawn().await else { return };

    let response = app.server.get("/api/v1/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["message"], "Missing authorization header");
}

#[tokio::test]
async fn test_me_returns_profile() {
    let Some(app) = TestApp::spawn().await else { return };
    let user = app.register_user().await;

    let response = app
        .server
        .get("/api/v1/me")
        .authorization_bearer(&user.access_token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], user.id.to_string());
    assert!(body["data"]["skills"].is_array());
}

#[tokio::test]
async fn test_refresh_rotates_token() {
    let Some(app) = TestApp::spawn().await else { return };
    let user = app.register_user().await;

    let response = app
        .server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": user.refresh_token }))
        .await;
    response.assert_status_ok();
    let rotated = response.json::<Value>()["data"]["refresh_token"].clone();
    assert_ne!(rotated, json!(user.refresh_token));

    // The consumed token cannot be replayed
    let replay = app
        .server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": user.refresh_token }))
        .await;
    replay.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let Some(app) = TestApp::spawn().await else { return };
    let user = app.register_user().await;

    app.server
        .post("/api/v1/auth/logout")
        .json(&json!({ "refresh_token": user.refresh_token }))
        .await
        .assert_status_ok();

    let response = app
        .server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": user.refresh_token }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_email_availability() {
    let Some(app) = TestApp::spawn().await else { return };
    let user = app.register_user().await;

    let taken: Value = app
        .server
        .get("/api/v1/auth/email-available")
        .add_query_param("email", &user.email)
        .await
        .json();
    assert_eq!(taken["data"]["available"], false);

    let free: Value = app
        .server
        .get("/api/v1/auth/email-available")
        .add_query_param("email", unique_email())
        .await
        .json();
    assert_eq!(free["data"]["available"], true);
}

#[tokio::test]
async fn test_student_cannot_reach_admin_area() {
    let Some(app) = TestApp::spawn().await else { return };
    let user = app.register_user().await;

    let response = app
        .server
        .get("/api/v1/admin/users")
        .authorization_bearer(&user.access_token)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_change_ends_existing_sessions() {
    let Some(app) = TestApp::spawn().await else { return };
    let admin = app.register_with_role("Admin").await;
    let user = app.register_user().await;

    app.server
        .put(&format!("/api/v1/admin/users/{}/roles", user.id))
        .authorization_bearer(&admin.access_token)
        .json(&json!({ "roles": ["Instructor"] }))
        .await
        .assert_status_ok();

    app.server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refresh_token": user.refresh_token }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let relogged = app.login(&user).await;
    let me: Value = app
        .server
        .get("/api/v1/me")
        .authorization_bearer(&relogged.access_token)
        .await
        .json();
    assert_eq!(me["data"]["roles"], json!(["Instructor"]));
}
