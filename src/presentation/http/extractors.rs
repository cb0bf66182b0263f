//! Custom Extractors
//!
//! Axum extractors for validated JSON bodies and multipart uploads.

use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::shared::error::AppError;
use crate::shared::validation::validate;

/// JSON body that has passed `validator` checks.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        validate(&value)?;
        Ok(Self(value))
    }
}

/// First file part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl<S> FromRequest<S> for UploadedFile
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            // Plain form fields carry no file name
            let Some(file_name) = field.file_name().map(str::to_owned) else {
                continue;
            };
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            return Ok(Self { file_name, bytes });
        }

        Err(AppError::BadRequest("No file uploaded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request as HttpRequest, StatusCode},
        routing::post,
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    async fn echo(ValidatedJson(payload): ValidatedJson<Payload>) -> String {
        payload.name
    }

    async fn upload(file: UploadedFile) -> String {
        format!("{}:{}", file.file_name, file.bytes.len())
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", post(echo))
            .route("/upload", post(upload))
    }

    fn json(body: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/echo")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn multipart(body: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/upload")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body.replace('\n', "\r\n")))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_json_passes() {
        let response = app().oneshot(json(r#"{"name":"Rust"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Rust");
    }

    #[tokio::test]
    async fn test_invalid_json_fields_rejected() {
        let response = app().oneshot(json(r#"{"name":""}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("Name is required"));
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let response = app().oneshot(json("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_skips_plain_fields() {
        let body = "--XYZ
Content-Disposition: form-data; name=\"caption\"

hello
--XYZ
Content-Disposition: form-data; name=\"file\"; filename=\"cover.png\"
Content-Type: image/png

abcd
--XYZ--
";
        let response = app().oneshot(multipart(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "cover.png:4");
    }

    #[tokio::test]
    async fn test_upload_without_file_rejected() {
        let body = "--XYZ
Content-Disposition: form-data; name=\"caption\"

hello
--XYZ--
";
        let response = app().oneshot(multipart(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("No file uploaded"));
    }
}
