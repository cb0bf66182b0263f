//! Uniform success envelope returned by every JSON endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success wrapper: `{ is_success, data, message, errors }`.
///
/// Failures never go through this type; they are rendered by
/// [`AppError`](super::error::AppError) with the same field names.
#[derive(Debug, Serialize)]
pub struct ServiceResult<T: Serialize> {
    pub is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub errors: Vec<String>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ServiceResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            is_success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
            status: StatusCode::OK,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    /// 201 response for newly created resources.
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::success_with_message(data, message)
        }
    }
}

impl ServiceResult<()> {
    /// Success without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            is_success: true,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
            status: StatusCode::OK,
        }
    }
}

impl<T: Serialize> IntoResponse for ServiceResult<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_success_envelope() {
        let response = ServiceResult::success_with_message(vec![1, 2], "Loaded").into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["is_success"], true);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert_eq!(body["message"], "Loaded");
        assert_eq!(body["errors"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_created_status() {
        let response = ServiceResult::created("x", "Created").into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_message_only_omits_data() {
        let response = ServiceResult::message("No file to delete").into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body.get("data").is_none());
        assert_eq!(body["message"], "No file to delete");
    }
}
