//! Notification entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Per-user message. Maps to the `notifications` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: Uuid,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_on: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        message: &str,
        link: Option<String>,
    ) -> Result<Notification, AppError>;

    /// Newest first.
    async fn find_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, AppError>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError>;

    /// Mark one notification read if it belongs to the user.
    async fn mark_read(&self, id: i64, user_id: Uuid) -> Result<bool, AppError>;

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError>;
}
