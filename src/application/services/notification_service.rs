//! Notification Service

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::dto::response::NotificationDto;
use crate::domain::NotificationRepository;
use crate::shared::error::AppError;

/// Maximum notifications returned by a list call.
pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Latest notifications, newest first
    async fn list(&self, user_id: Uuid) -> Result<Vec<NotificationDto>, NotificationError>;

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotificationError>;

    async fn mark_as_read(&self, user_id: Uuid, id: i64) -> Result<(), NotificationError>;

    /// Returns the number of notifications changed
    async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, NotificationError>;

    async fn notify(
        &self,
        user_id: Uuid,
        message: &str,
        link: Option<String>,
    ) -> Result<NotificationDto, NotificationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::NotFound => AppError::NotFound(err.to_string()),
            NotificationError::Repository(e) => e,
        }
    }
}

pub struct NotificationServiceImpl<N: NotificationRepository> {
    notification_repo: Arc<N>,
}

impl<N: NotificationRepository> NotificationServiceImpl<N> {
    pub fn new(notification_repo: Arc<N>) -> Self {
        Self { notification_repo }
    }
}

#[async_trait]
impl<N: NotificationRepository + 'static> NotificationService for NotificationServiceImpl<N> {
    async fn list(&self, user_id: Uuid) -> Result<Vec<NotificationDto>, NotificationError> {
        let notifications = self
            .notification_repo
            .find_by_user(user_id, NOTIFICATION_LIST_LIMIT)
            .await?;
        Ok(notifications.into_iter().map(NotificationDto::from).collect())
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotificationError> {
        Ok(self.notification_repo.unread_count(user_id).await?)
    }

    async fn mark_as_read(&self, user_id: Uuid, id: i64) -> Result<(), NotificationError> {
        // Another user's notification reads as missing.
        if !self.notification_repo.mark_read(id, user_id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        Ok(self.notification_repo.mark_all_read(user_id).await?)
    }

    async fn notify(
        &self,
        user_id: Uuid,
        message: &str,
        link: Option<String>,
    ) -> Result<NotificationDto, NotificationError> {
        let notification = self.notification_repo.create(user_id, message, link).await?;
        Ok(NotificationDto::from(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockNotificationRepository, Notification};
    use chrono::Utc;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_mark_as_read_foreign_notification() {
        let user = Uuid::now_v7();
        let mut repo = MockNotificationRepository::new();
        repo.expect_mark_read()
            .with(eq(7), eq(user))
            .returning(|_, _| Ok(false));

        let result = NotificationServiceImpl::new(Arc::new(repo))
            .mark_as_read(user, 7)
            .await;
        assert!(matches!(result, Err(NotificationError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_uses_limit() {
        let user = Uuid::now_v7();
        let mut repo = MockNotificationRepository::new();
        repo.expect_find_by_user()
            .with(eq(user), eq(NOTIFICATION_LIST_LIMIT))
            .returning(|user_id, _| {
                Ok(vec![Notification {
                    id: 1,
                    user_id,
                    message: "You enrolled in SQL Fundamentals".into(),
                    link: Some("/courses/2".into()),
                    is_read: false,
                    created_on: Utc::now(),
                }])
            });

        let list = NotificationServiceImpl::new(Arc::new(repo))
            .list(user)
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert!(!list[0].is_read);
    }
}
