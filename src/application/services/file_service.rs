//! File Service
//!
//! Validation and storage of uploaded files (thumbnails, profile pictures,
//! category icons and lesson media).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::dto::response::FileUploadDto;
use crate::infrastructure::storage::FileStorage;
use crate::shared::error::AppError;

const MB: u64 = 1024 * 1024;

/// Size and extension limits applied to one kind of upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePolicy {
    pub max_bytes: u64,
    pub allowed_extensions: &'static [&'static str],
}

impl FilePolicy {
    /// Thumbnails, profile pictures and category icons
    pub const IMAGE: FilePolicy = FilePolicy {
        max_bytes: 5 * MB,
        allowed_extensions: &[".jpg", ".jpeg", ".png", ".gif", ".webp"],
    };

    pub const LESSON_MEDIA: FilePolicy = FilePolicy {
        max_bytes: 100 * MB,
        allowed_extensions: &[".mp4", ".avi", ".mov", ".pdf"],
    };

    pub fn max_mb(&self) -> u64 {
        self.max_bytes / MB
    }
}

/// Storage folders
pub mod folders {
    pub const THUMBNAILS: &str = "thumbnails";
    pub const LESSONS: &str = "lessons";
    pub const PROFILES: &str = "profiles";
    pub const CATEGORIES: &str = "categories";
}

#[async_trait]
pub trait FileService: Send + Sync {
    /// Validate and store a file, returning its relative path and URL
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        bytes: &[u8],
        policy: FilePolicy,
    ) -> Result<FileUploadDto, FileError>;

    /// Delete by relative path. An empty path is a no-op.
    async fn delete(&self, path: &str) -> Result<(), FileError>;

    /// Best-effort removal of a file that has been replaced
    async fn discard(&self, path: Option<String>);

    fn url_for(&self, path: &str) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("No file uploaded")]
    NoFile,

    #[error("File size exceeds maximum allowed size of {0}MB")]
    TooLarge(u64),

    #[error("File type not allowed. Allowed types: {0}")]
    TypeNotAllowed(String),

    #[error("File does not exist")]
    DoesNotExist,

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::DoesNotExist => AppError::NotFound(err.to_string()),
            FileError::NoFile | FileError::TooLarge(_) | FileError::TypeNotAllowed(_) => {
                AppError::BadRequest(err.to_string())
            }
            FileError::Storage(e) => e,
        }
    }
}

/// Check a file's size and extension against a policy.
pub fn validate(file_name: &str, size: u64, policy: FilePolicy) -> Result<(), FileError> {
    if size == 0 {
        return Err(FileError::NoFile);
    }
    if size > policy.max_bytes {
        return Err(FileError::TooLarge(policy.max_mb()));
    }

    let extension = file_name
        .rfind('.')
        .map(|i| file_name[i..].to_ascii_lowercase())
        .unwrap_or_default();

    if !policy.allowed_extensions.contains(&extension.as_str()) {
        return Err(FileError::TypeNotAllowed(policy.allowed_extensions.join(", ")));
    }
    Ok(())
}

pub struct FileServiceImpl<S: FileStorage> {
    storage: Arc<S>,
}

impl<S: FileStorage> FileServiceImpl<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl<S: FileStorage + 'static> FileService for FileServiceImpl<S> {
    async fn upload(
        &self,
        folder: &str,
        file_name: &str,
        bytes: &[u8],
        policy: FilePolicy,
    ) -> Result<FileUploadDto, FileError> {
        validate(file_name, bytes.len() as u64, policy)?;

        let path = self.storage.save(folder, file_name, bytes).await?;
        Ok(FileUploadDto {
            url: self.url_for(&path),
            path,
        })
    }

    async fn delete(&self, path: &str) -> Result<(), FileError> {
        if path.trim().is_empty() {
            debug!("No file to delete");
            return Ok(());
        }
        if !self.storage.remove(path).await? {
            return Err(FileError::DoesNotExist);
        }
        Ok(())
    }

    async fn discard(&self, path: Option<String>) {
        let Some(path) = path else { return };
        if let Err(e) = self.delete(&path).await {
            warn!(error = %e, %path, "Failed to remove replaced file");
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("/{}", path.trim_start_matches('/'))
    }
}
