//! Local File Storage
//!
//! Uploaded files live under `<root>/uploads/<folder>/<uuid>_<name>` and are
//! addressed everywhere else by the relative path `uploads/<folder>/<uuid>_<name>`,
//! which is also the URL path they are served from.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Top-level directory under the storage root.
pub const UPLOADS_DIR: &str = "uploads";

/// Byte storage behind the file service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `bytes` into `folder` and return the relative path.
    async fn save(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<String, AppError>;

    /// Remove a file by relative path. `Ok(false)` when it does not exist.
    async fn remove(&self, relative_path: &str) -> Result<bool, AppError>;
}

/// Filesystem implementation rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory served under `/uploads`.
    pub fn uploads_root(&self) -> PathBuf {
        self.root.join(UPLOADS_DIR)
    }

    /// Resolve a relative `uploads/...` path, rejecting anything that could
    /// escape the storage root.
    fn resolve(&self, relative_path: &str) -> Option<PathBuf> {
        let relative = Path::new(relative_path.trim_start_matches('/'));
        let mut components = relative.components();

        match components.next() {
            Some(Component::Normal(first)) if first == UPLOADS_DIR => {}
            _ => return None,
        }
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }

        Some(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn save(&self, folder: &str, file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        if !is_valid_folder(folder) {
            return Err(AppError::BadRequest(format!("Invalid upload folder: {}", folder)));
        }

        let dir = self.uploads_root().join(folder);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;

        let stored_name = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(file_name));
        fs::write(dir.join(&stored_name), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write upload: {}", e)))?;

        let relative = format!("{}/{}/{}", UPLOADS_DIR, folder, stored_name);
        info!(path = %relative, "File stored");
        Ok(relative)
    }

    #[instrument(skip(self))]
    async fn remove(&self, relative_path: &str) -> Result<bool, AppError> {
        let Some(full_path) = self.resolve(relative_path) else {
            debug!("Rejected path outside the uploads directory");
            return Ok(false);
        };

        match fs::remove_file(&full_path).await {
            Ok(()) => {
                info!(path = %relative_path, "File deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Internal(format!("Failed to delete file: {}", e))),
        }
    }
}

/// Folder names are restricted to `[a-z0-9_-]`.
pub fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

/// Keep the final path segment and replace anything outside `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("thumbnails" => true)]
    #[test_case("lesson-media_2" => true)]
    #[test_case("" => false)]
    #[test_case("../etc" => false)]
    #[test_case("Profiles" => false)]
    fn test_folder_rules(folder: &str) -> bool {
        is_valid_folder(folder)
    }

    #[test_case("intro.mp4" => "intro.mp4")]
    #[test_case("../../etc/passwd" => "passwd")]
    #[test_case("C:\\temp\\my photo.png" => "my_photo.png")]
    #[test_case(".." => "file")]
    #[test_case(".hidden.png" => "hidden.png")]
    fn test_sanitize_file_name(name: &str) -> String {
        sanitize_file_name(name)
    }

    #[tokio::test]
    async fn test_save_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let path = storage.save("thumbnails", "cover.png", b"png").await.unwrap();
        assert!(path.starts_with("uploads/thumbnails/"));
        assert!(path.ends_with("_cover.png"));
        assert!(dir.path().join(&path).exists());

        assert!(storage.remove(&path).await.unwrap());
        assert!(!storage.remove(&path).await.unwrap());
    }

    #[test]
    fn test_remove_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        tokio_test::block_on(async {
            assert!(!tokio_test::assert_ok!(storage.remove("uploads/../Cargo.toml").await));
            assert!(!tokio_test::assert_ok!(storage.remove("/etc/passwd").await));
        });
    }

    #[tokio::test]
    async fn test_save_rejects_bad_folder() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let result = storage.save("../outside", "a.png", b"x").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
