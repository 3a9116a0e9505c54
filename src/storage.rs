// storage.rs - uploaded file storage on the local filesystem

use std::path::{Component, Path, PathBuf};

use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("{path} is not inside {folder}/")]
    OutsideFolder { path: String, folder: String },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPath(path) => ApiError::bad_request(format!("Invalid storage path: {}", path)),
            StorageError::OutsideFolder { path, folder } => {
                ApiError::bad_request(format!("Stored file {} must be inside {}/", path, folder))
            }
            StorageError::NotFound(_) => ApiError::not_found("File not found"),
            StorageError::Io(e) => {
                tracing::error!("Storage I/O error: {}", e);
                ApiError::internal_server_error("Storage error occurred")
            }
        }
    }
}

/// Folder holding one user's files: their participant image and the images
/// of the events they organise.
pub fn user_folder(user_id: Uuid) -> String {
    format!("users/{}", user_id)
}

/// `path` names a file somewhere below `folder`.
pub fn is_within(path: &str, folder: &str) -> bool {
    FileStorage::is_safe_path(path)
        && path
            .strip_prefix(folder)
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|rest| !rest.is_empty())
}

/// Records may only reference files in their own folder.
pub fn check_within(path: &str, folder: &str) -> Result<(), StorageError> {
    if is_within(path, folder) {
        Ok(())
    } else {
        Err(StorageError::OutsideFolder {
            path: path.to_string(),
            folder: folder.to_string(),
        })
    }
}

/// The paths from `paths` that live in `folder`. Anything else is left alone
/// and logged, so a stray reference never removes another record's file.
pub fn owned_paths<I>(paths: I, folder: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    paths
        .into_iter()
        .filter(|path| {
            let owned = is_within(path, folder);
            if !owned {
                warn!("Keeping {}: not inside {}/", path, folder);
            }
            owned
        })
        .collect()
}

/// Files addressed by relative paths under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative, non-empty, and free of `..` or root components.
    pub fn is_safe_path(path: &str) -> bool {
        !path.trim().is_empty()
            && !path.contains('\\')
            && Path::new(path)
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        if !Self::is_safe_path(path) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(path))
    }

    pub async fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        info!("Stored {} ({} bytes)", path, bytes.len());
        Ok(())
    }

    pub async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every path, logging failures instead of returning them.
    pub async fn delete_best_effort(&self, paths: &[String]) {
        let results = join_all(paths.iter().map(|p| async move { (p, self.delete(p).await) })).await;
        for (path, result) in results {
            if let Err(e) = result {
                warn!("Failed to delete stored file {}: {}", path, e);
            }
        }
    }

    pub fn content_type(path: &str) -> &'static str {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("svg") => "image/svg+xml",
            Some("pdf") => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> FileStorage {
        FileStorage::new(std::env::temp_dir().join(format!("glue-storage-{}", Uuid::new_v4())))
    }

    #[test]
    fn rejects_escaping_paths() {
        assert!(FileStorage::is_safe_path("press/cover.png"));
        assert!(!FileStorage::is_safe_path("../etc/passwd"));
        assert!(!FileStorage::is_safe_path("/etc/passwd"));
        assert!(!FileStorage::is_safe_path("press/../../x"));
        assert!(!FileStorage::is_safe_path(""));
    }

    #[test]
    fn folder_membership() {
        let id = Uuid::new_v4();
        let folder = user_folder(id);
        assert!(is_within(&format!("users/{}/photo.png", id), &folder));
        assert!(is_within("press/2024/a.png", "press"));
        assert!(!is_within("press/a.png", &folder));
        assert!(!is_within(&format!("users/{}", id), &folder));
        assert!(!is_within(&format!("users/{}x/a.png", id), &folder));
        assert!(!is_within(&format!("users/{}/../other/a.png", id), &folder));
        assert!(matches!(check_within("press/a.png", "sponsors"), Err(StorageError::OutsideFolder { .. })));

        let kept = owned_paths(vec!["press/a.png".to_string(), "press/b.png".to_string(), "sponsors/c.png".to_string()], "press");
        assert_eq!(kept, ["press/a.png", "press/b.png"]);
    }

    #[tokio::test]
    async fn put_get_delete() {
        let storage = scratch();
        storage.put("events/a.png", b"png").await.unwrap();
        assert_eq!(storage.get("events/a.png").await.unwrap(), b"png");

        storage.delete("events/a.png").await.unwrap();
        assert!(matches!(storage.get("events/a.png").await, Err(StorageError::NotFound(_))));

        // Missing files are logged, not surfaced
        storage.delete_best_effort(&["events/a.png".to_string()]).await;
        let _ = tokio::fs::remove_dir_all(storage.root()).await;
    }
}
