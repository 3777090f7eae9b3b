//! File storage abstraction for uploaded assets.
//!
//! Uploaded preview images go through [`FileStorage`] so the upload pipeline
//! does not depend on where bytes end up. [`LocalFileStorage`] writes into a
//! flat directory that the router serves under a public URL prefix.
//!
//! # Example
//!
//! ```ignore
//! use h5p_hub_core::file_storage::{FileStorage, LocalFileStorage};
//! use std::path::PathBuf;
//!
//! let storage = LocalFileStorage::new(PathBuf::from("./uploads/images"), "/images");
//!
//! let key = storage.save("0b7d..._cover.png", &bytes).await?;
//! let url = storage.public_url(&key)?; // "/images/0b7d..._cover.png"
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::fs;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Abstract trait for file storage backends.
pub trait FileStorage: Send + Sync {
    /// Save file content under `key` and return the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Public URL path for a stored key.
    fn public_url(&self, key: &str) -> Result<String, StorageError>;
}

#[derive(Debug)]
pub enum StorageError {
    /// File exceeds maximum allowed size.
    InvalidFileSize { max_bytes: usize },

    /// I/O error (file system or similar).
    IoError(std::io::Error),

    /// Invalid storage key format.
    InvalidKey(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} bytes", max_bytes)
            }
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Local filesystem storage with a flat key space.
#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    /// URL prefix the router serves `base_dir` under (e.g. "/images")
    public_prefix: String,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, public_prefix: impl Into<String>) -> Self {
        Self::with_max_size(base_dir, public_prefix, 20 * 1024 * 1024)
    }

    pub fn with_max_size(
        base_dir: PathBuf,
        public_prefix: impl Into<String>,
        max_file_size: usize,
    ) -> Self {
        Self {
            base_dir,
            public_prefix: public_prefix.into(),
            max_file_size,
        }
    }

    /// Keys are single file names: no separators, no `.`/`..`, restricted charset.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key == "." || key == ".." {
            return Err(StorageError::InvalidKey(
                "Key must be a non-empty file name".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            fs::create_dir_all(&self.base_dir).await?;
            fs::write(self.base_dir.join(key), content).await?;

            Ok(key.to_string())
        })
    }

    fn public_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;

        Ok(format!("{}/{}", self.public_prefix.trim_end_matches('/'), key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_file_names() {
        assert!(LocalFileStorage::validate_key("cover.png").is_ok());
        assert!(LocalFileStorage::validate_key("0b7d-11ee_cover.final.jpg").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_paths() {
        assert!(LocalFileStorage::validate_key("../../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("..\\windows").is_err());
        assert!(LocalFileStorage::validate_key("..").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
    }

    #[test]
    fn test_public_url_handles_trailing_slash() {
        let storage = LocalFileStorage::new(PathBuf::from("./uploads"), "/images/");

        let url = storage.public_url("cover.png").unwrap();
        assert_eq!(url, "/images/cover.png");
    }

    #[tokio::test]
    async fn test_save_writes_into_base_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(tmp.path().join("images"), "/images");

        let key = storage.save("cover.png", b"png").await.unwrap();

        assert_eq!(key, "cover.png");
        assert_eq!(std::fs::read(tmp.path().join("images/cover.png")).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_content() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::with_max_size(tmp.path().to_path_buf(), "/images", 2);

        let err = storage.save("cover.png", b"png").await.unwrap_err();

        assert!(matches!(err, StorageError::InvalidFileSize { max_bytes: 2 }));
    }
}
