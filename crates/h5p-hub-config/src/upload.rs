//! Upload storage configuration.
//!
//! Extracted packages and preview images live in two subdirectories of a
//! common base directory. Both are created at startup if absent.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Upload configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `UPLOAD_DIR`: Base directory (default: `uploads`)
/// - `UPLOAD_H5P_SUBDIR`: Extracted packages, relative to the base (default: `h5p`)
/// - `UPLOAD_IMAGES_SUBDIR`: Preview images, relative to the base (default: `images`)
/// - `UPLOAD_MAX_BYTES`: Request body limit for the upload endpoint (default: 100 MiB)
/// - `UPLOAD_MAX_IMAGE_BYTES`: Largest accepted preview image (default: 20 MiB)
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub base_dir: PathBuf,
    pub h5p_subdir: String,
    pub images_subdir: String,
    pub max_upload_bytes: usize,
    pub max_image_bytes: usize,
}

impl UploadConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            h5p_subdir: "h5p".to_string(),
            images_subdir: "images".to_string(),
            max_upload_bytes: 100 * 1024 * 1024,
            max_image_bytes: 20 * 1024 * 1024,
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::new(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));

        Self {
            h5p_subdir: env::var("UPLOAD_H5P_SUBDIR").unwrap_or(defaults.h5p_subdir.clone()),
            images_subdir: env::var("UPLOAD_IMAGES_SUBDIR")
                .unwrap_or(defaults.images_subdir.clone()),
            max_upload_bytes: env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            max_image_bytes: env::var("UPLOAD_MAX_IMAGE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_image_bytes),
            ..defaults
        }
    }

    /// Directory holding one extracted package per upload identifier.
    pub fn h5p_dir(&self) -> PathBuf {
        self.base_dir.join(&self.h5p_subdir)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.base_dir.join(&self.images_subdir)
    }

    /// Extraction target for a single upload.
    pub fn content_dir(&self, upload_id: &str) -> PathBuf {
        self.h5p_dir().join(upload_id)
    }

    pub fn ensure_directories(&self) -> io::Result<()> {
        for dir in [self.h5p_dir(), self.images_dir()] {
            create_if_missing(&dir)?;
        }
        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new("uploads")
    }
}

fn create_if_missing(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
