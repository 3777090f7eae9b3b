//! # H5P Hub Core
//!
//! Core types and utilities shared across the H5P hub workspace:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`password`]: Password hashing and verification
//! - [`archive`]: ZIP extraction with manifest detection and path containment
//! - [`file_storage`]: Storage abstraction for uploaded image assets
//!
//! # Example
//!
//! ```ignore
//! use h5p_hub_core::archive::extract_archive;
//! use std::io::Cursor;
//!
//! let extracted = extract_archive(Cursor::new(bytes), &destination)?;
//! if !extracted.manifest_found() {
//!     return Err(AppError::bad_request(anyhow::anyhow!("content.json not found")));
//! }
//! ```

pub mod archive;
pub mod errors;
pub mod file_storage;
pub mod password;

pub use archive::{ArchiveError, ExtractedArchive, MANIFEST_FILE_NAME, extract_archive};
pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use password::{hash_password, verify_password};
