//! H5P package upload.
//!
//! One multipart request becomes one content: the preview image is stored,
//! the package is extracted into its own directory, the content row is
//! committed and then linked. Files written before a failure stay on disk.
//! A link failure leaves the committed row without links.
//!
//! Failures are answered in plain text rather than the JSON error body used
//! elsewhere.

use std::io::Cursor;
use std::path::{Component, Path};

use axum::{
    body::Bytes,
    extract::multipart::{Multipart, MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use h5p_hub_cache::invalidate;
use h5p_hub_core::{AppError, ArchiveError, StorageError, extract_archive};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::contents::model::{Content, NewContent};
use crate::modules::contents::service::ContentService;
use crate::state::AppState;

pub const H5P_FILE_FIELD: &str = "h5pFile";
pub const IMAGE_FILE_FIELD: &str = "imageFile";
pub const INFO_FIELD: &str = "info";
pub const FACULTY_IDS_FIELD: &str = "facultyIds";
pub const CATEGORY_IDS_FIELD: &str = "categoryIds";

const DEFAULT_CONTENT_NAME: &str = "Unnamed H5P Content";
const DEFAULT_IMAGE_NAME: &str = "image.jpg";
/// Matches `h5p_contents.name VARCHAR(255)`.
const MAX_CONTENT_NAME_CHARS: usize = 255;
/// Keeps `{uuid}_{name}` well under file system name limits.
const MAX_IMAGE_NAME_CHARS: usize = 100;
const PREVIEW_URL_PREFIX: &str = "/api/h5p-contents/preview";

#[derive(Debug)]
pub enum UploadError {
    /// The request itself is unusable. Answered with 400.
    Invalid(String),
    /// A catalog error such as a missing category, answered with its own status.
    Rejected(AppError),
    /// Storage or extraction failed on the server side.
    Processing(anyhow::Error),
}

impl From<AppError> for UploadError {
    fn from(err: AppError) -> Self {
        if err.is_server_error() {
            UploadError::Processing(err.error)
        } else {
            UploadError::Rejected(err)
        }
    }
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Invalid(format!("Invalid multipart request: {}", err.body_text()))
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidFileSize { .. } => UploadError::Invalid(err.to_string()),
            other => UploadError::Processing(other.into()),
        }
    }
}

impl From<ArchiveError> for UploadError {
    fn from(err: ArchiveError) -> Self {
        if err.is_invalid_archive() {
            UploadError::Invalid(format!("Invalid H5P file: {}", err))
        } else {
            UploadError::Processing(err.into())
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Invalid(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            UploadError::Rejected(err) => (err.status, err.error.to_string()).into_response(),
            UploadError::Processing(err) => {
                error!(error = ?err, "Error processing H5P upload");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing H5P upload",
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Validated upload request.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub h5p_file: UploadedFile,
    pub image_file: UploadedFile,
    pub info: String,
    pub faculty_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
}

impl UploadForm {
    /// Reads every field of the request before anything is written.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        let mut h5p_file = None;
        let mut image_file = None;
        let mut info = None;
        let mut faculty_ids = Vec::new();
        let mut category_ids = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match name.as_str() {
                H5P_FILE_FIELD | IMAGE_FILE_FIELD => {
                    let file = UploadedFile {
                        file_name: field.file_name().map(str::to_string),
                        bytes: field.bytes().await?,
                    };
                    if name == H5P_FILE_FIELD {
                        h5p_file = Some(file);
                    } else {
                        image_file = Some(file);
                    }
                }
                INFO_FIELD => info = Some(field.text().await?),
                FACULTY_IDS_FIELD => {
                    faculty_ids.extend(parse_ids(FACULTY_IDS_FIELD, &field.text().await?)?)
                }
                CATEGORY_IDS_FIELD => {
                    category_ids.extend(parse_ids(CATEGORY_IDS_FIELD, &field.text().await?)?)
                }
                _ => {}
            }
        }

        let form = Self {
            h5p_file: h5p_file.ok_or_else(|| missing(H5P_FILE_FIELD))?,
            image_file: image_file.ok_or_else(|| missing(IMAGE_FILE_FIELD))?,
            info: info.ok_or_else(|| missing(INFO_FIELD))?,
            faculty_ids,
            category_ids,
        };

        if form.faculty_ids.is_empty() {
            return Err(missing(FACULTY_IDS_FIELD));
        }
        if form.category_ids.is_empty() {
            return Err(missing(CATEGORY_IDS_FIELD));
        }
        let name = display_name(form.h5p_file.file_name.as_deref());
        if name.chars().count() > MAX_CONTENT_NAME_CHARS {
            return Err(UploadError::Invalid(format!(
                "{} name must be at most {} characters",
                H5P_FILE_FIELD, MAX_CONTENT_NAME_CHARS
            )));
        }

        Ok(form)
    }
}

fn missing(field: &str) -> UploadError {
    UploadError::Invalid(format!("{} is required", field))
}

/// Parses one list field value. Accepts a single id or comma-separated ids.
pub fn parse_ids(field: &str, value: &str) -> Result<Vec<i64>, UploadError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| UploadError::Invalid(format!("Invalid value for {}: {}", field, part)))
        })
        .collect()
}

/// Archive file name without its `.h5p` extension.
pub fn display_name(file_name: Option<&str>) -> String {
    let name = file_name.unwrap_or_default();
    let stem = name
        .len()
        .checked_sub(4)
        .and_then(|split| name.get(split..).map(|ext| (split, ext)))
        .filter(|(_, ext)| ext.eq_ignore_ascii_case(".h5p"))
        .map_or(name, |(split, _)| &name[..split]);

    if stem.is_empty() {
        DEFAULT_CONTENT_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// Final path segment of `file_name` restricted to `[A-Za-z0-9._-]`.
///
/// Long names keep their trailing characters so the extension survives.
pub fn image_file_name(file_name: Option<&str>) -> String {
    let segment = file_name
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();

    if segment.is_empty() {
        return DEFAULT_IMAGE_NAME.to_string();
    }

    let sanitized: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // every char is ASCII after sanitizing, so byte offsets are char offsets
    match sanitized.len().checked_sub(MAX_IMAGE_NAME_CHARS) {
        Some(excess) if excess > 0 => sanitized[excess..].to_string(),
        _ => sanitized,
    }
}

/// Public URL of a manifest extracted for `upload_id`.
pub fn manifest_url(upload_id: &str, manifest: &Path) -> String {
    let relative = manifest
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    format!("{}/{}/{}", PREVIEW_URL_PREFIX, upload_id, relative)
}

/// Runs the whole upload and returns the linked content.
#[instrument(skip(state, form), fields(upload.id = tracing::field::Empty))]
pub async fn process_upload(state: &AppState, form: UploadForm) -> Result<Content, UploadError> {
    let upload_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("upload.id", upload_id.as_str());
    info!(
        upload.id = %upload_id,
        h5p.bytes = form.h5p_file.bytes.len(),
        image.bytes = form.image_file.bytes.len(),
        "Processing H5P upload"
    );

    let image_key = format!(
        "{}_{}",
        upload_id,
        image_file_name(form.image_file.file_name.as_deref())
    );
    state
        .image_storage
        .save(&image_key, &form.image_file.bytes)
        .await?;

    let destination = state.upload_config.content_dir(&upload_id);
    let archive = form.h5p_file.bytes.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        extract_archive(Cursor::new(archive), &destination)
    })
    .await
    .map_err(|e| UploadError::Processing(e.into()))??;

    let Some(manifest) = extracted.manifest else {
        warn!(upload.id = %upload_id, files = extracted.files.len(), "Uploaded package has no manifest");
        return Err(UploadError::Invalid(
            "Invalid H5P file: content.json not found".to_string(),
        ));
    };

    let new_content = NewContent {
        name: display_name(form.h5p_file.file_name.as_deref()),
        info: Some(form.info),
        preview_image: Some(state.image_storage.public_url(&image_key)?),
        h5p_json_path: Some(manifest_url(&upload_id, &manifest)),
    };

    let content_id = ContentService::insert_row(&state.db, &new_content)
        .await
        .map_err(|e| UploadError::Processing(e.error))?;

    let linked = ContentService::link(
        &state.db,
        content_id,
        &form.category_ids,
        &form.faculty_ids,
    )
    .await;

    invalidate::content(state.cache.as_ref(), Some(content_id)).await;

    if let Err(e) = linked {
        warn!(
            upload.id = %upload_id,
            content.id = %content_id,
            error = %e.error,
            "Uploaded content could not be linked"
        );
        return Err(e.into());
    }

    info!(upload.id = %upload_id, content.id = %content_id, "H5P upload complete");

    Ok(ContentService::get_by_id(&state.db, None, content_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_name_strips_extension() {
        assert_eq!(display_name(Some("quiz.h5p")), "quiz");
        assert_eq!(display_name(Some("Course.Intro.H5P")), "Course.Intro");
        assert_eq!(display_name(Some("notes.zip")), "notes.zip");
    }

    #[test]
    fn test_display_name_defaults() {
        assert_eq!(display_name(None), "Unnamed H5P Content");
        assert_eq!(display_name(Some("")), "Unnamed H5P Content");
        assert_eq!(display_name(Some(".h5p")), "Unnamed H5P Content");
    }

    #[test]
    fn test_display_name_multibyte_does_not_panic() {
        assert_eq!(display_name(Some("ü")), "ü");
        assert_eq!(display_name(Some("übung.h5p")), "übung");
    }

    #[test]
    fn test_image_file_name_sanitizes() {
        assert_eq!(image_file_name(Some("cover.png")), "cover.png");
        assert_eq!(image_file_name(Some("my cover (1).png")), "my_cover__1_.png");
        assert_eq!(image_file_name(Some("../../etc/passwd")), "passwd");
        assert_eq!(image_file_name(Some("C:\\Users\\me\\pic.jpg")), "pic.jpg");
    }

    #[test]
    fn test_image_file_name_keeps_tail_of_long_names() {
        let long = format!("{}.png", "x".repeat(300));

        let name = image_file_name(Some(&long));

        assert_eq!(name.len(), 100);
        assert!(name.ends_with("xx.png"));
    }

    #[test]
    fn test_image_file_name_defaults() {
        assert_eq!(image_file_name(None), "image.jpg");
        assert_eq!(image_file_name(Some("")), "image.jpg");
        assert_eq!(image_file_name(Some("dir/")), "image.jpg");
    }

    #[test]
    fn test_manifest_url() {
        assert_eq!(
            manifest_url("abc", &PathBuf::from("content.json")),
            "/api/h5p-contents/preview/abc/content.json"
        );
        assert_eq!(
            manifest_url("abc", &PathBuf::from("content/content.json")),
            "/api/h5p-contents/preview/abc/content/content.json"
        );
    }

    #[test]
    fn test_parse_ids_accepts_comma_separated() {
        assert_eq!(parse_ids("categoryIds", "1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_ids("categoryIds", "7").unwrap(), vec![7]);
        assert!(parse_ids("categoryIds", "").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ids_rejects_garbage() {
        let err = parse_ids("facultyIds", "1,x").unwrap_err();
        assert!(matches!(err, UploadError::Invalid(message) if message == "Invalid value for facultyIds: x"));
    }

    #[test]
    fn test_archive_errors_map_to_status() {
        let unsafe_entry: UploadError = ArchiveError::UnsafeEntry("../x".to_string()).into();
        assert!(matches!(unsafe_entry, UploadError::Invalid(ref m) if m.starts_with("Invalid H5P file: ")));

        let io: UploadError = ArchiveError::Io(std::io::Error::other("disk full")).into();
        assert!(matches!(io, UploadError::Processing(_)));
    }

    #[test]
    fn test_app_errors_keep_client_status() {
        let not_found: UploadError =
            AppError::not_found(anyhow::anyhow!("Category not found with id: 999")).into();
        let response = not_found.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let internal: UploadError = AppError::internal_error("boom".to_string()).into();
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
