use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::categories::model::Category;
use crate::modules::faculties::model::Faculty;

/// Content representation with its linked categories and faculties, both ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: i64,
    pub name: String,
    pub info: Option<String>,
    /// Public URL of the preview image
    pub preview_image: Option<String>,
    /// Public URL of the package manifest
    pub h5p_json_path: Option<String>,
    pub categories: Vec<Category>,
    pub faculties: Vec<Faculty>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContentRow {
    pub id: i64,
    pub name: String,
    pub info: Option<String>,
    pub preview_image: Option<String>,
    pub h5p_json_path: Option<String>,
}

impl ContentRow {
    pub fn into_content(self, categories: Vec<Category>, faculties: Vec<Faculty>) -> Content {
        Content {
            id: self.id,
            name: self.name,
            info: self.info,
            preview_image: self.preview_image,
            h5p_json_path: self.h5p_json_path,
            categories,
            faculties,
        }
    }
}

/// Column values for a new content row.
#[derive(Debug, Clone)]
pub struct NewContent {
    pub name: String,
    pub info: Option<String>,
    pub preview_image: Option<String>,
    pub h5p_json_path: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentDto {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,
    pub info: Option<String>,
    pub preview_image: Option<String>,
    pub h5p_json_path: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default)]
    pub faculty_ids: Vec<i64>,
}

/// Partial update. Link lists, when present, replace the current links.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentDto {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub info: Option<String>,
    pub preview_image: Option<String>,
    pub h5p_json_path: Option<String>,
    pub category_ids: Option<Vec<i64>>,
    pub faculty_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIdsDto {
    pub category_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacultyIdsDto {
    pub faculty_ids: Vec<i64>,
}

/// Multipart body of the upload endpoint, for the API docs.
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct UploadContentForm {
    /// H5P package (ZIP archive)
    #[schema(value_type = String, format = Binary)]
    pub h5p_file: Vec<u8>,
    /// Preview image
    #[schema(value_type = String, format = Binary)]
    pub image_file: Vec<u8>,
    pub info: String,
    /// Repeated fields or comma-separated values
    pub faculty_ids: Vec<i64>,
    /// Repeated fields or comma-separated values
    pub category_ids: Vec<i64>,
}
