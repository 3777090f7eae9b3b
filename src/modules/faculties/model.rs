use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Faculty {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFacultyDto {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,
    pub description: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFacultyDto {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
}
