use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryDto {
    /// Unique category name; blank names are rejected
    #[serde(default)]
    #[validate(length(max = 255))]
    pub name: String,
}

/// Name filter shared by the search endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct NameQuery {
    pub name: String,
}
