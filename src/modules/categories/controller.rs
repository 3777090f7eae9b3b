use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use h5p_hub_core::AppError;
use tracing::instrument;

use crate::middleware::auth::RequireCatalogManager;
use crate::modules::categories::model::{Category, CategoryDto, NameQuery};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::CategoryService;

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories ordered by name", body = Vec<Category>)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryService::get_all(&state.db, state.cache.as_ref()).await?;
    Ok(Json(categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category details", body = Category),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryService::get_by_id(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(category))
}

#[utoipa::path(
    get,
    path = "/api/categories/search",
    params(NameQuery),
    responses(
        (status = 200, description = "Categories whose name contains the query", body = Vec<Category>)
    ),
    tag = "Categories"
)]
#[instrument(skip(state))]
pub async fn search_categories(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = CategoryService::search(&state.db, &query.name).await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryDto,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Blank or duplicate name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn create_category(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    ValidatedJson(dto): ValidatedJson<CategoryDto>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = CategoryService::create(&state.db, state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    request_body = CategoryDto,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, description = "Blank or duplicate name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn update_category(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CategoryDto>,
) -> Result<Json<Category>, AppError> {
    let category = CategoryService::update(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(category))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    CategoryService::delete(&state.db, state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
