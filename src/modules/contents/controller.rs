use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use h5p_hub_core::AppError;
use tracing::instrument;

use crate::middleware::auth::RequireCatalogManager;
use crate::modules::categories::model::NameQuery;
use crate::modules::contents::model::{
    CategoryIdsDto, Content, CreateContentDto, FacultyIdsDto, UpdateContentDto, UploadContentForm,
};
use crate::modules::contents::upload::{UploadError, UploadForm, process_upload};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::ContentService;

#[utoipa::path(
    get,
    path = "/api/h5p-contents",
    responses(
        (status = 200, description = "All contents with their categories and faculties", body = Vec<Content>)
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn get_contents(State(state): State<AppState>) -> Result<Json<Vec<Content>>, AppError> {
    let contents = ContentService::get_all(&state.db, state.cache.as_ref()).await?;
    Ok(Json(contents))
}

#[utoipa::path(
    get,
    path = "/api/h5p-contents/{id}",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    responses(
        (status = 200, description = "Content details", body = Content),
        (status = 404, description = "Content not found")
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Content>, AppError> {
    let content = ContentService::get_by_id(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(content))
}

#[utoipa::path(
    post,
    path = "/api/h5p-contents",
    request_body = CreateContentDto,
    responses(
        (status = 201, description = "Content created and linked", body = Content),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Category or faculty not found; the content is kept without links")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn create_content(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    ValidatedJson(dto): ValidatedJson<CreateContentDto>,
) -> Result<(StatusCode, Json<Content>), AppError> {
    let content = ContentService::create(&state.db, state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

#[utoipa::path(
    put,
    path = "/api/h5p-contents/{id}",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    request_body = UpdateContentDto,
    responses(
        (status = 200, description = "Content updated", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content, category or faculty not found")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn update_content(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateContentDto>,
) -> Result<Json<Content>, AppError> {
    let content = ContentService::update(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(content))
}

#[utoipa::path(
    delete,
    path = "/api/h5p-contents/{id}",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content not found")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_content(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    ContentService::delete(&state.db, state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/h5p-contents/{id}/categories/{category_id}",
    params(
        ("id" = i64, Path, description = "Content ID"),
        ("category_id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category linked", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content or category not found")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn add_category(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path((content_id, category_id)): Path<(i64, i64)>,
) -> Result<Json<Content>, AppError> {
    let content =
        ContentService::add_category(&state.db, state.cache.as_ref(), content_id, category_id)
            .await?;
    Ok(Json(content))
}

#[utoipa::path(
    delete,
    path = "/api/h5p-contents/{id}/categories/{category_id}",
    params(
        ("id" = i64, Path, description = "Content ID"),
        ("category_id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category unlinked", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content or category not found")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_category(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path((content_id, category_id)): Path<(i64, i64)>,
) -> Result<Json<Content>, AppError> {
    let content =
        ContentService::remove_category(&state.db, state.cache.as_ref(), content_id, category_id)
            .await?;
    Ok(Json(content))
}

#[utoipa::path(
    put,
    path = "/api/h5p-contents/{id}/categories",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    request_body = CategoryIdsDto,
    responses(
        (status = 200, description = "Category links replaced", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content or a category not found; links unchanged")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn replace_categories(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(content_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CategoryIdsDto>,
) -> Result<Json<Content>, AppError> {
    let content = ContentService::replace_categories(
        &state.db,
        state.cache.as_ref(),
        content_id,
        &dto.category_ids,
    )
    .await?;
    Ok(Json(content))
}

#[utoipa::path(
    post,
    path = "/api/h5p-contents/{id}/faculties/{faculty_id}",
    params(
        ("id" = i64, Path, description = "Content ID"),
        ("faculty_id" = i64, Path, description = "Faculty ID")
    ),
    responses(
        (status = 200, description = "Faculty linked", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content or faculty not found")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn add_faculty(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path((content_id, faculty_id)): Path<(i64, i64)>,
) -> Result<Json<Content>, AppError> {
    let content =
        ContentService::add_faculty(&state.db, state.cache.as_ref(), content_id, faculty_id)
            .await?;
    Ok(Json(content))
}

#[utoipa::path(
    delete,
    path = "/api/h5p-contents/{id}/faculties/{faculty_id}",
    params(
        ("id" = i64, Path, description = "Content ID"),
        ("faculty_id" = i64, Path, description = "Faculty ID")
    ),
    responses(
        (status = 200, description = "Faculty unlinked", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content or faculty not found")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn remove_faculty(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path((content_id, faculty_id)): Path<(i64, i64)>,
) -> Result<Json<Content>, AppError> {
    let content =
        ContentService::remove_faculty(&state.db, state.cache.as_ref(), content_id, faculty_id)
            .await?;
    Ok(Json(content))
}

#[utoipa::path(
    put,
    path = "/api/h5p-contents/{id}/faculties",
    params(
        ("id" = i64, Path, description = "Content ID")
    ),
    request_body = FacultyIdsDto,
    responses(
        (status = 200, description = "Faculty links replaced", body = Content),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Content or a faculty not found; links unchanged")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn replace_faculties(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(content_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<FacultyIdsDto>,
) -> Result<Json<Content>, AppError> {
    let content = ContentService::replace_faculties(
        &state.db,
        state.cache.as_ref(),
        content_id,
        &dto.faculty_ids,
    )
    .await?;
    Ok(Json(content))
}

#[utoipa::path(
    get,
    path = "/api/h5p-contents/search",
    params(NameQuery),
    responses(
        (status = 200, description = "Contents whose name contains the query", body = Vec<Content>)
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn search_contents(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Content>>, AppError> {
    Ok(Json(ContentService::search(&state.db, &query.name).await?))
}

#[utoipa::path(
    get,
    path = "/api/h5p-contents/by-category/{category_id}",
    params(
        ("category_id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Contents linked to the category", body = Vec<Content>)
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn get_contents_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> Result<Json<Vec<Content>>, AppError> {
    Ok(Json(ContentService::by_category(&state.db, category_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/h5p-contents/by-category-name",
    params(NameQuery),
    responses(
        (status = 200, description = "Contents linked to the named category", body = Vec<Content>)
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn get_contents_by_category_name(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Content>>, AppError> {
    Ok(Json(ContentService::by_category_name(&state.db, &query.name).await?))
}

#[utoipa::path(
    get,
    path = "/api/h5p-contents/by-faculty/{faculty_id}",
    params(
        ("faculty_id" = i64, Path, description = "Faculty ID")
    ),
    responses(
        (status = 200, description = "Contents linked to the faculty", body = Vec<Content>)
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn get_contents_by_faculty(
    State(state): State<AppState>,
    Path(faculty_id): Path<i64>,
) -> Result<Json<Vec<Content>>, AppError> {
    Ok(Json(ContentService::by_faculty(&state.db, faculty_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/h5p-contents/by-faculty-name",
    params(NameQuery),
    responses(
        (status = 200, description = "Contents linked to the named faculty", body = Vec<Content>)
    ),
    tag = "H5P Contents"
)]
#[instrument(skip(state))]
pub async fn get_contents_by_faculty_name(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<Content>>, AppError> {
    Ok(Json(ContentService::by_faculty_name(&state.db, &query.name).await?))
}

/// Authorization is applied by the router before the body is read.
#[utoipa::path(
    post,
    path = "/api/h5p-contents/upload",
    request_body(content = UploadContentForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Package extracted and content created", body = Content),
        (status = 400, description = "Missing field or invalid package (plain text)"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Category or faculty not found; the content is kept without links (plain text)"),
        (status = 500, description = "Error processing H5P upload (plain text)")
    ),
    tag = "H5P Contents",
    security(("bearer_auth" = []))
)]
pub async fn upload_content(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Content>), UploadError> {
    let form = UploadForm::from_multipart(multipart).await?;
    let content = process_upload(&state, form).await?;
    Ok((StatusCode::CREATED, Json(content)))
}
