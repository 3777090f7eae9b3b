use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use h5p_hub_core::AppError;
use tracing::instrument;

use crate::middleware::auth::RequireCatalogManager;
use crate::modules::faculties::model::{CreateFacultyDto, Faculty, UpdateFacultyDto};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::FacultyService;

#[utoipa::path(
    get,
    path = "/api/faculties",
    responses(
        (status = 200, description = "All faculties ordered by name", body = Vec<Faculty>)
    ),
    tag = "Faculties"
)]
#[instrument(skip(state))]
pub async fn get_faculties(State(state): State<AppState>) -> Result<Json<Vec<Faculty>>, AppError> {
    let faculties = FacultyService::get_all(&state.db, state.cache.as_ref()).await?;
    Ok(Json(faculties))
}

#[utoipa::path(
    get,
    path = "/api/faculties/{id}",
    params(
        ("id" = i64, Path, description = "Faculty ID")
    ),
    responses(
        (status = 200, description = "Faculty details", body = Faculty),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculties"
)]
#[instrument(skip(state))]
pub async fn get_faculty(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Faculty>, AppError> {
    let faculty = FacultyService::get_by_id(&state.db, state.cache.as_ref(), id).await?;
    Ok(Json(faculty))
}

#[utoipa::path(
    post,
    path = "/api/faculties",
    request_body = CreateFacultyDto,
    responses(
        (status = 201, description = "Faculty created", body = Faculty),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Faculties",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn create_faculty(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    ValidatedJson(dto): ValidatedJson<CreateFacultyDto>,
) -> Result<(StatusCode, Json<Faculty>), AppError> {
    let faculty = FacultyService::create(&state.db, state.cache.as_ref(), dto).await?;
    Ok((StatusCode::CREATED, Json(faculty)))
}

#[utoipa::path(
    put,
    path = "/api/faculties/{id}",
    params(
        ("id" = i64, Path, description = "Faculty ID")
    ),
    request_body = UpdateFacultyDto,
    responses(
        (status = 200, description = "Faculty updated", body = Faculty),
        (status = 400, description = "Blank name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculties",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn update_faculty(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateFacultyDto>,
) -> Result<Json<Faculty>, AppError> {
    let faculty = FacultyService::update(&state.db, state.cache.as_ref(), id, dto).await?;
    Ok(Json(faculty))
}

#[utoipa::path(
    delete,
    path = "/api/faculties/{id}",
    params(
        ("id" = i64, Path, description = "Faculty ID")
    ),
    responses(
        (status = 204, description = "Faculty deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "Faculty not found")
    ),
    tag = "Faculties",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_faculty(
    State(state): State<AppState>,
    _admin: RequireCatalogManager,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    FacultyService::delete(&state.db, state.cache.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
