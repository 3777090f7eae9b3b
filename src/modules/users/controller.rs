use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use h5p_hub_auth::{Action, Role};
use h5p_hub_core::AppError;
use tracing::instrument;

use crate::middleware::auth::{AuthUser, RequireUserManager};
use crate::modules::users::model::{CreateUserDto, MessageResponse, UpdateUserDto, User};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "List of users", body = Vec<User>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_users(
    State(state): State<AppState>,
    _admin: RequireUserManager,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(UserService::list(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin or the user themselves"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    auth_user.authorize(Action::AccessUser(id))?;
    Ok(Json(UserService::get_by_id(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/users/email/{email}",
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    Path(email): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::get_by_email(&state.db, &email).await?))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created with the USER role", body = User),
        (status = 400, description = "Email is already in use"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create(&state.db, dto, &[Role::User]).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/api/users/admin",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created with the USER and ADMIN roles", body = User),
        (status = 400, description = "Email is already in use"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Validation error")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin, dto))]
pub async fn create_admin(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    ValidatedJson(dto): ValidatedJson<CreateUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = UserService::create(&state.db, dto, &[Role::User, Role::Admin]).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Email is already in use"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin or the user themselves"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    auth_user.authorize(Action::AccessUser(id))?;
    Ok(Json(UserService::update(&state.db, id, dto).await?))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete(&state.db, id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/promote",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "ADMIN role granted", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn promote_user(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::add_role(&state.db, id, Role::Admin).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/demote",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "ADMIN role revoked", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn demote_user(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::remove_role(&state.db, id, Role::Admin).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/activate",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User activated", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn activate_user(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::set_active(&state.db, id, true).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}/deactivate",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deactivated", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, _admin))]
pub async fn deactivate_user(
    State(state): State<AppState>,
    _admin: RequireUserManager,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(UserService::set_active(&state.db, id, false).await?))
}

/// Current user from the token subject
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Unauthorized - missing or invalid token")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user_id = auth_user.user_id()?;
    Ok(Json(UserService::get_by_id(&state.db, user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Email is already in use"),
        (status = 401, description = "Unauthorized - missing or invalid token"),
        (status = 422, description = "Validation error")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateUserDto>,
) -> Result<Json<User>, AppError> {
    let user_id = auth_user.user_id()?;
    Ok(Json(UserService::update(&state.db, user_id, dto).await?))
}
