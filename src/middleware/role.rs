//! Layer-based authorization.
//!
//! Extractors from [`crate::middleware::auth`] cover most handlers. The
//! middleware here is for routes whose body must not be read before the
//! caller is known to be allowed, such as package uploads.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use h5p_hub_auth::Action;
use h5p_hub_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Authenticates the request and checks `action` before running the inner service.
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/upload", post(upload_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_catalog_manager));
/// ```
pub async fn require_action(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    action: Action,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;
    auth_user.authorize(action)?;

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

pub async fn require_catalog_manager(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_action(State(state), req, next, Action::ManageCatalog).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
