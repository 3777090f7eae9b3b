use axum::{
    Router,
    routing::{get, post, put},
};

use crate::modules::users::controller::{
    activate_user, create_admin, create_user, deactivate_user, delete_user, demote_user,
    get_profile, get_user, get_user_by_email, get_users, promote_user, update_profile,
    update_user,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route("/admin", post(create_admin))
        .route("/profile", get(get_profile).put(update_profile))
        .route("/email/{email}", get(get_user_by_email))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/promote", put(promote_user))
        .route("/{id}/demote", put(demote_user))
        .route("/{id}/activate", put(activate_user))
        .route("/{id}/deactivate", put(deactivate_user))
}
