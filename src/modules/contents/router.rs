use axum::{
    Router, middleware,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::role::require_catalog_manager;
use crate::router::serve_uploads;
use crate::state::AppState;

use super::controller::{
    add_category, add_faculty, create_content, delete_content, get_content, get_contents,
    get_contents_by_category, get_contents_by_category_name, get_contents_by_faculty,
    get_contents_by_faculty_name, remove_category, remove_faculty, replace_categories,
    replace_faculties, search_contents, update_content, upload_content,
};

/// Routes under `/api/h5p-contents`, including extracted package files under `/preview`.
pub fn init_contents_router(state: &AppState) -> Router<AppState> {
    let upload_router = Router::new()
        .route("/upload", post(upload_content))
        .layer(DefaultBodyLimit::max(state.upload_config.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_catalog_manager,
        ));

    Router::new()
        .route("/", get(get_contents).post(create_content))
        .route("/search", get(search_contents))
        .route("/by-category/{category_id}", get(get_contents_by_category))
        .route("/by-category-name", get(get_contents_by_category_name))
        .route("/by-faculty/{faculty_id}", get(get_contents_by_faculty))
        .route("/by-faculty-name", get(get_contents_by_faculty_name))
        .route(
            "/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/{id}/categories", put(replace_categories))
        .route(
            "/{id}/categories/{category_id}",
            post(add_category).delete(remove_category),
        )
        .route("/{id}/faculties", put(replace_faculties))
        .route(
            "/{id}/faculties/{faculty_id}",
            post(add_faculty).delete(remove_faculty),
        )
        .merge(upload_router)
        .nest_service("/preview", serve_uploads(state.upload_config.h5p_dir()))
}
