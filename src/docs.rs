use h5p_hub_auth::Role;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{LoginRequest, LoginResponse, RegisterRequestDto};
use crate::modules::categories::model::{Category, CategoryDto};
use crate::modules::contents::model::{
    CategoryIdsDto, Content, CreateContentDto, FacultyIdsDto, UpdateContentDto, UploadContentForm,
};
use crate::modules::faculties::model::{CreateFacultyDto, Faculty, UpdateFacultyDto};
use crate::modules::users::model::{CreateUserDto, MessageResponse, UpdateUserDto, User};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::register_user,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::get_user_by_email,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::create_admin,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::users::controller::promote_user,
        crate::modules::users::controller::demote_user,
        crate::modules::users::controller::activate_user,
        crate::modules::users::controller::deactivate_user,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::contents::controller::get_contents,
        crate::modules::contents::controller::get_content,
        crate::modules::contents::controller::create_content,
        crate::modules::contents::controller::update_content,
        crate::modules::contents::controller::delete_content,
        crate::modules::contents::controller::add_category,
        crate::modules::contents::controller::remove_category,
        crate::modules::contents::controller::replace_categories,
        crate::modules::contents::controller::add_faculty,
        crate::modules::contents::controller::remove_faculty,
        crate::modules::contents::controller::replace_faculties,
        crate::modules::contents::controller::search_contents,
        crate::modules::contents::controller::get_contents_by_category,
        crate::modules::contents::controller::get_contents_by_category_name,
        crate::modules::contents::controller::get_contents_by_faculty,
        crate::modules::contents::controller::get_contents_by_faculty_name,
        crate::modules::contents::controller::upload_content,
        crate::modules::categories::controller::get_categories,
        crate::modules::categories::controller::get_category,
        crate::modules::categories::controller::search_categories,
        crate::modules::categories::controller::create_category,
        crate::modules::categories::controller::update_category,
        crate::modules::categories::controller::delete_category,
        crate::modules::faculties::controller::get_faculties,
        crate::modules::faculties::controller::get_faculty,
        crate::modules::faculties::controller::create_faculty,
        crate::modules::faculties::controller::update_faculty,
        crate::modules::faculties::controller::delete_faculty,
    ),
    components(
        schemas(
            Role,
            User,
            CreateUserDto,
            UpdateUserDto,
            MessageResponse,
            LoginRequest,
            LoginResponse,
            RegisterRequestDto,
            ErrorResponse,
            Content,
            CreateContentDto,
            UpdateContentDto,
            CategoryIdsDto,
            FacultyIdsDto,
            UploadContentForm,
            Category,
            CategoryDto,
            Faculty,
            CreateFacultyDto,
            UpdateFacultyDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and registration"),
        (name = "Users", description = "User administration and profiles"),
        (name = "H5P Contents", description = "H5P content catalog and package upload"),
        (name = "Categories", description = "Content categories"),
        (name = "Faculties", description = "Faculties owning content")
    ),
    info(
        title = "H5P Hub API",
        version = "0.1.0",
        description = "Catalog and upload service for H5P interactive content, built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_upload_and_security() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/h5p-contents/upload"));
        assert!(doc.paths.paths.contains_key("/api/categories/{id}"));
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
