//! Administrative commands shared by the server binary and `h5p-hub-cli`.

pub mod seeder;

use h5p_hub_auth::Role;
use h5p_hub_core::AppError;
use sqlx::PgPool;

use crate::modules::users::model::{CreateUserDto, User};
use crate::modules::users::service::UserService;

/// Creates an account holding both USER and ADMIN.
pub async fn create_admin(
    db: &PgPool,
    email: &str,
    password: &str,
    first_name: Option<String>,
    last_name: Option<String>,
) -> Result<User, AppError> {
    let dto = CreateUserDto {
        email: email.to_string(),
        password: password.to_string(),
        first_name,
        last_name,
    };

    UserService::create(db, dto, &[Role::User, Role::Admin]).await
}
