use h5p_hub_auth::{Role, create_access_token};
use h5p_hub_config::jwt::JwtConfig;
use h5p_hub_core::{AppError, verify_password};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::modules::users::model::{CreateUserDto, User};
use crate::modules::users::service::UserService;

use super::model::{LoginRequest, LoginResponse, RegisterRequestDto};

pub struct AuthService;

fn invalid_credentials() -> AppError {
    AppError::unauthorized("Invalid credentials".to_string())
}

fn issue_token(user: &User, jwt_config: &JwtConfig) -> Result<String, AppError> {
    create_access_token(user.id, &user.email, user.roles.clone(), jwt_config)
}

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn register_user(
        db: &PgPool,
        dto: RegisterRequestDto,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let user = UserService::create(
            db,
            CreateUserDto {
                email: dto.email,
                password: dto.password,
                first_name: dto.first_name,
                last_name: dto.last_name,
            },
            &[Role::User],
        )
        .await?;

        let token = issue_token(&user, jwt_config)?;

        Ok(LoginResponse {
            token,
            message: "User registered successfully".to_string(),
            user,
        })
    }

    /// Unknown email, wrong password and inactive account all fail the same way.
    #[instrument(skip(db, dto, jwt_config), fields(user.email = %dto.email))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        if dto.email.trim().is_empty() || dto.password.is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Email and password are required"
            )));
        }

        let Some(credentials) = UserService::find_credentials(db, &dto.email).await? else {
            warn!("Login attempt for unknown email");
            return Err(invalid_credentials());
        };

        if !verify_password(&dto.password, &credentials.password)? {
            warn!(user.id = %credentials.id, "Login attempt with wrong password");
            return Err(invalid_credentials());
        }

        if !credentials.active {
            warn!(user.id = %credentials.id, "Login attempt for inactive user");
            return Err(invalid_credentials());
        }

        let user = UserService::get_by_id(db, credentials.id).await?;
        let token = issue_token(&user, jwt_config)?;

        info!(user.id = %user.id, "User logged in");

        Ok(LoginResponse {
            token,
            message: "Login successful".to_string(),
            user,
        })
    }
}
