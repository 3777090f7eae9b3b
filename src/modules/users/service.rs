use h5p_hub_auth::Role;
use h5p_hub_core::{AppError, hash_password};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::modules::users::model::{CreateUserDto, UpdateUserDto, User, UserCredentials, UserRow};

const USER_SELECT: &str = "SELECT u.id, u.email, u.first_name, u.last_name, u.active,
        COALESCE(
            ARRAY_AGG(r.role::TEXT ORDER BY r.role DESC) FILTER (WHERE r.role IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS roles
    FROM users u
    LEFT JOIN user_roles r ON r.user_id = u.id";

pub struct UserService;

fn not_found(id: i64) -> AppError {
    AppError::not_found(anyhow::anyhow!("User not found with id: {}", id))
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::bad_request(anyhow::anyhow!("Email is already in use"));
    }
    AppError::from(e)
}

impl UserService {
    #[instrument(skip(db))]
    pub async fn list(db: &PgPool) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} GROUP BY u.id ORDER BY u.id"))
            .fetch_all(db)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip(db))]
    pub async fn get_by_id(db: &PgPool, id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, UserRow>(&format!("{USER_SELECT} WHERE u.id = $1 GROUP BY u.id"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(User::from)
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db))]
    pub async fn get_by_email(db: &PgPool, email: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "{USER_SELECT} WHERE LOWER(u.email) = LOWER($1) GROUP BY u.id"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?
        .map(User::from)
        .ok_or_else(|| {
            AppError::not_found(anyhow::anyhow!("User not found with email: {}", email))
        })
    }

    /// Password hash and status for the login path.
    pub async fn find_credentials(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, AppError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password, active FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(db)
        .await?;

        Ok(credentials)
    }

    /// Creates a user with `roles` in one transaction.
    #[instrument(skip(db, dto), fields(user.email = %dto.email))]
    pub async fn create(db: &PgPool, dto: CreateUserDto, roles: &[Role]) -> Result<User, AppError> {
        let hashed_password = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, password, first_name, last_name)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(dto.email.trim())
        .bind(&hashed_password)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            warn!(user.email = %dto.email, "User creation failed");
            map_unique_violation(e)
        })?;

        let role_names: Vec<String> = roles.iter().map(|role| role.as_str().to_string()).collect();
        sqlx::query(
            "INSERT INTO user_roles (user_id, role) SELECT $1, UNNEST($2::TEXT[])
             ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(&role_names)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(user.id = %id, user.roles = ?roles, "User created");

        Self::get_by_id(db, id).await
    }

    #[instrument(skip(db, dto))]
    pub async fn update(db: &PgPool, id: i64, dto: UpdateUserDto) -> Result<User, AppError> {
        let hashed_password = dto.password.as_deref().map(hash_password).transpose()?;

        let result = sqlx::query(
            "UPDATE users
             SET email = COALESCE($1, email),
                 first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 password = COALESCE($4, password),
                 updated_at = NOW()
             WHERE id = $5",
        )
        .bind(dto.email.as_deref().map(str::trim))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&hashed_password)
        .bind(id)
        .execute(db)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Self::get_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        info!(user.id = %id, "User deleted");

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn add_role(db: &PgPool, id: i64, role: Role) -> Result<User, AppError> {
        let user = Self::get_by_id(db, id).await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user.id)
        .bind(role.as_str())
        .execute(db)
        .await?;

        Self::get_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn remove_role(db: &PgPool, id: i64, role: Role) -> Result<User, AppError> {
        let user = Self::get_by_id(db, id).await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role = $2")
            .bind(user.id)
            .bind(role.as_str())
            .execute(db)
            .await?;

        Self::get_by_id(db, id).await
    }

    #[instrument(skip(db))]
    pub async fn set_active(db: &PgPool, id: i64, active: bool) -> Result<User, AppError> {
        let result = sqlx::query("UPDATE users SET active = $1, updated_at = NOW() WHERE id = $2")
            .bind(active)
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        Self::get_by_id(db, id).await
    }
}
