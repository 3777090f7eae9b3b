//! # H5P Hub DB
//!
//! PostgreSQL connection pool initialization and schema migrations.
//!
//! # Example
//!
//! ```ignore
//! use h5p_hub_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool().await?;
//! run_migrations(&pool).await?;
//! ```

use std::env;

use sqlx::migrate::MigrateError;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

#[derive(Debug)]
pub enum DbInitError {
    MissingUrl,
    Connect(sqlx::Error),
}

impl std::fmt::Display for DbInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUrl => write!(f, "DATABASE_URL must be set"),
            Self::Connect(e) => write!(f, "Failed to connect to database: {}", e),
        }
    }
}

impl std::error::Error for DbInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect(e) => Some(e),
            Self::MissingUrl => None,
        }
    }
}

/// Connects to the database named by `DATABASE_URL`.
///
/// The returned pool is cheaply cloneable and lives in the application state.
/// `DATABASE_MAX_CONNECTIONS` caps the pool size (default 10).
pub async fn init_db_pool() -> Result<PgPool, DbInitError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbInitError::MissingUrl)?;
    let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&database_url)
        .await
        .map_err(DbInitError::Connect)?;

    info!(max_connections, "Database pool initialized");

    Ok(pool)
}

/// Applies the migrations bundled from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

pub use sqlx::PgPool;
