use std::sync::Arc;

use anyhow::Context;
use h5p_hub_cache::{CacheConfig, RedisCache};
use h5p_hub_config::{CorsConfig, JwtConfig, UploadConfig};
use h5p_hub_core::{FileStorage, LocalFileStorage};
use h5p_hub_db::{init_db_pool, run_migrations};
use sqlx::PgPool;
use tracing::{info, warn};

/// Public URL prefix the images directory is served under.
pub const IMAGES_URL_PREFIX: &str = "/images";

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub upload_config: UploadConfig,
    pub cache_config: CacheConfig,
    /// `None` when caching is disabled or Redis was unreachable at startup.
    pub cache: Option<RedisCache>,
    pub image_storage: Arc<dyn FileStorage>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("upload_config", &self.upload_config)
            .field("cache_config", &self.cache_config)
            .field("cache_connected", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Assembles state around an existing pool. Used by startup and tests.
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        upload_config: UploadConfig,
        cache_config: CacheConfig,
        cache: Option<RedisCache>,
    ) -> Self {
        let image_storage = Arc::new(LocalFileStorage::with_max_size(
            upload_config.images_dir(),
            IMAGES_URL_PREFIX,
            upload_config.max_image_bytes,
        ));

        Self {
            db,
            jwt_config,
            cors_config: CorsConfig::from_env(),
            upload_config,
            cache_config,
            cache,
            image_storage,
        }
    }
}

async fn connect_cache(config: &CacheConfig) -> Option<RedisCache> {
    if !config.enabled {
        info!("Cache disabled");
        return None;
    }

    match RedisCache::new(&config.redis_url, config.default_ttl()).await {
        Ok(cache) => {
            info!(redis_url = %config.redis_url, "Cache connected");
            Some(cache)
        }
        Err(e) => {
            warn!(error = %e, redis_url = %config.redis_url, "Redis unreachable, running without cache");
            None
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let upload_config = UploadConfig::from_env();
    upload_config
        .ensure_directories()
        .with_context(|| format!("Failed to create upload directories under {:?}", upload_config.base_dir))?;

    let db = init_db_pool().await?;
    run_migrations(&db).await.context("Failed to run migrations")?;

    let cache_config = CacheConfig::from_env();
    let cache = connect_cache(&cache_config).await;

    Ok(AppState::new(
        db,
        JwtConfig::from_env(),
        upload_config,
        cache_config,
        cache,
    ))
}
