//! # H5P Hub Cache
//!
//! Redis-backed read cache for catalog data.
//!
//! The cache is an explicit collaborator: services receive an
//! `Option<&RedisCache>`, read through it, and call the helpers in
//! [`keys::invalidate`] after every mutation. `None` disables caching.
//!
//! # Example
//!
//! ```ignore
//! use h5p_hub_cache::{CacheConfig, RedisCache, keys, read_through};
//!
//! let config = CacheConfig::from_env();
//! let cache = RedisCache::new(&config.redis_url, config.default_ttl()).await?;
//!
//! let categories = read_through(Some(&cache), &keys::categories::list(), || {
//!     CategoryService::load_all(&db)
//! })
//! .await?;
//!
//! keys::invalidate::category(Some(&cache), Some(id)).await;
//! ```

pub mod config;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use keys::invalidate;
pub use redis::{CacheError, RedisCache, read_through};
