//! # H5P Hub Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: JWT authentication configuration
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`upload`]: Upload directories and limits
//! - [`server`]: Bind address
//!
//! # Example
//!
//! ```ignore
//! use h5p_hub_config::{CorsConfig, JwtConfig, ServerConfig, UploadConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let upload_config = UploadConfig::from_env();
//! upload_config.ensure_directories()?;
//! ```

pub mod cors;
pub mod jwt;
pub mod server;
pub mod upload;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
pub use upload::UploadConfig;
