//! Request authentication and authorization.
//!
//! - [`auth`]: `AuthUser` extractor and capability-checking extractors
//! - [`role`]: Router-level middleware built on the same capability predicate
//!
//! # Authorization Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `AuthUser` verifies the JWT and yields its claims
//! 3. A [`h5p_hub_auth::Capability`] is derived from the claims
//! 4. The handler (or extractor, or middleware) evaluates the required
//!    [`h5p_hub_auth::Action`] against it
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::{AuthUser, RequireCatalogManager};
//! use h5p_hub_auth::Action;
//!
//! // Guarded by extractor
//! async fn delete_category(_: RequireCatalogManager, Path(id): Path<i64>) { /* ... */ }
//!
//! // Guarded inline when the action depends on the request
//! async fn get_user(auth_user: AuthUser, Path(id): Path<i64>) -> Result<_, AppError> {
//!     auth_user.authorize(Action::AccessUser(id))?;
//!     // ...
//! }
//! ```

pub mod auth;
pub mod role;
