//! # H5P Hub Auth
//!
//! Authentication and authorization primitives:
//!
//! - [`claims`]: JWT claims and the [`Role`] set carried in them
//! - [`jwt`]: Token creation and verification
//! - [`capability`]: The per-request authorization predicate
//!
//! Authorization is an explicit check rather than an annotation. Handlers
//! derive a [`Capability`] from verified claims and ask it whether an
//! [`Action`] is permitted:
//!
//! ```ignore
//! use h5p_hub_auth::{Action, Capability, authorize, verify_token};
//!
//! let claims = verify_token(&token, &jwt_config)?;
//! let capability = Capability::from_claims(&claims)?;
//! authorize(&capability, Action::ManageCatalog)?;
//! ```

pub mod capability;
pub mod claims;
pub mod jwt;

pub use capability::{Action, Capability, authorize};
pub use claims::{Claims, Role};
pub use jwt::{create_access_token, verify_token};
