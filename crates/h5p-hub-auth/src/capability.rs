//! Per-request authorization.
//!
//! A [`Capability`] is what a verified token entitles its bearer to. Every
//! protected operation names the [`Action`] it performs and calls
//! [`authorize`] before touching any data.

use std::collections::BTreeSet;

use h5p_hub_core::AppError;

use crate::claims::{Claims, Role};

/// Operation classes guarded by the predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create, update or delete contents, categories, faculties or their links; upload packages.
    ManageCatalog,
    /// Administer user accounts.
    ManageUsers,
    /// Read or update a single user account.
    AccessUser(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub user_id: i64,
    pub roles: BTreeSet<Role>,
}

impl Capability {
    /// Derives a capability from verified claims.
    ///
    /// # Errors
    ///
    /// Unauthorized when the subject is not a user id.
    pub fn from_claims(claims: &Claims) -> Result<Self, AppError> {
        let user_id = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))?;

        Ok(Self {
            user_id,
            roles: claims.roles.iter().copied().collect(),
        })
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn permits(&self, action: &Action) -> bool {
        match action {
            Action::ManageCatalog | Action::ManageUsers => self.is_admin(),
            Action::AccessUser(id) => self.is_admin() || self.user_id == *id,
        }
    }
}

/// Fails with 403 unless `capability` permits `action`.
pub fn authorize(capability: &Capability, action: Action) -> Result<(), AppError> {
    if capability.permits(&action) {
        Ok(())
    } else {
        Err(AppError::forbidden("Access denied".to_string()))
    }
}
