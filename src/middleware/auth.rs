use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use h5p_hub_auth::{Action, Capability, Claims, authorize, verify_token};
use h5p_hub_core::AppError;

use crate::state::AppState;

/// Extractor that validates the bearer token and provides its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn capability(&self) -> Result<Capability, AppError> {
        Capability::from_claims(&self.0)
    }

    /// Evaluates the authorization predicate for `action`.
    pub fn authorize(&self, action: Action) -> Result<Capability, AppError> {
        let capability = self.capability()?;
        authorize(&capability, action)?;
        Ok(capability)
    }

    pub fn user_id(&self) -> Result<i64, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Declares an extractor that authenticates the caller and requires a fixed action.
#[macro_export]
macro_rules! require_action {
    ($name:ident, $action:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = h5p_hub_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                auth_user.authorize($action)?;

                Ok($name(auth_user))
            }
        }
    };
}

require_action!(RequireCatalogManager, Action::ManageCatalog);
require_action!(RequireUserManager, Action::ManageUsers);
