//! `AuthUser` extractor: the identity placed on the request by the auth
//! middleware.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use filehub_auth::AuthenticatedUser;
use filehub_core::error::AppError;

use crate::error::ApiError;

/// Authenticated caller available in handlers behind the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthenticatedUser);

impl std::ops::Deref for AuthUser {
    type Target = AuthenticatedUser;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError(AppError::authentication("Authentication required")))
    }
}
