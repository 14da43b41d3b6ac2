//! Bridges the `/dav` routes into the WebDAV adapter.

use axum::Extension;
use axum::extract::{Request, State};
use axum::response::Response;

use filehub_auth::AuthenticatedUser;

use crate::state::AppState;

/// Any verb under `/dav`. The auth middleware has already attached the
/// caller.
pub async fn dav(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    request: Request,
) -> Response {
    state.dav.handle(&auth.user, request).await
}
