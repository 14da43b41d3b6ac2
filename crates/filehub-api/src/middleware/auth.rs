//! Authentication middleware for the WebDAV and JSON surfaces.
//!
//! Both run the same mediator; they differ in how a rejection is
//! rendered. WebDAV clients get challenges and an XML body, the browser
//! UI gets a JSON body and no challenge (which would trigger the
//! browser's own login prompt).

use axum::extract::{OriginalUri, Request, State};
use axum::http::header::WWW_AUTHENTICATE;
use axum::middleware::Next;
use axum::response::Response;

use filehub_auth::AuthRejection;
use filehub_webdav::response::xml_error_response;

use crate::error::json_error;
use crate::state::AppState;

/// Guard for `/dav`.
pub async fn require_dav_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let target = request_target(&request);
    let result = state
        .authenticator
        .authenticate(request.method().as_str(), &target, request.headers())
        .await;

    match result {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(rejection) => {
            log_rejection(&rejection, request.uri().path());
            let mut response = xml_error_response(rejection.status(), &rejection.message());
            for challenge in state.authenticator.challenges(&rejection).await {
                response.headers_mut().append(WWW_AUTHENTICATE, challenge);
            }
            response
        }
    }
}

/// Guard for authenticated `/api` routes. Session-backed requests extend
/// their session.
pub async fn require_api_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let target = request_target(&request);
    let result = state
        .authenticator
        .authenticate(request.method().as_str(), &target, request.headers())
        .await;

    match result {
        Ok(user) => {
            if let Some(id) = user.session_id() {
                state.sessions.extend(id).await;
            }
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(rejection) => {
            log_rejection(&rejection, request.uri().path());
            json_error(rejection.status(), rejection.message())
        }
    }
}

/// Path and query as the client sent them, before any router nesting
/// stripped a prefix.
fn request_target(request: &Request) -> String {
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map_or(request.uri(), |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), |pq| pq.as_str().to_string())
}

fn log_rejection(rejection: &AuthRejection, path: &str) {
    match rejection {
        AuthRejection::Internal(e) => {
            tracing::error!(path, error = %e, "Authentication lookup failed");
        }
        AuthRejection::MissingCredentials => {
            tracing::debug!(path, "Request without credentials");
        }
        other => {
            tracing::info!(path, reason = %other.message(), "Authentication rejected");
        }
    }
}
