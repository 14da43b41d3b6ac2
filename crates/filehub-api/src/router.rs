//! Route definitions for the FileHub HTTP surfaces.
//!
//! `/dav` carries the WebDAV mount, `/api` the JSON endpoints used by the
//! browser UI. Both share one `AppState`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{any, get, post},
};
use tower_http::trace::TraceLayer;

use filehub_webdav::DAV_PREFIX;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(dav_routes(&state))
        .nest("/api", api_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// WebDAV mount. `any` also catches extension verbs such as PROPFIND.
/// Uploads are streamed to storage, so the body limit is lifted.
fn dav_routes(state: &AppState) -> Router<AppState> {
    let root_slash = format!("{DAV_PREFIX}/");
    let nested = format!("{DAV_PREFIX}/{{*path}}");

    Router::new()
        .route(DAV_PREFIX, any(handlers::dav::dav))
        .route(&root_slash, any(handlers::dav::dav))
        .route(&nested, any(handlers::dav::dav))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_dav_auth,
        ))
        .layer(DefaultBodyLimit::disable())
}

/// JSON endpoints. Only `/me` routes require an authenticated caller.
fn api_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/me/password", post(handlers::auth::change_password))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_auth,
        ));

    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/setup",
            get(handlers::setup::status).post(handlers::setup::setup),
        )
        .route("/health", get(handlers::health::health))
        .merge(protected)
}
