//! Auth handlers: login, logout, me, password change.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use validator::Validate;

use filehub_core::error::AppError;

use crate::dto::request::{ChangePasswordRequest, LoginRequest};
use crate::dto::response::{LoginResponse, UserResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    req.validate()?;

    let user = state
        .credentials
        .authenticate(&req.username, &req.password)
        .await?;
    let session = state.sessions.create(user.clone()).await;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    let max_age = time::Duration::seconds(
        i64::try_from(state.config.auth.session_ttl_secs).unwrap_or(i64::MAX),
    );
    let cookie = Cookie::build((state.config.auth.cookie_name.clone(), session.id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(max_age);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            username: user.username,
            is_admin: user.is_admin,
        }),
    ))
}

/// POST /api/logout
///
/// Succeeds whether or not the cookie names a live session.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let name = state.config.auth.cookie_name.clone();
    if let Some(cookie) = jar.get(&name) {
        state.sessions.destroy(cookie.value()).await;
        tracing::info!("Session destroyed on logout");
    }

    let expired = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::ZERO);
    (StatusCode::NO_CONTENT, jar.add(expired))
}

/// GET /api/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(auth.user.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(user)))
}

/// POST /api/me/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    req.validate()?;

    state
        .credentials
        .change_password(&auth.user, &req.current_password, &req.new_password)
        .await?;

    tracing::info!(user_id = %auth.user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
