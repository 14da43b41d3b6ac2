//! First-run setup: creates the initial administrator and their home
//! repository.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use validator::Validate;

use filehub_auth::credentials::store::normalize_username;
use filehub_core::error::AppError;
use filehub_entity::repository::{CreateRepository, RepositoryUri};

use crate::dto::request::SetupRequest;
use crate::dto::response::{SetupStatusResponse, UserResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/setup
pub async fn status(State(state): State<AppState>) -> Result<Json<SetupStatusResponse>, ApiError> {
    let needs_setup = !state.credentials.has_any_user().await?;
    Ok(Json(SetupStatusResponse { needs_setup }))
}

/// POST /api/setup
pub async fn setup(
    State(state): State<AppState>,
    Json(req): Json<SetupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    req.validate()?;

    let _guard = state.setup_lock.lock().await;
    if state.credentials.has_any_user().await? {
        return Err(AppError::conflict("Setup has already been completed").into());
    }

    let root_uri = match req.root_uri {
        Some(uri) => uri,
        None => default_root_uri(&state)?,
    };
    root_uri
        .parse::<RepositoryUri>()
        .map_err(|e| AppError::validation(e.message))?;

    // Everything the home repository needs is checked before the user row
    // is written.
    let username = normalize_username(&req.username)?;
    if state.repositories.find_by_name(&username).await?.is_some() {
        return Err(AppError::conflict(format!("Repository '{username}' already exists")).into());
    }

    let user = state
        .credentials
        .create_user(&username, &req.password, true)
        .await?;
    let repo = state
        .repositories
        .create(CreateRepository {
            owner_id: user.id,
            name: user.username.clone(),
            root_uri,
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        repository = %repo.name,
        "Initial administrator created"
    );
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

fn default_root_uri(state: &AppState) -> Result<String, AppError> {
    state
        .config
        .root_dir
        .first()
        .map(|dir| format!("file://{}", dir.display()))
        .ok_or_else(|| AppError::validation("root_uri is required when no root_dir is configured"))
}
