//! DELETE method implementation.

use axum::body::Body;
use http::{Response, StatusCode};
use tracing::info;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::StorageProvider;
use filehub_core::types::path;

use crate::handler::DavContext;
use crate::response::empty_response;

/// Handle a DELETE request. Collections are removed recursively.
pub async fn handle_delete(ctx: &DavContext<'_>) -> AppResult<Response<Body>> {
    if path::is_root(&ctx.path) {
        return Err(AppError::authorization("Cannot delete the repository root"));
    }

    let info = ctx.backend.get_info(ctx.repo_name(), &ctx.path).await?;
    ctx.backend.delete_file(ctx.repo_name(), &ctx.path).await?;

    if !info.is_dir {
        ctx.adjust_quota(-(info.size as i64)).await;
    }
    info!(user = %ctx.user.username, path = %ctx.path, "Deleted via WebDAV");

    Ok(empty_response(StatusCode::NO_CONTENT))
}
