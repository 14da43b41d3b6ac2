//! MKCOL method implementation (RFC 4918 Section 9.3).

use axum::body::Body;
use http::header::CONTENT_LENGTH;
use http::{HeaderMap, Response, StatusCode};
use tracing::info;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::StorageProvider;
use filehub_core::types::path;

use crate::handler::DavContext;
use crate::response::{empty_response, xml_error_response};

/// Handle a MKCOL request.
pub async fn handle_mkcol(ctx: &DavContext<'_>, headers: &HeaderMap) -> AppResult<Response<Body>> {
    let has_body = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .is_some_and(|len| len > 0);
    if has_body {
        return Ok(xml_error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "MKCOL with a body is not supported",
        ));
    }

    if path::is_root(&ctx.path) {
        return Err(AppError::conflict("Collection already exists"));
    }
    match ctx.backend.get_info(ctx.repo_name(), &ctx.path).await {
        Ok(_) => return Err(AppError::conflict("Collection already exists")),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    ctx.backend.create_dir(ctx.repo_name(), &ctx.path).await?;
    info!(user = %ctx.user.username, path = %ctx.path, "Created collection");

    Ok(empty_response(StatusCode::CREATED))
}
