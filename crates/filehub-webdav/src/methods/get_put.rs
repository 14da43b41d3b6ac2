//! GET, HEAD and PUT method implementations.

use std::io;

use axum::body::Body;
use futures::TryStreamExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use http::{Response, StatusCode};
use tracing::{debug, info, warn};

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::{ByteStream, StorageProvider};
use filehub_core::types::{FileObject, path};

use crate::handler::DavContext;
use crate::properties::format_http_date;
use crate::response::{dav_builder, empty_response, finish};

/// Handle a GET request, streaming the file body.
pub async fn handle_get(ctx: &DavContext<'_>) -> AppResult<Response<Body>> {
    let info = ctx.backend.get_info(ctx.repo_name(), &ctx.path).await?;
    if info.is_dir {
        return Err(AppError::validation("Cannot GET a collection"));
    }

    let stream = ctx.backend.open_file(ctx.repo_name(), &ctx.path).await?;
    let logged_path = ctx.path.clone();
    let stream = stream.inspect_err(move |e| {
        warn!(path = %logged_path, error = %e, "Download aborted after headers were sent");
    });

    debug!(path = %ctx.path, size = info.size, "GET");
    Ok(finish(file_headers(&info), Body::from_stream(stream)))
}

/// Handle a HEAD request: GET headers without a body.
pub async fn handle_head(ctx: &DavContext<'_>) -> AppResult<Response<Body>> {
    let info = ctx.backend.get_info(ctx.repo_name(), &ctx.path).await?;
    if info.is_dir {
        return Ok(finish(
            dav_builder(StatusCode::OK).header(CONTENT_TYPE, info.content_type.as_str()),
            Body::empty(),
        ));
    }
    Ok(finish(file_headers(&info), Body::empty()))
}

fn file_headers(info: &FileObject) -> http::response::Builder {
    dav_builder(StatusCode::OK)
        .header(CONTENT_TYPE, info.content_type.as_str())
        .header(CONTENT_LENGTH, info.size)
        .header(LAST_MODIFIED, format_http_date(&info.modified))
}

/// Handle a PUT request. Chunked and fixed-length bodies are both
/// consumed as a stream.
pub async fn handle_put(ctx: &DavContext<'_>, body: Body) -> AppResult<Response<Body>> {
    if path::is_root(&ctx.path) {
        return Err(AppError::conflict("Cannot PUT to a collection"));
    }

    let previous_size = match ctx.backend.get_info(ctx.repo_name(), &ctx.path).await {
        Ok(existing) if existing.is_dir => {
            return Err(AppError::conflict(format!(
                "'{}' is a collection",
                ctx.path
            )));
        }
        Ok(existing) => existing.size,
        Err(e) if e.is_not_found() => 0,
        Err(e) => return Err(e),
    };

    let stream: ByteStream = Box::pin(body.into_data_stream().map_err(io::Error::other));
    let written = ctx
        .backend
        .put_file(ctx.repo_name(), &ctx.path, stream)
        .await?;

    ctx.adjust_quota(written as i64 - previous_size as i64).await;
    info!(
        user = %ctx.user.username,
        path = %ctx.path,
        size = written,
        "Stored file via WebDAV"
    );

    Ok(empty_response(StatusCode::CREATED))
}
