//! COPY and MOVE method implementations (RFC 4918 Sections 9.8, 9.9).
//!
//! The `Overwrite` header is not consulted: an existing destination is
//! always replaced.

use axum::body::Body;
use http::{HeaderMap, Response, StatusCode};
use tracing::info;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::traits::storage::StorageProvider;
use filehub_core::types::path;

use crate::destination::parse_destination;
use crate::handler::DavContext;
use crate::response::empty_response;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Copy,
    Move,
}

impl Transfer {
    fn verb(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }
}

/// Handle a COPY request.
pub async fn handle_copy(ctx: &DavContext<'_>, headers: &HeaderMap) -> AppResult<Response<Body>> {
    transfer(ctx, headers, Transfer::Copy).await
}

/// Handle a MOVE request. On object stores this is copy-then-delete and
/// is not atomic.
pub async fn handle_move(ctx: &DavContext<'_>, headers: &HeaderMap) -> AppResult<Response<Body>> {
    transfer(ctx, headers, Transfer::Move).await
}

async fn transfer(
    ctx: &DavContext<'_>,
    headers: &HeaderMap,
    kind: Transfer,
) -> AppResult<Response<Body>> {
    let destination = parse_destination(headers, ctx.prefix)?;

    if path::is_root(&ctx.path) || path::is_root(&destination) {
        return Err(AppError::authorization(format!(
            "Cannot {} the repository root",
            kind.verb()
        )));
    }
    if destination == ctx.path {
        return Err(AppError::authorization(
            "Source and destination are the same",
        ));
    }

    ctx.backend.get_info(ctx.repo_name(), &ctx.path).await?;

    let parent = path::parent(&destination);
    if !path::is_root(&parent) {
        ctx.backend.create_dir(ctx.repo_name(), &parent).await?;
    }

    match kind {
        Transfer::Copy => {
            ctx.backend
                .copy_file(ctx.repo_name(), &ctx.path, &destination)
                .await?
        }
        Transfer::Move => {
            ctx.backend
                .move_file(ctx.repo_name(), &ctx.path, &destination)
                .await?
        }
    }

    info!(
        user = %ctx.user.username,
        from = %ctx.path,
        to = %destination,
        "{} completed",
        kind.verb()
    );

    Ok(empty_response(StatusCode::CREATED))
}
