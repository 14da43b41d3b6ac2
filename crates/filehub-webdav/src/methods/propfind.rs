//! PROPFIND method implementation (RFC 4918 Section 9.1).

use axum::body::Body;
use http::{Response, StatusCode};

use filehub_core::result::AppResult;
use filehub_core::traits::storage::StorageProvider;

use crate::handler::DavContext;
use crate::properties::{DavResource, Depth, build_multistatus_xml};
use crate::response::xml_response;

/// Handle a PROPFIND request. The request body is not inspected; every
/// supported property is returned.
pub async fn handle_propfind(ctx: &DavContext<'_>, depth: Depth) -> AppResult<Response<Body>> {
    let target = ctx.backend.get_info(ctx.repo_name(), &ctx.path).await?;

    let mut resources = vec![DavResource::from_object(ctx.prefix, &target)];
    if target.is_dir && depth == Depth::One {
        let children = ctx.backend.list_dir(ctx.repo_name(), &ctx.path).await?;
        resources.extend(
            children
                .iter()
                .map(|child| DavResource::from_object(ctx.prefix, child)),
        );
    }

    tracing::debug!(
        path = %ctx.path,
        depth = ?depth,
        count = resources.len(),
        "PROPFIND"
    );

    Ok(xml_response(
        StatusCode::MULTI_STATUS,
        build_multistatus_xml(&resources),
    ))
}
