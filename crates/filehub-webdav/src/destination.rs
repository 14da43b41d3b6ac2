//! `Destination` header resolution for COPY and MOVE.

use http::HeaderMap;
use http::header::HOST;
use percent_encoding::percent_decode_str;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::types::path;

/// Read and resolve the `Destination` header of a request.
pub fn parse_destination(headers: &HeaderMap, prefix: &str) -> AppResult<String> {
    let raw = headers
        .get("Destination")
        .ok_or_else(|| AppError::validation("Missing Destination header"))?
        .to_str()
        .map_err(|_| AppError::validation("Destination header is not valid text"))?;
    let host = headers.get(HOST).and_then(|v| v.to_str().ok());
    resolve_destination(raw, host, prefix)
}

/// Turn an absolute URL or absolute path into a cleaned repository path.
///
/// A URL naming another host, or a path outside `prefix`, is a
/// cross-repository request. Dot segments after the prefix are resolved
/// inside the repository, as they are for the request path.
pub fn resolve_destination(raw: &str, request_host: Option<&str>, prefix: &str) -> AppResult<String> {
    let raw = raw.trim();
    let url_path = if let Some(rest) = raw
        .strip_prefix("http://")
        .or_else(|| raw.strip_prefix("https://"))
    {
        let (authority, url_path) = match rest.find('/') {
            Some(idx) => rest.split_at(idx),
            None => (rest, "/"),
        };
        if let Some(host) = request_host {
            if !authority.eq_ignore_ascii_case(host) {
                return Err(AppError::cross_repository(format!(
                    "Destination host '{authority}' is not this server"
                )));
            }
        }
        url_path
    } else if raw.starts_with('/') {
        raw
    } else {
        return Err(AppError::validation(
            "Destination must be an absolute URL or absolute path",
        ));
    };

    let url_path = url_path.split(['?', '#']).next().unwrap_or(url_path);
    let prefix = prefix.trim_end_matches('/');
    let rest = match url_path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => {
            return Err(AppError::cross_repository(format!(
                "Destination '{url_path}' is outside {prefix}"
            )));
        }
    };

    // Same order as request paths: strip the mount, then decode and clean.
    let decoded = percent_decode_str(rest)
        .decode_utf8()
        .map_err(|_| AppError::validation("Destination is not valid UTF-8"))?;
    Ok(path::clean_rooted(&decoded))
}
