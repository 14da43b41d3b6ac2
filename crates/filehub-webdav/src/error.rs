//! Mapping of [`AppError`] onto WebDAV status codes.

use axum::body::Body;
use http::{Response, StatusCode};

use filehub_core::error::{AppError, ErrorKind};

use crate::response::xml_error_response;

/// Status code for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NotADirectory | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization | ErrorKind::CrossRepository => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Storage
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// XML error response for `err`.
///
/// Server-side failures are logged and reported with a generic reason so
/// filesystem paths do not leak to clients.
pub fn error_response(err: &AppError) -> Response<Body> {
    let status = status_for(err.kind);
    if status.is_server_error() {
        tracing::error!(error = %err, "WebDAV request failed");
        xml_error_response(status, "Internal server error")
    } else {
        tracing::debug!(error = %err, "WebDAV request rejected");
        xml_error_response(status, &err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_table() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::NotADirectory), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::CrossRepository), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::Storage),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_are_generic() {
        let response = error_response(&AppError::storage("/srv/filehub/alice: disk full"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
