//! Response builders shared by every verb.

use axum::body::Body;
use http::header::{ALLOW, CONTENT_TYPE};
use http::response::Builder;
use http::{HeaderName, Response, StatusCode};

/// Content type of every XML body.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Verbs answered by the adapter.
pub const ALLOWED_METHODS: &str = "OPTIONS, PROPFIND, GET, HEAD, PUT, DELETE, MKCOL, COPY, MOVE";

/// The `DAV` compliance header.
pub static DAV_HEADER: HeaderName = HeaderName::from_static("dav");

/// A builder preloaded with the status and `DAV: 1`.
pub fn dav_builder(status: StatusCode) -> Builder {
    Response::builder().status(status).header(&DAV_HEADER, "1")
}

/// Finish a builder, falling back to a bare 500 if a header was invalid.
pub fn finish(builder: Builder, body: Body) -> Response<Body> {
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build WebDAV response");
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

/// A response with no body.
pub fn empty_response(status: StatusCode) -> Response<Body> {
    finish(dav_builder(status), Body::empty())
}

/// A response carrying an XML document.
pub fn xml_response(status: StatusCode, xml: String) -> Response<Body> {
    finish(
        dav_builder(status).header(CONTENT_TYPE, XML_CONTENT_TYPE),
        Body::from(xml),
    )
}

/// `<error xmlns="DAV:">reason</error>`.
pub fn error_xml(reason: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<error xmlns=\"DAV:\">{}</error>\n",
        quick_xml::escape::escape(reason)
    )
}

/// An XML error response.
pub fn xml_error_response(status: StatusCode, reason: &str) -> Response<Body> {
    xml_response(status, error_xml(reason))
}

/// Reply to `OPTIONS`.
pub fn options_response() -> Response<Body> {
    finish(
        dav_builder(StatusCode::OK)
            .header(ALLOW, ALLOWED_METHODS)
            .header("MS-Author-Via", "DAV"),
        Body::empty(),
    )
}

/// Reply to a verb the adapter does not implement.
pub fn method_not_allowed(method: &str) -> Response<Body> {
    finish(
        dav_builder(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, ALLOWED_METHODS)
            .header(CONTENT_TYPE, XML_CONTENT_TYPE),
        Body::from(error_xml(&format!("Method {method} is not supported"))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_xml_escapes() {
        assert_eq!(
            error_xml("a <b> & c"),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<error xmlns=\"DAV:\">a &lt;b&gt; &amp; c</error>\n"
        );
    }

    #[test]
    fn test_headers() {
        let response = xml_error_response(StatusCode::NOT_FOUND, "gone");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["dav"], "1");
        assert_eq!(response.headers()[CONTENT_TYPE], XML_CONTENT_TYPE);

        let response = options_response();
        assert_eq!(response.headers()[ALLOW], ALLOWED_METHODS);

        let response = method_not_allowed("LOCK");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
