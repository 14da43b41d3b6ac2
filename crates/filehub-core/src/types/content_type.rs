//! Extension-based content types.

/// Content type reported for directories.
pub const DIRECTORY_CONTENT_TYPE: &str = "httpd/unix-directory";

/// Content type for unknown extensions.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Resolve a content type from the (lower-cased) extension of `path`.
pub fn content_type_for(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path);
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    match ext.as_str() {
        "txt" => "text/plain",
        "htm" | "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for("/hello.txt"), "text/plain");
        assert_eq!(content_type_for("/site/index.HTM"), "text/html");
        assert_eq!(content_type_for("photo.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("/app.js"), "application/javascript");
    }

    #[test]
    fn test_unknown_extension_falls_back() {
        assert_eq!(content_type_for("/archive.tar.gz"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("/Makefile"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("/dir.txt/readme"), DEFAULT_CONTENT_TYPE);
    }
}
