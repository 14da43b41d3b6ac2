//! WebDAV property rendering and XML serialization (RFC 4918).

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use quick_xml::escape::escape;

use filehub_core::error::AppError;
use filehub_core::types::FileObject;

/// Bytes left unescaped in an href segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A resource as reported inside a multistatus `response`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResource {
    /// URL-quoted href; collections end in `/`.
    pub href: String,
    /// Display name.
    pub display_name: String,
    /// Whether this is a collection.
    pub is_collection: bool,
    /// Content length in bytes (0 for collections).
    pub content_length: u64,
    /// Content type.
    pub content_type: String,
    /// Last modified timestamp.
    pub last_modified: DateTime<Utc>,
}

impl DavResource {
    /// Describe a storage entry served under `prefix`.
    pub fn from_object(prefix: &str, object: &FileObject) -> Self {
        Self {
            href: href_for(prefix, &object.path, object.is_dir),
            display_name: if object.path == "/" {
                String::new()
            } else {
                object.name.clone()
            },
            is_collection: object.is_dir,
            content_length: if object.is_dir { 0 } else { object.size },
            content_type: object.content_type.clone(),
            last_modified: object.modified,
        }
    }
}

/// Build the href of a repository path, quoting each segment.
pub fn href_for(prefix: &str, path: &str, is_dir: bool) -> String {
    let mut href = prefix.trim_end_matches('/').to_string();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        href.push('/');
        href.extend(utf8_percent_encode(segment, SEGMENT));
    }
    if is_dir || href.is_empty() {
        href.push('/');
    }
    href
}

/// Format a timestamp as an HTTP date (RFC 1123, always GMT).
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Depth header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Only the resource itself.
    Zero,
    /// Resource and its immediate children.
    One,
}

impl Depth {
    /// Parse a `Depth` header. Absent and `infinity` both mean one level.
    pub fn from_header(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim) {
            Some("0") => Ok(Self::Zero),
            Some("1") | None => Ok(Self::One),
            Some(v) if v.eq_ignore_ascii_case("infinity") => Ok(Self::One),
            Some(other) => Err(AppError::validation(format!(
                "Invalid Depth header '{other}'"
            ))),
        }
    }
}

/// Render a `multistatus` document.
pub fn build_multistatus_xml(resources: &[DavResource]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<multistatus xmlns=\"DAV:\">\n");

    for resource in resources {
        xml.push_str("  <response>\n");
        xml.push_str(&format!("    <href>{}</href>\n", escape(&resource.href)));
        xml.push_str("    <propstat>\n");
        xml.push_str("      <prop>\n");
        xml.push_str(&format!(
            "        <displayname>{}</displayname>\n",
            escape(&resource.display_name)
        ));
        if resource.is_collection {
            xml.push_str("        <resourcetype><collection/></resourcetype>\n");
        } else {
            xml.push_str("        <resourcetype/>\n");
            xml.push_str(&format!(
                "        <getcontentlength>{}</getcontentlength>\n",
                resource.content_length
            ));
        }
        xml.push_str(&format!(
            "        <getlastmodified>{}</getlastmodified>\n",
            format_http_date(&resource.last_modified)
        ));
        xml.push_str(&format!(
            "        <getcontenttype>{}</getcontenttype>\n",
            escape(&resource.content_type)
        ));
        xml.push_str("      </prop>\n");
        xml.push_str("      <status>HTTP/1.1 200 OK</status>\n");
        xml.push_str("    </propstat>\n");
        xml.push_str("  </response>\n");
    }

    xml.push_str("</multistatus>\n");
    xml
}
