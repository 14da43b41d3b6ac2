//! `Authorization: Digest` parsing and response verification (RFC 2617).

use std::collections::HashMap;

use filehub_core::error::AppError;
use filehub_core::result::AppResult;

use crate::password::{constant_time_eq, md5_hex};

/// Fields of a Digest `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCredentials {
    pub username: String,
    pub realm: Option<String>,
    pub nonce: String,
    pub uri: String,
    pub response: String,
    pub qop: Option<String>,
    pub nc: Option<String>,
    pub cnonce: Option<String>,
    pub opaque: Option<String>,
    pub algorithm: Option<String>,
}

impl DigestCredentials {
    /// Parses the part of the header after `Digest `.
    ///
    /// Fails with a validation error when a pair is malformed or a
    /// required field (`username`, `nonce`, `uri`, `response`) is missing.
    pub fn parse(params: &str) -> AppResult<Self> {
        let mut params = parse_params(params)?;
        let mut required = |key: &str| {
            params
                .remove(key)
                .ok_or_else(|| AppError::validation(format!("Digest header is missing '{key}'")))
        };
        let username = required("username")?;
        let nonce = required("nonce")?;
        let uri = required("uri")?;
        let response = required("response")?;

        Ok(Self {
            username,
            nonce,
            uri,
            response,
            realm: params.remove("realm"),
            qop: params.remove("qop"),
            nc: params.remove("nc"),
            cnonce: params.remove("cnonce"),
            opaque: params.remove("opaque"),
            algorithm: params.remove("algorithm"),
        })
    }

    /// The response a client holding `ha1` should have sent for `method`.
    ///
    /// Returns `None` for an unsupported algorithm or qop, or when
    /// `qop=auth` is missing `nc`/`cnonce`. Without `qop` the RFC 2069
    /// form `MD5(HA1:nonce:HA2)` is used.
    pub fn expected_response(&self, method: &str, ha1: &str) -> Option<String> {
        if let Some(algorithm) = &self.algorithm {
            if !algorithm.eq_ignore_ascii_case("MD5") {
                return None;
            }
        }

        let ha2 = md5_hex(&format!("{method}:{}", self.uri));
        match self.qop.as_deref() {
            None => Some(md5_hex(&format!("{ha1}:{}:{ha2}", self.nonce))),
            Some(qop) if qop.eq_ignore_ascii_case("auth") => {
                let nc = self.nc.as_deref()?;
                let cnonce = self.cnonce.as_deref()?;
                Some(md5_hex(&format!(
                    "{ha1}:{}:{nc}:{cnonce}:{qop}:{ha2}",
                    self.nonce
                )))
            }
            Some(_) => None,
        }
    }

    /// Whether the client's response matches the one computed from `ha1`.
    pub fn verify(&self, method: &str, ha1: &str) -> bool {
        match self.expected_response(method, &ha1.to_ascii_lowercase()) {
            Some(expected) => constant_time_eq(&expected, &self.response.to_ascii_lowercase()),
            None => false,
        }
    }

    /// Whether the signed `uri` names `request_target` (the request's
    /// path and query). An absolute-form `uri` is compared by its path.
    pub fn uri_matches(&self, request_target: &str) -> bool {
        let claimed = self.uri.as_str();
        let claimed = match claimed
            .strip_prefix("http://")
            .or_else(|| claimed.strip_prefix("https://"))
        {
            Some(rest) => rest.find('/').map_or("/", |idx| &rest[idx..]),
            None => claimed,
        };
        claimed == request_target
    }
}

/// The `WWW-Authenticate` value for a Digest challenge.
pub fn digest_challenge(realm: &str, nonce: &str, opaque: &str) -> String {
    format!(
        "Digest realm=\"{}\", nonce=\"{nonce}\", opaque=\"{opaque}\", algorithm=MD5, qop=\"auth\"",
        quote_escape(realm)
    )
}

/// The `WWW-Authenticate` value for a Basic challenge.
pub fn basic_challenge(realm: &str) -> String {
    format!("Basic realm=\"{}\"", quote_escape(realm))
}

fn quote_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Splits `key=value, key="quoted value"` pairs. Keys are lower-cased and
/// quoted values unescaped.
pub fn parse_params(input: &str) -> AppResult<HashMap<String, String>> {
    let malformed = || AppError::validation("Malformed Digest authorization header");
    let mut params = HashMap::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ',' || c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && *c != ',' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if key.is_empty() || chars.next() != Some('=') {
            return Err(malformed());
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => value.push(c),
                }
            }
            if !closed {
                return Err(malformed());
            }
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if !matches!(chars.peek(), None | Some(',')) {
                return Err(malformed());
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                value.push(c);
            }
            let trimmed = value.trim_end();
            if trimmed.is_empty() {
                return Err(malformed());
            }
            value = trimmed.to_string();
        }

        params.insert(key.to_ascii_lowercase(), value);
    }

    Ok(params)
}
