//! Per-request authentication pipeline.
//!
//! Order: session cookie, then `Authorization: Basic`, then
//! `Authorization: Digest`. A successful Basic or Digest check never
//! creates a session; only the login endpoint does that.

use std::sync::Arc;

use http::header::{AUTHORIZATION, COOKIE};
use http::{HeaderMap, HeaderValue, StatusCode};
use tracing::{debug, warn};

use filehub_core::error::{AppError, ErrorKind};
use filehub_entity::user::User;

use crate::basic::decode_basic;
use crate::credentials::CredentialStore;
use crate::digest::{DigestCredentials, basic_challenge, digest_challenge};
use crate::nonce::NonceStore;
use crate::session::SessionStore;
use crate::token::random_token;

/// How a request proved its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// A live session cookie; carries the session id.
    Session(String),
    /// `Authorization: Basic`.
    Basic,
    /// `Authorization: Digest`.
    Digest,
}

/// The identity attached to an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub method: AuthMethod,
}

impl AuthenticatedUser {
    /// Session id when the request came in with a cookie.
    pub fn session_id(&self) -> Option<&str> {
        match &self.method {
            AuthMethod::Session(id) => Some(id),
            _ => None,
        }
    }
}

/// Why a request was not authenticated.
#[derive(Debug)]
pub enum AuthRejection {
    /// No usable credentials at all: 401 with both challenges.
    MissingCredentials,
    /// Basic credentials were wrong: 401 without a challenge.
    InvalidBasic,
    /// Digest credentials were wrong or stale: 401 with a fresh challenge.
    InvalidDigest,
    /// Malformed header or unknown scheme: 400.
    BadRequest(String),
    /// The user directory failed: 500.
    Internal(AppError),
}

impl AuthRejection {
    /// HTTP status for the rejection.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::InvalidBasic | Self::InvalidDigest => {
                StatusCode::UNAUTHORIZED
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable reason for the response body.
    pub fn message(&self) -> String {
        match self {
            Self::MissingCredentials => "Authentication required".to_string(),
            Self::InvalidBasic | Self::InvalidDigest => {
                crate::credentials::store::INVALID_CREDENTIALS.to_string()
            }
            Self::BadRequest(reason) => reason.clone(),
            Self::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// Resolves the user behind a request.
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Arc<CredentialStore>,
    sessions: Arc<SessionStore>,
    nonces: Arc<NonceStore>,
    cookie_name: String,
    opaque: String,
}

impl Authenticator {
    /// Creates a mediator. The Digest opaque value is fixed for the
    /// lifetime of the process.
    pub fn new(
        credentials: Arc<CredentialStore>,
        sessions: Arc<SessionStore>,
        nonces: Arc<NonceStore>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            nonces,
            cookie_name: cookie_name.into(),
            opaque: random_token(),
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn nonces(&self) -> &Arc<NonceStore> {
        &self.nonces
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// The realm used in challenges and HA1 values.
    pub fn realm(&self) -> &str {
        self.credentials.hasher().realm()
    }

    /// The opaque value sent with every Digest challenge.
    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Runs the pipeline for a request. `uri` is the request target
    /// (path and query) that a Digest `uri` parameter must name.
    pub async fn authenticate(
        &self,
        method: &str,
        uri: &str,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedUser, AuthRejection> {
        if let Some(id) = cookie_value(headers, &self.cookie_name) {
            if let Some(session) = self.sessions.get(&id).await {
                return Ok(AuthenticatedUser {
                    user: session.user,
                    method: AuthMethod::Session(session.id),
                });
            }
            debug!("Ignoring unknown or expired session cookie");
        }

        let Some(header) = headers.get(AUTHORIZATION) else {
            return Err(AuthRejection::MissingCredentials);
        };
        let header = header
            .to_str()
            .map_err(|_| AuthRejection::BadRequest("Invalid Authorization header".to_string()))?
            .trim();
        let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

        if scheme.eq_ignore_ascii_case("Basic") {
            self.authenticate_basic(params).await
        } else if scheme.eq_ignore_ascii_case("Digest") {
            self.authenticate_digest(method, uri, params).await
        } else {
            Err(AuthRejection::BadRequest(format!(
                "Unsupported authorization scheme '{scheme}'"
            )))
        }
    }

    async fn authenticate_basic(&self, params: &str) -> Result<AuthenticatedUser, AuthRejection> {
        let creds = decode_basic(params).map_err(|e| {
            debug!(error = %e, "Undecodable Basic credentials");
            AuthRejection::InvalidBasic
        })?;

        match self
            .credentials
            .authenticate(&creds.username, &creds.password)
            .await
        {
            Ok(user) => Ok(AuthenticatedUser {
                user,
                method: AuthMethod::Basic,
            }),
            Err(e) if e.kind == ErrorKind::Authentication => Err(AuthRejection::InvalidBasic),
            Err(e) => Err(AuthRejection::Internal(e)),
        }
    }

    async fn authenticate_digest(
        &self,
        method: &str,
        uri: &str,
        params: &str,
    ) -> Result<AuthenticatedUser, AuthRejection> {
        let creds = DigestCredentials::parse(params)
            .map_err(|e| AuthRejection::BadRequest(e.message))?;

        if creds.realm.as_deref().is_some_and(|r| r != self.realm())
            || creds.opaque.as_deref().is_some_and(|o| o != self.opaque)
        {
            return Err(AuthRejection::InvalidDigest);
        }
        if !creds.uri_matches(uri) {
            debug!(username = %creds.username, claimed = %creds.uri, "Digest uri does not match the request");
            return Err(AuthRejection::InvalidDigest);
        }
        if !self.nonces.is_valid(&creds.nonce).await {
            debug!(username = %creds.username, "Unknown or stale Digest nonce");
            return Err(AuthRejection::InvalidDigest);
        }

        let user = match self.credentials.find_by_username(&creds.username).await {
            Ok(Some(user)) if user.can_login() => user,
            Ok(_) => return Err(AuthRejection::InvalidDigest),
            Err(e) => return Err(AuthRejection::Internal(e)),
        };

        if !creds.verify(method, &user.ha1) {
            debug!(username = %user.username, "Digest response mismatch");
            return Err(AuthRejection::InvalidDigest);
        }

        Ok(AuthenticatedUser {
            user,
            method: AuthMethod::Digest,
        })
    }

    /// `WWW-Authenticate` values to attach to a rejection.
    ///
    /// Issues a fresh nonce whenever a Digest challenge is included.
    pub async fn challenges(&self, rejection: &AuthRejection) -> Vec<HeaderValue> {
        let values = match rejection {
            AuthRejection::MissingCredentials => {
                vec![self.digest_challenge().await, basic_challenge(self.realm())]
            }
            AuthRejection::InvalidDigest => vec![self.digest_challenge().await],
            _ => Vec::new(),
        };

        values
            .into_iter()
            .filter_map(|v| match HeaderValue::from_str(&v) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(error = %e, "Realm produced an invalid challenge header");
                    None
                }
            })
            .collect()
    }

    async fn digest_challenge(&self) -> String {
        let nonce = self.nonces.issue().await;
        digest_challenge(self.realm(), &nonce, &self.opaque)
    }
}

/// Value of the cookie called `name`, searching every `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
