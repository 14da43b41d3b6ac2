//! WebDAV request handler: resolves the caller's repository and
//! dispatches on the method name.

use std::sync::Arc;

use axum::body::Body;
use http::{Method, Request, Response};
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use filehub_core::error::AppError;
use filehub_core::result::AppResult;
use filehub_core::types::path;
use filehub_database::directory::{RepositoryDirectory, UserDirectory};
use filehub_entity::repository::Repository;
use filehub_entity::user::User;
use filehub_storage::{StorageBackend, StorageManager};

use crate::error::error_response;
use crate::methods;
use crate::properties::Depth;
use crate::response::{method_not_allowed, options_response};

/// URL prefix the adapter is mounted under.
pub const DAV_PREFIX: &str = "/dav";

/// Everything a verb implementation needs for one request.
#[derive(Debug)]
pub struct DavContext<'a> {
    /// Authenticated caller.
    pub user: &'a User,
    /// The caller's home repository.
    pub repo: Repository,
    /// Backend serving `repo`.
    pub backend: Arc<StorageBackend>,
    /// Cleaned, repository-relative request path.
    pub path: String,
    /// Mount prefix, used to build hrefs and resolve destinations.
    pub prefix: &'a str,
    users: &'a dyn UserDirectory,
}

impl DavContext<'_> {
    /// Repository name passed to the backend.
    pub fn repo_name(&self) -> &str {
        &self.repo.name
    }

    /// Apply a change to the caller's quota counter. Failures are logged.
    pub async fn adjust_quota(&self, delta: i64) {
        if delta == 0 {
            return;
        }
        if let Err(e) = self.users.adjust_used_bytes(self.user.id, delta).await {
            warn!(user_id = %self.user.id, delta, error = %e, "Failed to update used bytes");
        }
    }
}

/// WebDAV request handler.
#[derive(Debug, Clone)]
pub struct DavHandler {
    storage: StorageManager,
    repositories: Arc<dyn RepositoryDirectory>,
    users: Arc<dyn UserDirectory>,
    prefix: String,
}

impl DavHandler {
    /// Create a handler mounted at [`DAV_PREFIX`].
    pub fn new(
        storage: StorageManager,
        repositories: Arc<dyn RepositoryDirectory>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            storage,
            repositories,
            users,
            prefix: DAV_PREFIX.to_string(),
        }
    }

    /// Mount prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Handle a request on behalf of an authenticated `user`.
    pub async fn handle(&self, user: &User, req: Request<Body>) -> Response<Body> {
        match self.dispatch(user, req).await {
            Ok(response) => response,
            Err(e) => error_response(&e),
        }
    }

    async fn dispatch(&self, user: &User, req: Request<Body>) -> AppResult<Response<Body>> {
        let (parts, body) = req.into_parts();
        let method = parts.method.as_str();

        if parts.method == Method::OPTIONS {
            return Ok(options_response());
        }
        if !matches!(
            method,
            "PROPFIND" | "GET" | "HEAD" | "PUT" | "DELETE" | "MKCOL" | "COPY" | "MOVE"
        ) {
            return Ok(method_not_allowed(method));
        }

        let path = self.relative_path(parts.uri.path())?;
        debug!(method, user = %user.username, path = %path, "WebDAV request");
        let ctx = self.context(user, path).await?;

        match method {
            "PROPFIND" => {
                let depth = Depth::from_header(
                    parts.headers.get("Depth").and_then(|v| v.to_str().ok()),
                )?;
                methods::handle_propfind(&ctx, depth).await
            }
            "GET" => methods::handle_get(&ctx).await,
            "HEAD" => methods::handle_head(&ctx).await,
            "PUT" => methods::handle_put(&ctx, body).await,
            "DELETE" => methods::handle_delete(&ctx).await,
            "MKCOL" => methods::handle_mkcol(&ctx, &parts.headers).await,
            "COPY" => methods::handle_copy(&ctx, &parts.headers).await,
            "MOVE" => methods::handle_move(&ctx, &parts.headers).await,
            _ => Ok(method_not_allowed(method)),
        }
    }

    /// Strip the mount prefix, percent-decode and clean.
    pub fn relative_path(&self, uri_path: &str) -> AppResult<String> {
        let rest = match uri_path.strip_prefix(self.prefix.trim_end_matches('/')) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => {
                return Err(AppError::not_found(format!(
                    "'{uri_path}' is not under {}",
                    self.prefix
                )));
            }
        };
        let decoded = percent_decode_str(rest)
            .decode_utf8()
            .map_err(|_| AppError::validation("Request path is not valid UTF-8"))?;
        Ok(path::clean_rooted(&decoded))
    }

    async fn context<'a>(&'a self, user: &'a User, path: String) -> AppResult<DavContext<'a>> {
        let repo = self
            .repositories
            .find_home(user.id)
            .await?
            .ok_or_else(|| AppError::authorization("No repository is assigned to this account"))?;
        let backend = self.storage.open(&repo).await?;

        Ok(DavContext {
            user,
            repo,
            backend,
            path,
            prefix: &self.prefix,
            users: self.users.as_ref(),
        })
    }
}
