//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use filehub_api::AppState;
use filehub_core::config::AppConfig;
use filehub_database::RepositoryDirectory;
use filehub_database::memory::{InMemoryRepositoryDirectory, InMemoryUserDirectory};
use filehub_entity::repository::CreateRepository;
use filehub_entity::user::User;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state behind the router
    pub state: AppState,
    /// In-memory user directory
    pub users: Arc<InMemoryUserDirectory>,
    /// Directory that local repositories live under
    pub data_dir: PathBuf,
    _temp: tempfile::TempDir,
}

impl TestApp {
    /// An instance with no users, as on first start
    pub async fn empty() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let config = AppConfig {
            root_dir: vec![temp.path().to_path_buf()],
            ..AppConfig::default()
        };

        let users = Arc::new(InMemoryUserDirectory::new());
        let repositories = Arc::new(InMemoryRepositoryDirectory::new());
        let state = AppState::new(config, users.clone(), repositories);
        let router = filehub_api::build_app(state.clone());

        Self {
            router,
            state,
            users,
            data_dir: temp.path().join("data"),
            _temp: temp,
        }
    }

    /// An instance with `alice` / `s3cret` and her home repository
    pub async fn new() -> Self {
        let app = Self::empty().await;
        app.create_user("alice", "s3cret").await;
        app
    }

    /// Create a user with a home repository under `data_dir`
    pub async fn create_user(&self, username: &str, password: &str) -> User {
        let user = self
            .state
            .credentials
            .create_user(username, password, false)
            .await
            .expect("Failed to create test user");

        self.state
            .repositories
            .create(CreateRepository {
                owner_id: user.id,
                name: user.username.clone(),
                root_uri: format!("file://{}", self.data_dir.display()),
            })
            .await
            .expect("Failed to create test repository");

        user
    }

    /// Send a request through the router
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// JSON request helper for the `/api` surface
    pub async fn api(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            req = req.header("Cookie", cookie);
        }
        let body = match body {
            Some(json) => {
                req = req.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&json).expect("Failed to serialize body"))
            }
            None => Body::empty(),
        };
        self.send(req.body(body).expect("Failed to build request"))
            .await
    }

    /// Log in and return the `name=value` cookie pair
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .api(
                "POST",
                "/api/login",
                Some(serde_json::json!({ "username": username, "password": password })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "Login failed: {}", response.text());
        response
            .session_cookie()
            .expect("No session cookie in login response")
    }
}

/// `Authorization` value for HTTP Basic
pub fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{username}:{password}"))
    )
}

/// Request builder for a DAV verb with Basic credentials
pub fn dav(method: &str, path: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(path)
        .header("Authorization", basic("alice", "s3cret"))
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub body: Bytes,
}

impl TestResponse {
    /// Body as UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// Single header as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All `WWW-Authenticate` values
    pub fn challenges(&self) -> Vec<String> {
        self.headers
            .get_all("www-authenticate")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// All `Set-Cookie` values
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    /// `filehub_session=<id>` from `Set-Cookie`, if present
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with("filehub_session="))
            .and_then(|c| c.split(';').next().map(str::to_string))
    }
}

/// Quoted parameter from a challenge, e.g. `nonce="..."`
pub fn challenge_param(challenge: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=\"");
    let start = challenge.find(&marker)? + marker.len();
    let end = challenge[start..].find('"')? + start;
    Some(challenge[start..end].to_string())
}
