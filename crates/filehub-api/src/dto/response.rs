//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use filehub_entity::user::User;

/// Body of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub username: String,
    pub is_admin: bool,
}

/// A user as shown to the browser UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Whether the user administers the instance.
    pub is_admin: bool,
    /// Bytes counted against the user's quota.
    pub used_bytes: i64,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful password login.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_admin: user.is_admin,
            used_bytes: user.used_bytes,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Whether the instance still needs its first administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupStatusResponse {
    pub needs_setup: bool,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
}
