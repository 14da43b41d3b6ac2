//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique login name, compared case-insensitively.
    pub username: String,
    /// Hex MD5 of `username:realm:password`.
    #[serde(skip_serializing)]
    pub ha1: String,
    /// Whether the account may authenticate.
    pub is_active: bool,
    /// Administrator flag.
    pub is_admin: bool,
    /// Bytes currently stored by this user.
    pub used_bytes: i64,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if the user can log in right now.
    pub fn can_login(&self) -> bool {
        self.is_active
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Pre-computed HA1.
    pub ha1: String,
    /// Administrator flag.
    pub is_admin: bool,
}
