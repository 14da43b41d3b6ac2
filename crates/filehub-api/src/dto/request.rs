//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// First-run setup: creates the initial administrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetupRequest {
    /// Administrator username.
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    /// Administrator password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Root URI of the home repository. Defaults to the first `root_dir`.
    #[serde(default)]
    pub root_uri: Option<String>,
}
