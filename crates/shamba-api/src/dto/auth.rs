//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::common::UserProfileDto;

// =============================================================================
// Registration
// =============================================================================

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name
    #[serde(default)]
    #[validate(length(min = 1, message = "Please add a name"))]
    pub name: String,
    /// Email address (unique)
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    /// Password
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    /// Phone number (optional)
    #[serde(default)]
    pub phone: Option<String>,
}

// =============================================================================
// Login
// =============================================================================

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address
    #[serde(default)]
    #[validate(length(min = 1, message = "Please enter your email"))]
    pub email: String,
    /// Password
    #[serde(default)]
    #[validate(length(min = 1, message = "Please enter your password"))]
    pub password: String,
}

/// Register/login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    /// Bearer token
    pub token: String,
    pub user: UserProfileDto,
}
