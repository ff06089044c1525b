//! Authentication error types
//!
//! Display strings are the client-facing messages; internal variants are
//! masked by [`AuthError::client_message`].

use shamba_db::DbError;
use thiserror::Error;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    // =========================================================================
    // Token Errors
    // =========================================================================
    /// No bearer token on the request
    #[error("Not authorized, no token")]
    MissingToken,

    /// Token has expired
    #[error("Not authorized, token expired")]
    TokenExpired,

    /// Malformed header, bad signature or unreadable claims
    #[error("Not authorized, invalid token")]
    InvalidToken,

    /// Token is valid but its user is gone
    #[error("Not authorized, user not found")]
    UserNotFound,

    // =========================================================================
    // Credential Errors
    // =========================================================================
    /// Unknown email or wrong password; the two cases share one message
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Password hashing failed")]
    PasswordHashingFailed,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error (should not be exposed to clients)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::WeakPassword(_) => 400,

            Self::MissingToken | Self::TokenExpired | Self::InvalidToken | Self::UserNotFound => 401,

            Self::PasswordHashingFailed | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Machine-readable code (safe to expose)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::WeakPassword(_) => "WEAK_PASSWORD",
            Self::PasswordHashingFailed | Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Message for clients; never leaks internal details
    pub fn client_message(&self) -> String {
        if self.is_server_error() {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            _ => Self::InvalidToken,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 400);
        assert_eq!(AuthError::MissingToken.status_code(), 401);
        assert_eq!(AuthError::UserNotFound.status_code(), 401);
        assert_eq!(AuthError::Database("x".to_string()).status_code(), 500);
    }

    #[test]
    fn test_messages() {
        assert_eq!(AuthError::MissingToken.to_string(), "Not authorized, no token");
        assert_eq!(AuthError::TokenExpired.to_string(), "Not authorized, token expired");
        assert_eq!(AuthError::InvalidToken.to_string(), "Not authorized, invalid token");
        assert_eq!(AuthError::InvalidCredentials.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_client_message_hides_internal_details() {
        let err = AuthError::Database("connection string with password".to_string());
        assert_eq!(err.client_message(), "An internal error occurred");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
