//! Error types for the Civic Board application

use thiserror::Error;

/// Message returned for every failed credential check.
///
/// Unknown usernames and wrong passwords share it so responses never
/// reveal whether an account exists.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "incorrect username or password";

/// Authentication error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("authentication required")]
    AuthenticationRequired,
}

/// A rejected input field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message_matches_constant() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            INVALID_CREDENTIALS_MESSAGE
        );
    }

    #[test]
    fn test_field_error_display() {
        let err = FieldError::new("password", "Password must be at least 8 characters");
        assert_eq!(err.to_string(), "password: Password must be at least 8 characters");
    }
}
