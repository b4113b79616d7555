//! API request and response types

use crate::models::{AuthSource, UserView};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Login request
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration request
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Successful login response: the account plus a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Freshly issued bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Identity resolved for the current request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user: UserView,
    pub source: AuthSource,
}

/// Generic acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req = LoginRequest {
            username: "alice".to_string(),
            password: "Secret123".to_string(),
        };
        let debug_str = format!("{:?}", req);
        assert!(debug_str.contains("alice"));
        assert!(!debug_str.contains("Secret123"));
    }

    #[test]
    fn test_register_request_debug_redacts_password() {
        let req = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Secret123".to_string(),
            full_name: "Alice".to_string(),
        };
        assert!(!format!("{:?}", req).contains("Secret123"));
    }

    #[test]
    fn test_error_detail_omits_missing_field() {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: "UNAUTHORIZED".to_string(),
                message: "incorrect username or password".to_string(),
                field: None,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["error"].get("field").is_none());
    }
}
