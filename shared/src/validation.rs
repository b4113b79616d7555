//! Input validation functions
//!
//! Every auth request is validated here before it reaches the
//! credential checks. Failures carry the offending field name so the
//! API can report field-level detail.

use crate::errors::FieldError;
use crate::types::{LoginRequest, RegisterRequest};
use once_cell::sync::Lazy;
use validator::ValidateEmail;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 32;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const FULL_NAME_MAX_LEN: usize = 100;

static USERNAME_CHARS: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid")
});

/// Validate username length
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(format!(
            "Username must be at least {} characters",
            USERNAME_MIN_LEN
        ));
    }
    if len > USERNAME_MAX_LEN {
        return Err("Username too long".to_string());
    }
    Ok(())
}

/// Validate username length and character set (registration only)
pub fn validate_new_username(username: &str) -> Result<(), String> {
    validate_username(username)?;
    if !USERNAME_CHARS.is_match(username) {
        return Err(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        );
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        ));
    }
    if password.len() > PASSWORD_MAX_LEN {
        return Err("Password too long".to_string());
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if email.len() > 255 {
        return Err("Email too long".to_string());
    }
    if !email.validate_email() {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate display name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    if full_name.trim().is_empty() {
        return Err("Full name cannot be empty".to_string());
    }
    if full_name.chars().count() > FULL_NAME_MAX_LEN {
        return Err("Full name too long".to_string());
    }
    Ok(())
}

fn field(name: &str, result: Result<(), String>) -> Result<(), FieldError> {
    result.map_err(|message| FieldError::new(name, message))
}

/// Validate a login request, field by field
pub fn validate_login(req: &LoginRequest) -> Result<(), FieldError> {
    field("username", validate_username(&req.username))?;
    field("password", validate_password(&req.password))?;
    Ok(())
}

/// Validate a registration request, field by field
pub fn validate_register(req: &RegisterRequest) -> Result<(), FieldError> {
    field("username", validate_new_username(&req.username))?;
    field("email", validate_email(&req.email))?;
    field("password", validate_password(&req.password))?;
    field("full_name", validate_full_name(&req.full_name))?;
    Ok(())
}
