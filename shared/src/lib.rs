//! Civic Board Shared Library
//!
//! Wire types, the auth error taxonomy, and input validation shared by
//! the backend and its clients.

pub mod errors;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use models::{AuthSource, Role, UserView};
pub use types::*;
