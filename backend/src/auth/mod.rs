//! Authentication module
//!
//! Two independent trust mechanisms, server-side sessions (cookie) and
//! stateless bearer tokens (JWT), resolved per request in that order,
//! with argon2 password hashing underneath.

mod authenticator;
mod cookie;
mod jwt;
mod middleware;
mod password;
mod resolver;
mod session;

pub use authenticator::{AuthFailure, CredentialAuthenticator};
pub use cookie::SessionCookie;
pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{require_auth, AuthUser};
pub use password::{constant_time_eq, CredentialHasher, HashError, MIN_SALT_LEN};
pub use resolver::{bearer_token, resolve_identity, IdentityResolver, ResolvedIdentity};
pub use session::SessionManager;
