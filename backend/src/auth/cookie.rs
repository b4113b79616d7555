//! Session cookie policy
//!
//! The cookie carries only the opaque session id, encrypted with the
//! session secret via `PrivateCookieJar`. It is always `HttpOnly`,
//! `Secure` in production, and lives as long as the session.

use axum_extra::extract::cookie::{Cookie, SameSite};

/// How the session cookie is built and cleared
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age_secs: i64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, secure: bool, max_age_secs: i64) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age_secs,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie delivering a session id to the client
    pub fn issue(&self, session_id: String) -> Cookie<'static> {
        Cookie::build((self.name.clone(), session_id))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age_secs))
            .build()
    }

    /// Cookie matching the issued one, for removal
    pub fn removal(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), "")).path("/").build()
    }
}
