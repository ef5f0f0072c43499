//! Refresh cookie binding.
//!
//! The refresh token is a long-lived bearer credential, so every cookie that
//! carries it is HttpOnly, Secure and SameSite=Strict. These attributes are
//! emitted unconditionally and cannot be configured.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use super::config::SessionConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub domain: Option<String>,
    pub expires: OffsetDateTime,
    pub max_age: Duration,
}

impl RefreshCookie {
    /// Whether this cookie instructs the client to delete its refresh cookie.
    pub fn is_expired(&self) -> bool {
        self.value.is_empty() && !self.max_age.is_positive()
    }

    pub fn into_cookie(self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name, self.value))
            .path(self.path)
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .expires(self.expires)
            .max_age(self.max_age);
        if let Some(domain) = self.domain {
            builder = builder.domain(domain);
        }
        builder.build()
    }
}

/// Wrap a refresh token in a cookie whose lifetime matches the token's,
/// both measured from `now`.
pub fn bind(refresh_token: &str, config: &SessionConfig, now: OffsetDateTime) -> RefreshCookie {
    RefreshCookie {
        name: config.cookie_name().to_string(),
        value: refresh_token.to_string(),
        path: config.cookie_path().to_string(),
        domain: config.cookie_domain().map(str::to_string),
        expires: now + config.refresh_ttl(),
        max_age: config.refresh_ttl(),
    }
}

/// Cookie that clears the client's refresh cookie.
pub fn expired(config: &SessionConfig) -> RefreshCookie {
    RefreshCookie {
        name: config.cookie_name().to_string(),
        value: String::new(),
        path: config.cookie_path().to_string(),
        domain: config.cookie_domain().map(str::to_string),
        expires: OffsetDateTime::UNIX_EPOCH,
        max_age: Duration::ZERO,
    }
}
