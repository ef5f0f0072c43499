//! Process-wide session configuration.
//!
//! Built once at startup, validated, then shared behind an `Arc`. Nothing
//! mutates it afterwards, so request handlers read it without locking.

use time::Duration;

use crate::jwt::JwtKeys;

/// Default access token lifetime: 15 minutes
pub const DEFAULT_ACCESS_TTL: Duration = Duration::minutes(15);

/// Default refresh token lifetime: 24 hours
pub const DEFAULT_REFRESH_TTL: Duration = Duration::hours(24);

/// Default name of the refresh cookie.
pub const DEFAULT_COOKIE_NAME: &str = "__Host-refresh_token";

/// Longest accepted token lifetime: 10 years
pub const MAX_TTL: Duration = Duration::days(3650);

const HOST_PREFIX: &str = "__Host-";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    issuer: String,
    audience: String,
    keys: JwtKeys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    cookie_name: String,
    cookie_path: String,
    cookie_domain: Option<String>,
}

/// Reasons a session configuration is rejected at startup.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT secret must not be empty")]
    EmptySecret,
    #[error("{0} TTL must be positive")]
    NonPositiveTtl(&'static str),
    #[error("{0} TTL must not exceed 10 years")]
    TtlTooLarge(&'static str),
    #[error("refresh TTL must not be shorter than access TTL")]
    RefreshShorterThanAccess,
    #[error("cookie name must not be empty")]
    EmptyCookieName,
    #[error("cookies prefixed with __Host- must not set a domain")]
    HostCookieWithDomain,
    #[error("cookies prefixed with __Host- must use path \"/\"")]
    HostCookieWithPath,
}

impl SessionConfig {
    /// Create a configuration with default lifetimes and cookie settings.
    pub fn new(secret: &[u8], issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            keys: JwtKeys::new(secret),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_path: "/".to_string(),
            cookie_domain: None,
        }
    }

    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn with_cookie(
        mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        domain: Option<String>,
    ) -> Self {
        self.cookie_name = name.into();
        self.cookie_path = path.into();
        self.cookie_domain = domain.filter(|d| !d.is_empty());
        self
    }

    /// Check the invariants every component relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keys.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if !self.access_ttl.is_positive() {
            return Err(ConfigError::NonPositiveTtl("access"));
        }
        if !self.refresh_ttl.is_positive() {
            return Err(ConfigError::NonPositiveTtl("refresh"));
        }
        if self.access_ttl > MAX_TTL {
            return Err(ConfigError::TtlTooLarge("access"));
        }
        if self.refresh_ttl > MAX_TTL {
            return Err(ConfigError::TtlTooLarge("refresh"));
        }
        if self.refresh_ttl < self.access_ttl {
            return Err(ConfigError::RefreshShorterThanAccess);
        }
        if self.cookie_name.is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }
        if self.cookie_name.starts_with(HOST_PREFIX) {
            if self.cookie_domain.is_some() {
                return Err(ConfigError::HostCookieWithDomain);
            }
            if self.cookie_path != "/" {
                return Err(ConfigError::HostCookieWithPath);
            }
        }
        Ok(())
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn cookie_path(&self) -> &str {
        &self.cookie_path
    }

    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }
}
