//! Stateless JWT session lifecycle.
//!
//! Login issues a short-lived access token (returned in the body and presented
//! back as a bearer token) and a long-lived refresh token (also set as an
//! HttpOnly cookie). Refresh validates the cookie and rotates both tokens.
//! Logout clears the cookie. No session state is kept server-side.

mod authenticator;
mod config;
mod coordinator;
mod cookie;
mod error;
mod issuer;
mod store;

pub use authenticator::{HasSessionConfig, SessionUser, authorize};
pub use config::{
    ConfigError, DEFAULT_ACCESS_TTL, DEFAULT_COOKIE_NAME, DEFAULT_REFRESH_TTL, MAX_TTL, SessionConfig,
};
pub use cookie::{RefreshCookie, bind, expired};
pub use coordinator::{IssuedSession, SessionCoordinator};
pub use error::AuthError;
pub use issuer::{Identity, TokenPair, issue_pair};
pub use store::{CredentialCheck, UserLookup};
