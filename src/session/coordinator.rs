//! Login and refresh flows. Logout needs no coordination: it is
//! `cookie::expired` on its own.
//!
//! Every flow either yields a complete new pair together with its cookie or
//! fails without producing any cookie. Refresh tokens are not tracked
//! server-side: an older refresh token stays valid until its own expiry even
//! after the client has rotated to a newer one.

use time::OffsetDateTime;
use tracing::{debug, info};

use super::authenticator::verify_claims;
use super::config::SessionConfig;
use super::cookie::{self, RefreshCookie};
use super::error::AuthError;
use super::issuer::{Identity, TokenPair, issue_pair};
use super::store::{CredentialCheck, UserLookup};
use crate::jwt::{self, TokenType};

/// A freshly issued pair and the cookie carrying its refresh token.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub pair: TokenPair,
    pub cookie: RefreshCookie,
}

pub struct SessionCoordinator<'a, S> {
    config: &'a SessionConfig,
    store: &'a S,
}

impl<'a, S> SessionCoordinator<'a, S> {
    pub fn new(config: &'a SessionConfig, store: &'a S) -> Self {
        Self { config, store }
    }

    fn issue(&self, identity: &Identity, now: OffsetDateTime) -> Result<IssuedSession, AuthError> {
        let pair = issue_pair(identity, self.config, now)?;
        let cookie = cookie::bind(&pair.refresh_token, self.config, now);
        Ok(IssuedSession { pair, cookie })
    }
}

impl<S: CredentialCheck> SessionCoordinator<'_, S> {
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<IssuedSession, AuthError> {
        let identity = self.store.credential_check(email, password).await?;
        let session = self.issue(&identity, now)?;
        info!(user_id = identity.id, "User logged in");
        Ok(session)
    }
}

impl<S: UserLookup> SessionCoordinator<'_, S> {
    /// Rotate a session from the refresh cookie value.
    pub async fn refresh(
        &self,
        refresh_cookie: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<IssuedSession, AuthError> {
        let token = refresh_cookie
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::NoCookie)?;

        let claims = jwt::decode(token, self.config.keys(), now)?;
        let subject = verify_claims(&claims, TokenType::Refresh, self.config)?;

        let identity = self.store.lookup_user(subject.id).await?;
        let session = self.issue(&identity, now)?;
        debug!(user_id = identity.id, "Session refreshed");
        Ok(session)
    }
}
