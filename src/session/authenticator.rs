//! Access token validation for protected routes.
//!
//! The access token only ever arrives as `Authorization: Bearer <token>`.
//! The refresh cookie is never consulted here.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use time::OffsetDateTime;

use super::config::SessionConfig;
use super::error::AuthError;
use super::issuer::Identity;
use crate::jwt::{self, Claims, TokenType};

/// Trait for state types that carry the session configuration.
pub trait HasSessionConfig {
    fn session(&self) -> &Arc<SessionConfig>;
}

/// Implement `HasSessionConfig` for a state struct with a
/// `session: Arc<SessionConfig>` field.
#[macro_export]
macro_rules! impl_has_session_config {
    ($state_type:ty) => {
        impl $crate::session::HasSessionConfig for $state_type {
            fn session(&self) -> &::std::sync::Arc<$crate::session::SessionConfig> {
                &self.session
            }
        }
    };
}

/// Validate an access token and return the identity it was issued for.
pub fn authorize(
    access_token: &str,
    config: &SessionConfig,
    now: OffsetDateTime,
) -> Result<Identity, AuthError> {
    let claims = jwt::decode(access_token, config.keys(), now)?;
    verify_claims(&claims, TokenType::Access, config)
}

/// Checks shared by the authenticator and the refresh flow once the token's
/// signature and expiry have been verified.
pub(super) fn verify_claims(
    claims: &Claims,
    expected: TokenType,
    config: &SessionConfig,
) -> Result<Identity, AuthError> {
    if claims.token_type != expected {
        return Err(AuthError::InvalidToken);
    }
    if claims.iss != config.issuer() {
        return Err(AuthError::WrongIssuer);
    }
    if claims.aud != config.audience() {
        return Err(AuthError::WrongAudience);
    }
    parse_subject(&claims.sub).map(Identity::with_id)
}

/// The subject is a string-encoded positive user id.
pub(super) fn parse_subject(sub: &str) -> Result<i64, AuthError> {
    match sub.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AuthError::InvalidToken),
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extractor for endpoints that require a valid access token.
pub struct SessionUser(pub Identity);

impl<S> FromRequestParts<S> for SessionUser
where
    S: HasSessionConfig + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingAccessToken)?;
        authorize(token, state.session(), OffsetDateTime::now_utc()).map(SessionUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::unix_seconds;
    use crate::session::issue_pair;
    use axum::http::{HeaderValue, Request};
    use time::{Duration, macros::datetime};

    const NOW: OffsetDateTime = datetime!(2026-03-01 12:00 UTC);

    fn config() -> SessionConfig {
        SessionConfig::new(b"test-secret-key-for-testing", "example.com", "movies")
    }

    fn ada() -> Identity {
        Identity {
            id: 7,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    fn signed(claims: Claims, config: &SessionConfig) -> String {
        jwt::encode(&claims, config.keys()).unwrap()
    }

    fn access_claims(sub: &str) -> Claims {
        let iat = unix_seconds(NOW);
        Claims {
            sub: sub.to_string(),
            iss: "example.com".to_string(),
            aud: "movies".to_string(),
            iat,
            exp: iat + 60,
            token_type: TokenType::Access,
            jti: "jti".to_string(),
            name: None,
        }
    }

    #[test]
    fn test_fresh_access_token_authorizes() {
        let config = config();
        let pair = issue_pair(&ada(), &config, NOW).unwrap();

        assert_eq!(
            authorize(&pair.access_token, &config, NOW),
            Ok(Identity::with_id(7))
        );
    }

    #[test]
    fn test_expired_access_token() {
        let config = config();
        let pair = issue_pair(&ada(), &config, NOW).unwrap();
        let after = NOW + config.access_ttl() + Duration::seconds(1);

        assert_eq!(
            authorize(&pair.access_token, &config, after),
            Err(AuthError::SessionExpired)
        );
        assert!(authorize(&pair.access_token, &config, NOW + config.access_ttl()).is_ok());

        let half_second_late = NOW + config.access_ttl() + Duration::milliseconds(500);
        assert_eq!(
            authorize(&pair.access_token, &config, half_second_late),
            Err(AuthError::SessionExpired)
        );
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let config = config();
        let pair = issue_pair(&ada(), &config, NOW).unwrap();

        assert_eq!(
            authorize(&pair.refresh_token, &config, NOW),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_wrong_issuer_and_audience() {
        let config = config();

        let other_issuer = signed(
            Claims {
                iss: "elsewhere.com".to_string(),
                ..access_claims("7")
            },
            &config,
        );
        assert_eq!(
            authorize(&other_issuer, &config, NOW),
            Err(AuthError::WrongIssuer)
        );

        let other_audience = signed(
            Claims {
                aud: "billing".to_string(),
                ..access_claims("7")
            },
            &config,
        );
        assert_eq!(
            authorize(&other_audience, &config, NOW),
            Err(AuthError::WrongAudience)
        );
    }

    #[test]
    fn test_unparsable_subject() {
        let config = config();

        for sub in ["", "abc", "0", "-4", "7.5"] {
            let token = signed(access_claims(sub), &config);
            assert_eq!(
                authorize(&token, &config, NOW),
                Err(AuthError::InvalidToken),
                "subject {:?}",
                sub
            );
        }
    }

    #[test]
    fn test_tampered_signature() {
        let config = config();
        let pair = issue_pair(&ada(), &config, NOW).unwrap();
        let mut token = pair.access_token;
        let last = token.pop().unwrap();
        token.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(
            authorize(&token, &config, NOW),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_other_secret() {
        let pair = issue_pair(&ada(), &config(), NOW).unwrap();
        let other = SessionConfig::new(b"another-secret", "example.com", "movies");

        assert_eq!(
            authorize(&pair.access_token, &other, NOW),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let parts = |value: &'static str| {
            let (parts, _) = Request::builder()
                .header(header::AUTHORIZATION, HeaderValue::from_static(value))
                .body(())
                .unwrap()
                .into_parts();
            parts
        };

        assert_eq!(bearer_token(&parts("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&parts("Basic abc")), None);
        assert_eq!(bearer_token(&parts("Bearer ")), None);
        assert_eq!(bearer_token(&parts("Bearer")), None);

        let (no_header, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(bearer_token(&no_header), None);
    }

    #[test]
    fn test_concurrent_authorize() {
        let config = Arc::new(config());
        let token = issue_pair(&ada(), &config, NOW).unwrap().access_token;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let config = config.clone();
                let token = token.clone();
                std::thread::spawn(move || authorize(&token, &config, NOW))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(Identity::with_id(7)));
        }
    }
}
