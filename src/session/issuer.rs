//! Access/refresh token pair issuance.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::config::SessionConfig;
use super::error::AuthError;
use crate::jwt::{self, Claims, TokenType, unix_seconds};

/// Minimal user projection carried into a token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Identity {
    /// Identity known only by its id, as recovered from a token.
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn display_name(&self) -> Option<String> {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mint an access token and a refresh token for `identity`, both issued at
/// `now` and signed with the configured secret.
pub fn issue_pair(
    identity: &Identity,
    config: &SessionConfig,
    now: OffsetDateTime,
) -> Result<TokenPair, AuthError> {
    if config.keys().is_empty() {
        return Err(AuthError::SigningFailed);
    }

    let iat = unix_seconds(now);
    let claims = |token_type: TokenType, ttl: time::Duration, name: Option<String>| Claims {
        sub: identity.id.to_string(),
        iss: config.issuer().to_string(),
        aud: config.audience().to_string(),
        iat,
        exp: iat + ttl.whole_seconds().max(1) as u64,
        token_type,
        jti: uuid::Uuid::new_v4().to_string(),
        name,
    };

    let access = claims(
        TokenType::Access,
        config.access_ttl(),
        identity.display_name(),
    );
    let refresh = claims(TokenType::Refresh, config.refresh_ttl(), None);

    Ok(TokenPair {
        access_token: jwt::encode(&access, config.keys())?,
        refresh_token: jwt::encode(&refresh, config.keys())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

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

    #[test]
    fn test_pair_claims() {
        let config = config();
        let pair = issue_pair(&ada(), &config, NOW).unwrap();

        let access = jwt::decode(&pair.access_token, config.keys(), NOW).unwrap();
        let refresh = jwt::decode(&pair.refresh_token, config.keys(), NOW).unwrap();

        assert_eq!(access.sub, "7");
        assert_eq!(refresh.sub, "7");
        assert_eq!(access.iss, "example.com");
        assert_eq!(access.aud, "movies");
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(refresh.token_type, TokenType::Refresh);
        assert_eq!(access.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(refresh.name, None);

        let iat = unix_seconds(NOW);
        assert_eq!(access.iat, iat);
        assert_eq!(refresh.iat, iat);
        assert_eq!(access.exp, iat + 15 * 60);
        assert_eq!(refresh.exp, iat + 24 * 60 * 60);
    }

    #[test]
    fn test_tokens_are_distinct() {
        let config = config();
        let first = issue_pair(&ada(), &config, NOW).unwrap();
        let second = issue_pair(&ada(), &config, NOW).unwrap();

        assert_ne!(first.access_token, first.refresh_token);
        assert_ne!(first.access_token, second.access_token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_independent_expiries() {
        let config = config().with_ttls(time::Duration::minutes(1), time::Duration::hours(1));
        let pair = issue_pair(&ada(), &config, NOW).unwrap();
        let later = NOW + time::Duration::minutes(2);

        assert!(matches!(
            jwt::decode(&pair.access_token, config.keys(), later),
            Err(jwt::TokenError::Expired)
        ));
        assert!(jwt::decode(&pair.refresh_token, config.keys(), later).is_ok());
    }

    #[test]
    fn test_nameless_identity() {
        let config = config();
        let pair = issue_pair(&Identity::with_id(3), &config, NOW).unwrap();
        let access = jwt::decode(&pair.access_token, config.keys(), NOW).unwrap();
        assert_eq!(access.name, None);
    }

    #[test]
    fn test_empty_secret_fails_signing() {
        let config = SessionConfig::new(b"", "example.com", "movies");
        assert_eq!(
            issue_pair(&ada(), &config, NOW),
            Err(AuthError::SigningFailed)
        );
    }
}
