//! JWT claim set and the signed token codec.
//!
//! Tokens are HS256 JWTs. Expiry is checked against a caller-supplied clock
//! so that issuance and validation can be tested at arbitrary instants.
//! Issuer and audience are left to the caller.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token presented as a bearer credential
    Access,
    /// Long-lived token that only ever travels in the refresh cookie
    Refresh,
}

/// The signed payload of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id, string-encoded)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// JWT ID, unique per minted token
    pub jti: String,
    /// Display name, only set on access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    empty: bool,
}

impl JwtKeys {
    /// Derive both keys from the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            empty: secret.is_empty(),
        }
    }

    /// Whether the keys were derived from an empty secret.
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The string is not a well-formed three-segment token
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),
    /// The signature does not verify against the secret
    #[error("token signature does not verify")]
    BadSignature,
    /// The token expired before `now`
    #[error("token expired")]
    Expired,
    /// Error encoding the token
    #[error("failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
}

/// Seconds since the Unix epoch, clamped at zero.
pub fn unix_seconds(at: OffsetDateTime) -> u64 {
    at.unix_timestamp().max(0) as u64
}

/// Sign a claim set.
pub fn encode(claims: &Claims, keys: &JwtKeys) -> Result<String, TokenError> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &keys.encoding_key)
        .map_err(TokenError::Encoding)
}

/// Verify a token's structure, signature and expiry at `now`.
pub fn decode(token: &str, keys: &JwtKeys, now: OffsetDateTime) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = jsonwebtoken::decode::<Claims>(token, &keys.decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed(e),
        })?;

    // Compared at full precision: a token is dead for any instant past `exp`.
    if now.unix_timestamp_nanos() > i128::from(token_data.claims.exp) * 1_000_000_000 {
        return Err(TokenError::Expired);
    }

    Ok(token_data.claims)
}
