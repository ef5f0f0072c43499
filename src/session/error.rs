//! Session error taxonomy and its HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::JsonMessage;
use crate::jwt::TokenError;

/// Every way a session operation can fail. All are terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no refresh cookie on request")]
    NoCookie,
    #[error("no bearer access token on request")]
    MissingAccessToken,
    #[error("token is malformed or its signature does not verify")]
    InvalidToken,
    #[error("session expired")]
    SessionExpired,
    #[error("unknown user")]
    UnknownUser,
    #[error("token issuer mismatch")]
    WrongIssuer,
    #[error("token audience mismatch")]
    WrongAudience,
    #[error("failed to sign token")]
    SigningFailed,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user store unavailable")]
    Storage,
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed(_) | TokenError::BadSignature => AuthError::InvalidToken,
            TokenError::Expired => AuthError::SessionExpired,
            TokenError::Encoding(e) => {
                tracing::error!(error = %e, "Failed to encode token");
                AuthError::SigningFailed
            }
        }
    }
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::SigningFailed | AuthError::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-facing message. Session failures share one message so the
    /// response does not reveal which check failed.
    fn message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid credentials",
            AuthError::SigningFailed | AuthError::Storage => "internal error",
            _ => "invalid session",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = ?self, "Session operation failed");
        } else {
            tracing::debug!(kind = ?self, "Session rejected");
        }

        (status, Json(JsonMessage::error(self.message()))).into_response()
    }
}
