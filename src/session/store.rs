//! User-store collaborators consumed by the session flows.

use std::future::Future;

use super::error::AuthError;
use super::issuer::Identity;

/// Verifies login credentials. Unknown email and wrong password must both
/// fail with `AuthError::InvalidCredentials`.
pub trait CredentialCheck {
    fn credential_check(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;
}

/// Looks up a user by id, failing with `AuthError::UnknownUser`.
pub trait UserLookup {
    fn lookup_user(&self, id: i64) -> impl Future<Output = Result<Identity, AuthError>> + Send;
}
