use async_trait::async_trait;
use prefkit_security::Principal;

use crate::errors::AuthError;

/// Authentication oracle: resolves a bearer token to the principal it was
/// issued for.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}
