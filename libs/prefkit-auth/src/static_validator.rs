use std::collections::HashMap;

use async_trait::async_trait;
use prefkit_security::Principal;
use secrecy::ExposeSecret;

use crate::config::StaticTokenConfig;
use crate::errors::AuthError;
use crate::traits::TokenValidator;

/// Validator backed by a fixed token table, for development setups and tests.
#[derive(Default)]
pub struct StaticTokenValidator {
    principals: HashMap<String, Principal>,
}

impl StaticTokenValidator {
    #[must_use]
    pub fn new(tokens: &[StaticTokenConfig]) -> Self {
        let principals = tokens
            .iter()
            .map(|t| {
                let principal = Principal::builder()
                    .username(t.username.clone())
                    .authorities(t.authorities.iter().map(String::as_str))
                    .build();
                (t.token.expose_secret().to_owned(), principal)
            })
            .collect();
        Self { principals }
    }

    /// Register a token, replacing any principal already bound to it.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.principals.insert(token.into(), principal);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait]
impl TokenValidator for StaticTokenValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        self.principals
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use secrecy::SecretString;

    #[tokio::test]
    async fn resolves_configured_tokens() {
        let validator = StaticTokenValidator::new(&[StaticTokenConfig {
            token: SecretString::from("t-admin"),
            username: "adminTEST".to_owned(),
            authorities: vec!["SCOPE_cartera.read".to_owned(), "ROLE_ADMINLEGO".to_owned()],
        }]);

        let principal = validator.validate("t-admin").await.unwrap();
        assert_eq!(principal.username(), "adminTEST");
        assert!(principal.has_scope("cartera.read"));
        assert!(principal.has_role("ADMINLEGO"));
    }

    #[tokio::test]
    async fn rejects_unknown_tokens() {
        let validator = StaticTokenValidator::default()
            .with_token("known", Principal::builder().username("u").build());
        assert_eq!(validator.len(), 1);

        let err = validator.validate("other").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
