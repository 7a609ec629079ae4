use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::authority::Authority;

/// `Principal` is the authenticated caller of a request or operation.
///
/// It is produced by a token validator and never inspected beyond its
/// username and granted authorities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    username: String,
    authorities: BTreeSet<Authority>,
}

impl Principal {
    /// Create a new `Principal` builder
    #[must_use]
    pub fn builder() -> PrincipalBuilder {
        PrincipalBuilder::default()
    }

    /// Get the username this principal acts as
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the granted authorities
    #[must_use]
    pub fn authorities(&self) -> &BTreeSet<Authority> {
        &self.authorities
    }

    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.authorities
            .iter()
            .any(|a| matches!(a, Authority::Scope(s) if s == scope))
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.authorities
            .iter()
            .any(|a| matches!(a, Authority::Role(r) if r == role))
    }

    /// True when the principal holds any of the given roles.
    #[must_use]
    pub fn has_any_role<I, S>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        roles.into_iter().any(|r| self.has_role(r.as_ref()))
    }
}

#[derive(Default)]
pub struct PrincipalBuilder {
    username: Option<String>,
    authorities: BTreeSet<Authority>,
}

impl PrincipalBuilder {
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn add_authority(mut self, authority: impl Into<Authority>) -> Self {
        self.authorities.insert(authority.into());
        self
    }

    #[must_use]
    pub fn authorities<I, A>(mut self, authorities: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Authority>,
    {
        self.authorities
            .extend(authorities.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn scope(self, scope: &str) -> Self {
        self.add_authority(Authority::scope(scope))
    }

    #[must_use]
    pub fn role(self, role: &str) -> Self {
        self.add_authority(Authority::role(role))
    }

    #[must_use]
    pub fn build(self) -> Principal {
        Principal {
            username: self.username.unwrap_or_default(),
            authorities: self.authorities,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn builder_collects_scopes_and_roles() {
        let principal = Principal::builder()
            .username("adminTEST")
            .authorities(["SCOPE_cartera.read", "ROLE_ADMINLEGO"])
            .build();

        assert_eq!(principal.username(), "adminTEST");
        assert!(principal.has_scope("cartera.read"));
        assert!(principal.has_role("ADMINLEGO"));
        assert!(!principal.has_role("cartera.read"));
        assert!(principal.has_any_role(["USER", "ADMINLEGO"]));
    }

    #[test]
    fn missing_username_defaults_to_empty() {
        let principal = Principal::builder().scope("cartera.read").build();
        assert_eq!(principal.username(), "");
        assert!(principal.has_scope("cartera.read"));
    }

    #[test]
    fn serializes_authorities_as_strings() {
        let principal = Principal::builder()
            .username("userTEST")
            .role("ADMINLEGO")
            .build();
        let json = serde_json::to_value(&principal).unwrap();
        assert_eq!(json["authorities"][0], "ROLE_ADMINLEGO");

        let back: Principal = serde_json::from_value(json).unwrap();
        assert_eq!(back, principal);
    }
}
