use std::fmt;

use serde::{Deserialize, Serialize};

const SCOPE_PREFIX: &str = "SCOPE_";
const ROLE_PREFIX: &str = "ROLE_";

/// A granted authority, parsed from its string form.
///
/// `SCOPE_cartera.read` is a scope, `ROLE_ADMINLEGO` is a role, anything else
/// is kept verbatim as [`Authority::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Authority {
    Scope(String),
    Role(String),
    Other(String),
}

impl Authority {
    #[must_use]
    pub fn scope(name: impl Into<String>) -> Self {
        Self::Scope(name.into())
    }

    #[must_use]
    pub fn role(name: impl Into<String>) -> Self {
        Self::Role(name.into())
    }

    /// Parse an authority string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(scope) = raw.strip_prefix(SCOPE_PREFIX) {
            Self::Scope(scope.to_owned())
        } else if let Some(role) = raw.strip_prefix(ROLE_PREFIX) {
            Self::Role(role.to_owned())
        } else {
            Self::Other(raw.to_owned())
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scope(s) => write!(f, "{SCOPE_PREFIX}{s}"),
            Self::Role(r) => write!(f, "{ROLE_PREFIX}{r}"),
            Self::Other(o) => f.write_str(o),
        }
    }
}

impl From<&str> for Authority {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Authority {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Authority> for String {
    fn from(authority: Authority) -> Self {
        authority.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scope_and_role_prefixes() {
        assert_eq!(
            Authority::parse("SCOPE_cartera.read"),
            Authority::scope("cartera.read")
        );
        assert_eq!(Authority::parse("ROLE_ADMINLEGO"), Authority::role("ADMINLEGO"));
        assert_eq!(
            Authority::parse("profile"),
            Authority::Other("profile".to_owned())
        );
    }

    #[test]
    fn display_restores_original_string() {
        for raw in ["SCOPE_cartera.read", "ROLE_ADMINLEGO", "openid"] {
            assert_eq!(Authority::parse(raw).to_string(), raw);
        }
    }
}
