use secrecy::SecretString;
use serde::{Deserialize, Serialize, Serializer};

/// Authentication settings of the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Paths served without a token, matched exactly.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Tokens accepted by the static validator.
    #[serde(default)]
    pub tokens: Vec<StaticTokenConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            public_paths: default_public_paths(),
            tokens: Vec::new(),
        }
    }
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_owned()]
}

/// A bearer token and the principal it authenticates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticTokenConfig {
    #[serde(serialize_with = "serialize_redacted")]
    pub token: SecretString,
    pub username: String,
    #[serde(default)]
    pub authorities: Vec<String>,
}

/// Serialize a secret as a fixed placeholder, for configuration dumps.
///
/// # Errors
/// Propagates the serializer's error.
pub fn serialize_redacted<S: Serializer>(_secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}
