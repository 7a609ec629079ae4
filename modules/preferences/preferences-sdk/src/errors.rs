//! Error types for the preferences SDK.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Malformed preference document: {message}")]
    Deserialization { message: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied: {reason}")]
    Forbidden { reason: String },

    #[error("Preference store unavailable")]
    StoreUnavailable,

    #[error("Internal error")]
    Internal,
}

impl PreferenceError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }

    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// True for failures a caller may retry later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable)
    }
}
