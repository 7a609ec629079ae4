use preferences_sdk::PreferenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Malformed document: {0}")]
    Deserialization(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Preference store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }
}

impl From<DomainError> for PreferenceError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation { field, message } => Self::validation(field, message),
            DomainError::Deserialization(message) => Self::Deserialization { message },
            DomainError::NotFound { entity, key } => Self::not_found(entity, key),
            DomainError::Unauthenticated => Self::Unauthenticated,
            DomainError::Forbidden(reason) => Self::forbidden(reason),
            DomainError::StoreUnavailable(_) => Self::StoreUnavailable,
            DomainError::Internal(_) => Self::Internal,
        }
    }
}
