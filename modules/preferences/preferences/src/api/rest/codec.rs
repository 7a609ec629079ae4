//! Aggregate to document conversion.

use preferences_sdk::{NamedPreference, PreferenceForm, PreferenceGrid};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::dto::{NamedPreferenceDto, PreferenceFormDto, PreferenceGridDto};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed document: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("document could not be written: {0}")]
    Write(#[source] serde_json::Error),
}

impl From<CodecError> for DomainError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Malformed(inner) => Self::Deserialization(inner.to_string()),
            CodecError::Write(inner) => Self::Internal(inner.to_string()),
        }
    }
}

/// A wire document and the aggregate it carries.
pub trait Document: Serialize + DeserializeOwned {
    type Aggregate;

    fn from_aggregate(aggregate: Self::Aggregate) -> Self;

    fn into_aggregate(self) -> Self::Aggregate;
}

macro_rules! document {
    ($dto:ty => $aggregate:ty) => {
        impl Document for $dto {
            type Aggregate = $aggregate;

            fn from_aggregate(aggregate: $aggregate) -> Self {
                aggregate.into()
            }

            fn into_aggregate(self) -> $aggregate {
                self.into()
            }
        }
    };
}

document!(NamedPreferenceDto => NamedPreference);
document!(PreferenceGridDto => PreferenceGrid);
document!(PreferenceFormDto => PreferenceForm);

/// # Errors
/// `Write` when the document cannot be produced.
pub fn serialize<D: Document>(aggregate: D::Aggregate) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(&D::from_aggregate(aggregate)).map_err(CodecError::Write)
}

/// # Errors
/// `Malformed` when `bytes` is not a valid document of type `D`.
pub fn deserialize<D: Document>(bytes: &[u8]) -> Result<D::Aggregate, CodecError> {
    read::<D>(bytes).map(Document::into_aggregate)
}

/// Parse a document without converting it.
///
/// # Errors
/// `Malformed` when `bytes` is not a valid document of type `D`.
pub fn read<D: DeserializeOwned>(bytes: &[u8]) -> Result<D, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Malformed)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use preferences_sdk::{GridLayout, GridPreference};

    fn grid(id: u64) -> PreferenceGrid {
        PreferenceGrid {
            id,
            grid_name: "TESTGrid".to_owned(),
            preferences: vec![GridPreference {
                id,
                pref_name: "TestResumen".to_owned(),
                grid_name: "TestGrid".to_owned(),
                publica: true,
                owner: "TEST".to_owned(),
                description: String::new(),
                layout: GridLayout::default(),
            }],
        }
    }

    #[test]
    fn grid_survives_a_round_trip() {
        let bytes = serialize::<PreferenceGridDto>(grid(3)).unwrap();
        assert_eq!(deserialize::<PreferenceGridDto>(&bytes).unwrap(), grid(3));
    }

    #[test]
    fn malformed_documents_are_deserialization_errors() {
        let err = deserialize::<PreferenceGridDto>(b"{\"id\": ").unwrap_err();
        assert!(matches!(
            DomainError::from(err),
            DomainError::Deserialization(_)
        ));
    }

    #[test]
    fn wrong_field_types_are_rejected() {
        let err = deserialize::<NamedPreferenceDto>(br#"{"id": 1, "publica": "yes"}"#);
        assert!(matches!(err, Err(CodecError::Malformed(_))));
    }
}
