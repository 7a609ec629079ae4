//! Graph store contract.
//!
//! Preferences are persisted as a small graph: a view node (one per grid or
//! form name) points at its preference nodes through `HAS_PREFERENCE`, and
//! every preference node owns its column and filter nodes through
//! `HAS_COLUMN` / `HAS_FILTER`. Implementations write one preference subgraph
//! atomically and read from a consistent snapshot.

use async_trait::async_trait;
use preferences_sdk::{Preference, PreferenceId};
use thiserror::Error;

use crate::domain::repo::PreferenceView;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("node not found")]
    NotFound,

    #[error("conflicting preference: {0}")]
    Conflict(String),

    /// The database refused the data itself (constraint or data exception);
    /// repeating the call cannot succeed.
    #[error("rejected by the store: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt stored data: {0}")]
    Corrupt(String),
}

impl StoreError {
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelType {
    HasPreference,
    HasColumn,
    HasFilter,
}

impl RelType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HasPreference => "HAS_PREFERENCE",
            Self::HasColumn => "HAS_COLUMN",
            Self::HasFilter => "HAS_FILTER",
        }
    }
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Write the preference subgraph and return the preference identity.
    ///
    /// With `id == 0` the `(owner, pref_name, grid_name)` triple selects the
    /// node to overwrite, or a new node is created. With a non-zero id that
    /// node is overwritten.
    ///
    /// # Errors
    /// `NotFound` for an unknown non-zero id, `Conflict` when the triple is
    /// already taken by another node.
    async fn save(&self, preference: &Preference) -> Result<PreferenceId, StoreError>;

    async fn find_by_id(&self, id: PreferenceId) -> Result<Option<Preference>, StoreError>;

    /// Preferences owned by `username` or public, by ascending id.
    async fn find_all_by_owner_or_public(
        &self,
        username: &str,
    ) -> Result<Vec<Preference>, StoreError>;

    async fn find_by_name_and_grid(
        &self,
        owner: &str,
        pref_name: &str,
        grid_name: &str,
    ) -> Result<Option<Preference>, StoreError>;

    /// The view node named `name` with its preferences by ascending id.
    async fn find_view(&self, name: &str) -> Result<Option<PreferenceView>, StoreError>;

    /// Remove a preference node with its columns and filters.
    ///
    /// # Errors
    /// `NotFound` when no preference has this id.
    async fn delete(&self, id: PreferenceId) -> Result<(), StoreError>;

    /// Remove every listed preference, or none of them. A view node left
    /// without preferences is removed as well. Returns the number of
    /// preferences removed.
    ///
    /// # Errors
    /// `NotFound` when any id is unknown; nothing is removed then.
    async fn delete_all(&self, ids: &[PreferenceId]) -> Result<u64, StoreError>;

    async fn exists_with_other_owner(
        &self,
        view_name: &str,
        pref_name: &str,
        owner: &str,
    ) -> Result<bool, StoreError>;
}
