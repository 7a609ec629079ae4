use async_trait::async_trait;
use preferences_sdk::{Preference, PreferenceForm, PreferenceGrid, PreferenceId};

use super::error::DomainError;

/// A named view (grid or form) with every preference attached to it,
/// whatever their variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceView {
    pub id: PreferenceId,
    pub name: String,
    pub entries: Vec<Preference>,
}

/// Persistence port of the preference aggregates.
///
/// Saves and deletes are atomic per aggregate: a preference and its columns
/// and filters are written or removed together.
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    /// Insert or overwrite; `(owner, pref_name, grid_name)` identifies the
    /// stored preference when `id` is 0.
    async fn save(&self, preference: Preference) -> Result<PreferenceId, DomainError>;

    async fn find_by_id(&self, id: PreferenceId) -> Result<Option<Preference>, DomainError>;

    async fn find_all_by_owner_or_public(
        &self,
        username: &str,
    ) -> Result<Vec<Preference>, DomainError>;

    async fn find_by_name_and_grid(
        &self,
        owner: &str,
        pref_name: &str,
        grid_name: &str,
    ) -> Result<Option<Preference>, DomainError>;

    async fn find_view(&self, name: &str) -> Result<Option<PreferenceView>, DomainError>;

    /// The grid with only its grid-variant entries.
    async fn find_grid(&self, grid_name: &str) -> Result<Option<PreferenceGrid>, DomainError>;

    /// The form with only its form-variant entries.
    async fn find_form(&self, form_name: &str) -> Result<Option<PreferenceForm>, DomainError>;

    /// # Errors
    /// `NotFound` when no preference has this id.
    async fn delete(&self, id: PreferenceId) -> Result<(), DomainError>;

    /// Remove all of `ids` in one atomic step; returns the number removed.
    ///
    /// # Errors
    /// `NotFound` when any id is unknown, in which case nothing is removed.
    async fn delete_all(&self, ids: &[PreferenceId]) -> Result<u64, DomainError>;

    /// True when `view_name` holds a preference named `pref_name` whose owner
    /// is not `owner`.
    async fn exists_with_other_owner(
        &self,
        view_name: &str,
        pref_name: &str,
        owner: &str,
    ) -> Result<bool, DomainError>;
}
