use std::sync::Arc;

use async_trait::async_trait;
use preferences_sdk::{
    FormPreference, GridPreference, Preference, PreferenceForm, PreferenceGrid, PreferenceId,
};

use super::graph::{GraphStore, StoreError};
use super::retry::RetryPolicy;
use crate::domain::error::DomainError;
use crate::domain::fields;
use crate::domain::repo::{PreferenceRepository, PreferenceView};

const ENTITY: &str = "Preference";

/// [`PreferenceRepository`] backed by a [`GraphStore`], with transient store
/// failures retried.
pub struct GraphPreferenceRepository {
    store: Arc<dyn GraphStore>,
    retry: RetryPolicy,
}

impl GraphPreferenceRepository {
    pub fn new(store: Arc<dyn GraphStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }
}

fn store_error(err: StoreError, key: impl FnOnce() -> String) -> DomainError {
    match err {
        StoreError::NotFound => DomainError::not_found(ENTITY, key()),
        StoreError::Conflict(message) => DomainError::validation(fields::PREF_NAME, message),
        StoreError::Rejected(message) => {
            tracing::warn!(error = %message, "preference store rejected the data");
            DomainError::validation(fields::PREFERENCIAS, "rejected by the preference store")
        }
        StoreError::Unavailable(message) => DomainError::StoreUnavailable(message),
        StoreError::Corrupt(message) => {
            tracing::error!(error = %message, "stored preference could not be read");
            DomainError::Internal(message)
        }
    }
}

#[async_trait]
impl PreferenceRepository for GraphPreferenceRepository {
    async fn save(&self, preference: Preference) -> Result<PreferenceId, DomainError> {
        let store = &self.store;
        let pref = &preference;
        self.retry
            .run("preferences.save", move || store.save(pref))
            .await
            .map_err(|e| store_error(e, || preference.id.to_string()))
    }

    async fn find_by_id(&self, id: PreferenceId) -> Result<Option<Preference>, DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.find_by_id", move || store.find_by_id(id))
            .await
            .map_err(|e| store_error(e, || id.to_string()))
    }

    async fn find_all_by_owner_or_public(
        &self,
        username: &str,
    ) -> Result<Vec<Preference>, DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.find_all_by_owner_or_public", move || {
                store.find_all_by_owner_or_public(username)
            })
            .await
            .map_err(|e| store_error(e, || username.to_owned()))
    }

    async fn find_by_name_and_grid(
        &self,
        owner: &str,
        pref_name: &str,
        grid_name: &str,
    ) -> Result<Option<Preference>, DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.find_by_name_and_grid", move || {
                store.find_by_name_and_grid(owner, pref_name, grid_name)
            })
            .await
            .map_err(|e| store_error(e, || format!("{grid_name}/{pref_name}")))
    }

    async fn find_view(&self, name: &str) -> Result<Option<PreferenceView>, DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.find_view", move || store.find_view(name))
            .await
            .map_err(|e| store_error(e, || name.to_owned()))
    }

    async fn find_grid(&self, grid_name: &str) -> Result<Option<PreferenceGrid>, DomainError> {
        Ok(self.find_view(grid_name).await?.map(|view| PreferenceGrid {
            id: view.id,
            grid_name: view.name,
            preferences: view
                .entries
                .into_iter()
                .filter_map(|p| GridPreference::try_from(p).ok())
                .collect(),
        }))
    }

    async fn find_form(&self, form_name: &str) -> Result<Option<PreferenceForm>, DomainError> {
        Ok(self.find_view(form_name).await?.map(|view| PreferenceForm {
            id: view.id,
            form_name: view.name,
            preferences: view
                .entries
                .into_iter()
                .filter_map(|p| FormPreference::try_from(p).ok())
                .collect(),
        }))
    }

    async fn delete(&self, id: PreferenceId) -> Result<(), DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.delete", move || store.delete(id))
            .await
            .map_err(|e| store_error(e, || id.to_string()))
    }

    async fn delete_all(&self, ids: &[PreferenceId]) -> Result<u64, DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.delete_all", move || store.delete_all(ids))
            .await
            .map_err(|e| {
                store_error(e, || {
                    ids.iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                })
            })
    }

    async fn exists_with_other_owner(
        &self,
        view_name: &str,
        pref_name: &str,
        owner: &str,
    ) -> Result<bool, DomainError> {
        let store = &self.store;
        self.retry
            .run("preferences.exists_with_other_owner", move || {
                store.exists_with_other_owner(view_name, pref_name, owner)
            })
            .await
            .map_err(|e| store_error(e, || format!("{view_name}/{pref_name}")))
    }
}
