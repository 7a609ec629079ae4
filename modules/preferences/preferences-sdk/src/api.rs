use async_trait::async_trait;
use prefkit_security::Principal;

use crate::errors::PreferenceError;
use crate::models::{
    NamedPreference, Preference, PreferenceForm, PreferenceGrid, PreferenceId,
};

/// In-process client for the preferences module.
///
/// Every call is made on behalf of `principal`; `usuario` names the user
/// whose view of the preferences is requested.
#[async_trait]
pub trait PreferencesClientV1: Send + Sync {
    /// All preferences owned by `usuario` plus the public ones, by ascending id.
    async fn get_any_by_usuario(
        &self,
        principal: &Principal,
        usuario: &str,
    ) -> Result<Vec<NamedPreference>, PreferenceError>;

    /// The grid named `grid_name` with only the entries visible to `usuario`.
    async fn get_grid_by_name(
        &self,
        principal: &Principal,
        usuario: &str,
        grid_name: &str,
    ) -> Result<PreferenceGrid, PreferenceError>;

    /// The form named `form_name` with only the entries visible to `usuario`.
    async fn get_form_by_name(
        &self,
        principal: &Principal,
        usuario: &str,
        form_name: &str,
    ) -> Result<PreferenceForm, PreferenceError>;

    /// Create or overwrite a preference and return its identity.
    async fn save(
        &self,
        principal: &Principal,
        preference: Preference,
    ) -> Result<PreferenceId, PreferenceError>;

    async fn delete(&self, principal: &Principal, id: PreferenceId)
    -> Result<(), PreferenceError>;
}
