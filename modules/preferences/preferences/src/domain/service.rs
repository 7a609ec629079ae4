use std::collections::BTreeMap;
use std::sync::Arc;

use prefkit_security::Principal;
use preferences_sdk::{
    FormPreference, GridPreference, NamedPreference, Preference, PreferenceForm, PreferenceGrid,
    PreferenceId, PreferenceKind,
};

use super::access::{AccessGate, Authorized};
use super::error::DomainError;
use super::fields;
use super::projection;
use super::repo::PreferenceRepository;
use super::visibility::{Visible, retain_visible};

pub struct ServiceConfig {
    pub max_name_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 255,
        }
    }
}

pub struct Service {
    repo: Arc<dyn PreferenceRepository>,
    gate: AccessGate,
    config: ServiceConfig,
}

impl Service {
    pub fn new(repo: Arc<dyn PreferenceRepository>, gate: AccessGate, config: ServiceConfig) -> Self {
        Self { repo, gate, config }
    }

    /// Preferences owned by `usuario` plus every public one, by ascending id.
    pub async fn get_any_by_usuario(
        &self,
        principal: &Principal,
        usuario: &str,
    ) -> Result<Vec<NamedPreference>, DomainError> {
        let visible = self.visible_to(principal, usuario).await?;
        tracing::debug!(usuario, count = visible.len(), "Resolved preferences");
        Ok(visible.into_iter().map(projection::to_named).collect())
    }

    /// The grid with the entries visible to `usuario`, restricted to `owner`
    /// when given.
    ///
    /// # Errors
    /// `NotFound` when the grid does not exist or nothing in it is visible.
    pub async fn get_grid_by_name(
        &self,
        principal: &Principal,
        usuario: &str,
        grid_name: &str,
        owner: Option<&str>,
    ) -> Result<PreferenceGrid, DomainError> {
        self.authorize(principal)?;
        require_non_blank(fields::GRID_NAME, grid_name)?;

        let grid = self
            .repo
            .find_grid(grid_name)
            .await?
            .ok_or_else(|| DomainError::not_found("grid", grid_name))?;

        let preferences = retain_visible(grid.preferences, usuario, owner);
        if preferences.is_empty() {
            return Err(DomainError::not_found("grid", grid_name));
        }
        Ok(PreferenceGrid {
            preferences,
            ..grid
        })
    }

    pub async fn get_form_by_name(
        &self,
        principal: &Principal,
        usuario: &str,
        form_name: &str,
        owner: Option<&str>,
    ) -> Result<PreferenceForm, DomainError> {
        self.authorize(principal)?;
        require_non_blank(fields::FORM_NAME, form_name)?;

        let form = self
            .repo
            .find_form(form_name)
            .await?
            .ok_or_else(|| DomainError::not_found("form", form_name))?;

        let preferences = retain_visible(form.preferences, usuario, owner);
        if preferences.is_empty() {
            return Err(DomainError::not_found("form", form_name));
        }
        Ok(PreferenceForm {
            preferences,
            ..form
        })
    }

    pub async fn get_grids_by_usuario(
        &self,
        principal: &Principal,
        usuario: &str,
    ) -> Result<Vec<GridPreference>, DomainError> {
        let all = self.visible_to(principal, usuario).await?;
        Ok(all
            .into_iter()
            .filter_map(|p| GridPreference::try_from(p).ok())
            .collect())
    }

    pub async fn get_forms_by_usuario(
        &self,
        principal: &Principal,
        usuario: &str,
    ) -> Result<Vec<FormPreference>, DomainError> {
        let all = self.visible_to(principal, usuario).await?;
        Ok(all
            .into_iter()
            .filter_map(|p| FormPreference::try_from(p).ok())
            .collect())
    }

    /// True when `view_name` already holds a preference named `pref_name`
    /// that belongs to someone other than `usuario`.
    pub async fn has_preference_with_other_owner(
        &self,
        principal: &Principal,
        view_name: &str,
        pref_name: &str,
        usuario: &str,
    ) -> Result<bool, DomainError> {
        self.authorize(principal)?;
        require_non_blank(fields::GRID_NAME, view_name)?;
        require_non_blank(fields::PREF_NAME, pref_name)?;
        self.repo
            .exists_with_other_owner(view_name, pref_name, usuario)
            .await
    }

    /// Create or overwrite a preference.
    ///
    /// # Errors
    /// `Validation` for blank names, `Forbidden` when the principal neither
    /// owns the preference nor holds an elevated role, `NotFound` when a
    /// non-zero id does not exist.
    pub async fn save(
        &self,
        principal: &Principal,
        preference: Preference,
    ) -> Result<PreferenceId, DomainError> {
        let caller = self.authorize(principal)?;
        self.validate(&preference)?;
        caller.ensure_can_modify(&preference.owner)?;

        if preference.is_persisted() {
            let current = self
                .repo
                .find_by_id(preference.id)
                .await?
                .ok_or_else(|| DomainError::not_found("preference", preference.id.to_string()))?;
            caller.ensure_can_modify(&current.owner)?;
        }

        let kind = preference.kind.tag();
        let id = self.repo.save(preference).await?;
        tracing::info!(id, kind, user = caller.username(), "Preference saved");
        Ok(id)
    }

    /// Save the single preference carried by `grid` and return the grid as
    /// its owner sees it.
    pub async fn save_grid(
        &self,
        principal: &Principal,
        grid: PreferenceGrid,
    ) -> Result<PreferenceGrid, DomainError> {
        let mut entry = single_entry(grid.preferences)?;
        entry.grid_name = view_name_for(grid.grid_name, &entry.grid_name, fields::GRID_NAME)?;
        let owner = entry.owner.clone();
        let grid_name = entry.grid_name.clone();

        self.save(principal, entry.into()).await?;
        self.get_grid_by_name(principal, &owner, &grid_name, None)
            .await
    }

    /// Save the single preference carried by `form` and return the form as
    /// its owner sees it.
    pub async fn save_form(
        &self,
        principal: &Principal,
        form: PreferenceForm,
    ) -> Result<PreferenceForm, DomainError> {
        let mut entry = single_entry(form.preferences)?;
        entry.form_name = view_name_for(form.form_name, &entry.form_name, fields::FORM_NAME)?;
        let owner = entry.owner.clone();
        let form_name = entry.form_name.clone();

        self.save(principal, entry.into()).await?;
        self.get_form_by_name(principal, &owner, &form_name, None)
            .await
    }

    /// # Errors
    /// `NotFound` when absent, `Forbidden` when the principal neither owns the
    /// preference nor holds an elevated role.
    pub async fn delete(&self, principal: &Principal, id: PreferenceId) -> Result<(), DomainError> {
        let caller = self.authorize(principal)?;
        let current = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("preference", id.to_string()))?;
        caller.ensure_can_modify(&current.owner)?;

        self.repo.delete(id).await?;
        tracing::info!(id, user = caller.username(), "Preference deleted");
        Ok(())
    }

    /// Delete the preferences of `view_name` whose name is in `pref_names`.
    ///
    /// Nothing is deleted when any matching preference is not modifiable by
    /// the principal.
    pub async fn delete_any_by_name(
        &self,
        principal: &Principal,
        view_name: &str,
        pref_names: &[String],
    ) -> Result<Vec<NamedPreference>, DomainError> {
        let caller = self.authorize(principal)?;
        require_non_blank(fields::GRID_NAME, view_name)?;

        let view = self
            .repo
            .find_view(view_name)
            .await?
            .ok_or_else(|| DomainError::not_found("grid", view_name))?;

        let targets: Vec<Preference> = view
            .entries
            .into_iter()
            .filter(|p| pref_names.contains(&p.pref_name))
            .collect();
        for target in &targets {
            caller.ensure_can_modify(&target.owner)?;
        }

        let ids: Vec<PreferenceId> = targets.iter().map(|p| p.id).collect();
        self.repo.delete_all(&ids).await?;
        tracing::info!(
            view = view_name,
            removed = targets.len(),
            user = caller.username(),
            "Preferences deleted by name"
        );
        Ok(targets.into_iter().map(projection::to_named).collect())
    }

    /// Delete a grid with its grid preferences. Form and free-form
    /// preferences filed under the same name are left alone.
    ///
    /// # Errors
    /// `NotFound` when the grid has no grid preferences, `Forbidden` unless
    /// the principal is elevated or owns every one of them.
    pub async fn delete_grid(&self, principal: &Principal, grid_name: &str) -> Result<u64, DomainError> {
        let caller = self.authorize(principal)?;
        require_non_blank(fields::GRID_NAME, grid_name)?;

        let grid = self
            .repo
            .find_grid(grid_name)
            .await?
            .filter(|g| !g.preferences.is_empty())
            .ok_or_else(|| DomainError::not_found("grid", grid_name))?;
        for entry in &grid.preferences {
            caller.ensure_can_modify(&entry.owner)?;
        }

        let ids: Vec<PreferenceId> = grid.preferences.iter().map(|p| p.id).collect();
        let removed = self.repo.delete_all(&ids).await?;
        tracing::info!(grid = grid_name, removed, user = caller.username(), "Grid deleted");
        Ok(removed)
    }

    fn authorize<'a>(&self, principal: &'a Principal) -> Result<Authorized<'a>, DomainError> {
        self.gate.authenticate(Some(principal))?.authorize(&self.gate)
    }

    async fn visible_to(
        &self,
        principal: &Principal,
        usuario: &str,
    ) -> Result<Vec<Preference>, DomainError> {
        self.authorize(principal)?;
        require_non_blank(fields::USUARIO, usuario)?;

        let found = self.repo.find_all_by_owner_or_public(usuario).await?;
        let visible: BTreeMap<PreferenceId, Preference> = found
            .into_iter()
            .filter(|p| p.is_visible_to(usuario))
            .map(|p| (p.id, p))
            .collect();
        Ok(visible.into_values().collect())
    }

    fn validate(&self, preference: &Preference) -> Result<(), DomainError> {
        require_non_blank(fields::PREF_NAME, &preference.pref_name)?;
        require_non_blank(fields::OWNER, &preference.owner)?;
        match preference.kind {
            PreferenceKind::Grid(_) => require_non_blank(fields::GRID_NAME, &preference.grid_name)?,
            PreferenceKind::Form(_) => require_non_blank(fields::FORM_NAME, &preference.grid_name)?,
            PreferenceKind::Any { .. } => {}
        }

        self.validate_length(fields::PREF_NAME, &preference.pref_name)?;
        self.validate_length(fields::GRID_NAME, &preference.grid_name)?;
        self.validate_length(fields::OWNER, &preference.owner)?;
        if let PreferenceKind::Grid(layout) = &preference.kind {
            let columns = layout
                .order_columns
                .iter()
                .chain(&layout.hide_columns)
                .chain(&layout.freeze_columns)
                .chain(layout.filters.iter().map(|f| &f.column_name));
            for column in columns {
                self.validate_length(fields::COLUMN_NAME, column)?;
            }
        }
        Ok(())
    }

    fn validate_length(&self, field: &str, value: &str) -> Result<(), DomainError> {
        if value.chars().count() > self.config.max_name_length {
            return Err(DomainError::validation(
                field,
                format!("exceeds maximum length of {}", self.config.max_name_length),
            ));
        }
        Ok(())
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be blank"));
    }
    Ok(())
}

fn single_entry<T>(entries: Vec<T>) -> Result<T, DomainError> {
    let count = entries.len();
    let mut iter = entries.into_iter();
    match (iter.next(), count) {
        (Some(entry), 1) => Ok(entry),
        _ => Err(DomainError::validation(
            fields::PREFERENCIAS,
            format!("exactly one preference is required, got {count}"),
        )),
    }
}

/// The view name an entry is saved under: the aggregate's, or the entry's own
/// when the aggregate leaves it blank.
fn view_name_for(aggregate: String, entry: &str, field: &str) -> Result<String, DomainError> {
    if !aggregate.trim().is_empty() {
        return Ok(aggregate);
    }
    require_non_blank(field, entry)?;
    Ok(entry.to_owned())
}
