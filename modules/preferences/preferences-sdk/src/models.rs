//! Preference aggregates.
//!
//! Every stored preference shares one base record ([`Preference`]) and carries
//! a variant payload ([`PreferenceKind`]). The typed structs below
//! ([`NamedPreference`], [`GridPreference`], [`FormPreference`]) are the shapes
//! callers exchange with the service.

use std::collections::BTreeSet;

use serde_json::Value;

/// Store-assigned identity. `0` marks a preference that was never persisted.
pub type PreferenceId = u64;

/// Identity of a preference that has not been saved yet.
pub const UNSAVED_ID: PreferenceId = 0;

/// A stored preference: the shared base record plus its variant payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    pub id: PreferenceId,
    pub owner: String,
    pub publica: bool,
    pub description: String,
    pub pref_name: String,
    /// Name of the view (grid or form) the preference belongs to.
    pub grid_name: String,
    pub kind: PreferenceKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceKind {
    /// Free-form payload.
    Any { extra: String },
    Grid(GridLayout),
    Form(FormLayout),
}

impl PreferenceKind {
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Any { .. } => "any",
            Self::Grid(_) => "grid",
            Self::Form(_) => "form",
        }
    }
}

impl Preference {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }
}

/// Tabular view configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub order_columns: Vec<String>,
    pub hide_columns: BTreeSet<String>,
    pub freeze_columns: Vec<String>,
    /// User-defined column descriptors, kept as opaque JSON objects.
    pub udf_columns: Vec<Value>,
    pub filters: Vec<GridFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFilter {
    pub column_name: String,
    pub value: Value,
}

/// User-defined fields of a form view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormLayout {
    pub udfs: Vec<String>,
}

/// A preference with an opaque string payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedPreference {
    pub id: PreferenceId,
    pub pref_name: String,
    pub grid_name: String,
    pub publica: bool,
    pub owner: String,
    pub description: String,
    pub extra: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridPreference {
    pub id: PreferenceId,
    pub pref_name: String,
    pub grid_name: String,
    pub publica: bool,
    pub owner: String,
    pub description: String,
    pub layout: GridLayout,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPreference {
    pub id: PreferenceId,
    pub pref_name: String,
    pub form_name: String,
    pub publica: bool,
    pub owner: String,
    pub description: String,
    pub layout: FormLayout,
}

/// A grid and the preferences attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceGrid {
    pub id: PreferenceId,
    pub grid_name: String,
    pub preferences: Vec<GridPreference>,
}

/// A form and the preferences attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceForm {
    pub id: PreferenceId,
    pub form_name: String,
    pub preferences: Vec<FormPreference>,
}

impl From<NamedPreference> for Preference {
    fn from(p: NamedPreference) -> Self {
        Self {
            id: p.id,
            owner: p.owner,
            publica: p.publica,
            description: p.description,
            pref_name: p.pref_name,
            grid_name: p.grid_name,
            kind: PreferenceKind::Any { extra: p.extra },
        }
    }
}

impl From<GridPreference> for Preference {
    fn from(p: GridPreference) -> Self {
        Self {
            id: p.id,
            owner: p.owner,
            publica: p.publica,
            description: p.description,
            pref_name: p.pref_name,
            grid_name: p.grid_name,
            kind: PreferenceKind::Grid(p.layout),
        }
    }
}

impl From<FormPreference> for Preference {
    fn from(p: FormPreference) -> Self {
        Self {
            id: p.id,
            owner: p.owner,
            publica: p.publica,
            description: p.description,
            pref_name: p.pref_name,
            grid_name: p.form_name,
            kind: PreferenceKind::Form(p.layout),
        }
    }
}

/// Fails with the original preference when it is not a grid preference.
impl TryFrom<Preference> for GridPreference {
    type Error = Preference;

    fn try_from(p: Preference) -> Result<Self, Self::Error> {
        match p.kind {
            PreferenceKind::Grid(layout) => Ok(Self {
                id: p.id,
                pref_name: p.pref_name,
                grid_name: p.grid_name,
                publica: p.publica,
                owner: p.owner,
                description: p.description,
                layout,
            }),
            kind => Err(Preference { kind, ..p }),
        }
    }
}

/// Fails with the original preference when it is not a form preference.
impl TryFrom<Preference> for FormPreference {
    type Error = Preference;

    fn try_from(p: Preference) -> Result<Self, Self::Error> {
        match p.kind {
            PreferenceKind::Form(layout) => Ok(Self {
                id: p.id,
                pref_name: p.pref_name,
                form_name: p.grid_name,
                publica: p.publica,
                owner: p.owner,
                description: p.description,
                layout,
            }),
            kind => Err(Preference { kind, ..p }),
        }
    }
}
