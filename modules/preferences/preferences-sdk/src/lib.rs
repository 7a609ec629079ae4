#![forbid(unsafe_code)]
//! Public surface of the preferences module: models, the in-process client
//! trait, and the errors it returns.

pub mod api;
pub mod errors;
pub mod models;

pub use api::PreferencesClientV1;
pub use errors::PreferenceError;
pub use models::{
    FormLayout, FormPreference, GridFilter, GridLayout, GridPreference, NamedPreference,
    Preference, PreferenceForm, PreferenceGrid, PreferenceId, PreferenceKind,
};
