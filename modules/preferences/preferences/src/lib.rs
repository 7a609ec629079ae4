#![forbid(unsafe_code)]
//! Preferences module: stores per-user grid, form and free-form UI
//! preferences and serves them over HTTP.
//!
//! Layout follows the usual module split: `domain` holds the service, the
//! access gate and the repository port; `infra::storage` persists aggregates
//! into a graph of nodes and relationships; `api::rest` maps the service onto
//! the HTTP surface.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod local_client;
pub mod module;

pub use config::PreferencesConfig;
pub use module::PreferencesModule;
