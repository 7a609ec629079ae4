#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared fixtures for the preferences integration tests.

use std::collections::BTreeSet;

use preferences::config::DatabaseConfig;
use preferences::infra::storage::SeaOrmGraphStore;
use preferences_sdk::{GridFilter, GridLayout, Preference, PreferenceKind};
use serde_json::json;

pub fn sqlite_memory() -> DatabaseConfig {
    DatabaseConfig {
        dsn: "sqlite::memory:".to_owned(),
        username: None,
        password: None,
        max_connections: 1,
        run_migrations: true,
    }
}

/// A migrated, empty SQLite store.
pub async fn sqlite_store() -> SeaOrmGraphStore {
    let store = SeaOrmGraphStore::connect(&sqlite_memory()).await.unwrap();
    store.migrate().await.unwrap();
    store
}

/// A migrated store backed by a database file under `dir`, so several
/// pooled connections share it.
pub async fn sqlite_file_store(dir: &std::path::Path, max_connections: u32) -> SeaOrmGraphStore {
    let cfg = DatabaseConfig {
        dsn: format!("sqlite://{}?mode=rwc", dir.join("preferences.db").display()),
        max_connections,
        ..sqlite_memory()
    };
    let store = SeaOrmGraphStore::connect(&cfg).await.unwrap();
    store.migrate().await.unwrap();
    store
}

pub fn grid_pref(owner: &str, pref_name: &str, grid_name: &str) -> Preference {
    Preference {
        id: 0,
        owner: owner.to_owned(),
        publica: false,
        description: String::new(),
        pref_name: pref_name.to_owned(),
        grid_name: grid_name.to_owned(),
        kind: PreferenceKind::Grid(GridLayout {
            order_columns: vec!["fecha".to_owned(), "monto".to_owned()],
            hide_columns: BTreeSet::from(["cliente".to_owned()]),
            freeze_columns: vec!["fecha".to_owned()],
            udf_columns: vec![json!({ "name": "saldo", "formula": "a-b" })],
            filters: vec![GridFilter {
                column_name: "plazo".to_owned(),
                value: json!({ "min": 1, "max": 28 }),
            }],
        }),
    }
}

pub fn any_pref(owner: &str, pref_name: &str, publica: bool) -> Preference {
    Preference {
        id: 0,
        owner: owner.to_owned(),
        publica,
        description: "tema".to_owned(),
        pref_name: pref_name.to_owned(),
        grid_name: String::new(),
        kind: PreferenceKind::Any {
            extra: r#"{"dark":true}"#.to_owned(),
        },
    }
}
