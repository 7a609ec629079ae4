#![allow(clippy::unwrap_used, clippy::expect_used)]

//! `SeaOrmGraphStore` against an in-memory SQLite database.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{any_pref, grid_pref, sqlite_file_store, sqlite_store};
use preferences::domain::repo::PreferenceRepository;
use preferences::infra::storage::{GraphPreferenceRepository, GraphStore, RetryPolicy, StoreError};
use preferences_sdk::{GridLayout, PreferenceKind};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

async fn view_count(store: &preferences::infra::storage::SeaOrmGraphStore) -> i64 {
    let row = store
        .connection()
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) AS n FROM pref_view".to_owned(),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

#[tokio::test]
async fn saved_grid_reads_back_with_its_layout() {
    let store = sqlite_store().await;
    let pref = grid_pref("ana", "Resumen", "Posicion");

    let id = store.save(&pref).await.unwrap();
    assert!(id > 0);

    let loaded = store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(loaded, preferences_sdk::Preference { id, ..pref });
}

#[tokio::test]
async fn saving_the_same_key_overwrites_in_place() {
    let store = sqlite_store().await;
    let first = store.save(&grid_pref("ana", "Resumen", "Posicion")).await.unwrap();

    let mut changed = grid_pref("ana", "Resumen", "Posicion");
    changed.kind = PreferenceKind::Grid(GridLayout {
        order_columns: vec!["monto".to_owned()],
        ..GridLayout::default()
    });
    let second = store.save(&changed).await.unwrap();
    assert_eq!(first, second);

    let loaded = store.find_by_id(first).await.unwrap().unwrap();
    let PreferenceKind::Grid(layout) = loaded.kind else {
        panic!("expected a grid preference");
    };
    assert_eq!(layout.order_columns, vec!["monto".to_owned()]);
    assert!(layout.filters.is_empty());
    assert!(layout.hide_columns.is_empty());
}

#[tokio::test]
async fn saving_by_id_onto_a_taken_key_conflicts() {
    let store = sqlite_store().await;
    store.save(&grid_pref("ana", "Resumen", "Posicion")).await.unwrap();
    let other = store.save(&grid_pref("ana", "Detalle", "Posicion")).await.unwrap();

    let mut clash = grid_pref("ana", "Resumen", "Posicion");
    clash.id = other;
    let err = store.save(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");

    let mut unknown = grid_pref("ana", "Nuevo", "Posicion");
    unknown.id = 9_999;
    assert!(matches!(store.save(&unknown).await, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn view_lists_and_batch_deletes() {
    let store = sqlite_store().await;
    let a = store.save(&grid_pref("ana", "Resumen", "Posicion")).await.unwrap();
    let b = store.save(&grid_pref("luis", "Resumen", "Posicion")).await.unwrap();
    store.save(&grid_pref("ana", "Resumen", "Otra")).await.unwrap();

    let view = store.find_view("Posicion").await.unwrap().unwrap();
    let ids: Vec<u64> = view.entries.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, b]);

    assert!(store.exists_with_other_owner("Posicion", "Resumen", "ana").await.unwrap());
    assert!(!store.exists_with_other_owner("Otra", "Resumen", "ana").await.unwrap());

    assert_eq!(store.delete_all(&[a, b]).await.unwrap(), 2);
    assert!(store.find_view("Posicion").await.unwrap().is_none());
    assert!(store.find_by_id(a).await.unwrap().is_none());
    assert!(store.find_view("Otra").await.unwrap().is_some());

    assert!(matches!(store.delete_all(&[a]).await, Err(StoreError::NotFound)));
    assert_eq!(store.delete_all(&[]).await.unwrap(), 0);
}

#[tokio::test]
async fn batch_delete_with_an_unknown_id_rolls_back() {
    let store = sqlite_store().await;
    let a = store.save(&grid_pref("ana", "Resumen", "Posicion")).await.unwrap();

    assert!(matches!(store.delete_all(&[a, 9_999]).await, Err(StoreError::NotFound)));

    let kept = store.find_by_id(a).await.unwrap().unwrap();
    let PreferenceKind::Grid(layout) = kept.kind else {
        panic!("expected a grid preference");
    };
    assert_eq!(layout.order_columns, vec!["fecha".to_owned(), "monto".to_owned()]);
    assert_eq!(layout.filters.len(), 1);
    assert_eq!(store.find_view("Posicion").await.unwrap().unwrap().entries.len(), 1);
}

#[tokio::test]
async fn moving_the_last_entry_drops_the_old_view() {
    let store = sqlite_store().await;
    let id = store.save(&grid_pref("ana", "Resumen", "Posicion")).await.unwrap();

    let mut moved = grid_pref("ana", "Resumen", "Otra");
    moved.id = id;
    assert_eq!(store.save(&moved).await.unwrap(), id);

    assert!(store.find_view("Posicion").await.unwrap().is_none());
    assert_eq!(store.find_view("Otra").await.unwrap().unwrap().entries.len(), 1);
    assert_eq!(view_count(&store).await, 1);

    // an in-place overwrite keeps the view it already hangs from
    assert_eq!(store.save(&grid_pref("ana", "Resumen", "Otra")).await.unwrap(), id);
    assert_eq!(view_count(&store).await, 1);
}

#[tokio::test]
async fn concurrent_first_saves_of_one_key_settle_on_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(sqlite_file_store(dir.path(), 4).await);
    let repo = Arc::new(GraphPreferenceRepository::new(
        store.clone(),
        RetryPolicy::new(20)
            .with_initial_backoff(Duration::from_millis(1))
            .with_max_backoff(Duration::from_millis(5)),
    ));

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.save(grid_pref("ana", "Resumen", "Posicion")).await })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap());
    }
    assert!(ids.iter().all(|id| *id == ids[0]));

    let view = store.find_view("Posicion").await.unwrap().unwrap();
    assert_eq!(view.entries.len(), 1);
    assert_eq!(view.entries[0].id, ids[0]);
    assert_eq!(view_count(&store).await, 1);
}

#[tokio::test]
async fn owner_or_public_lookup() {
    let store = sqlite_store().await;
    let own = store.save(&any_pref("ana", "tema", false)).await.unwrap();
    let public = store.save(&any_pref("luis", "idioma", true)).await.unwrap();
    store.save(&any_pref("luis", "privado", false)).await.unwrap();

    let found = store.find_all_by_owner_or_public("ana").await.unwrap();
    let ids: Vec<u64> = found.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![own, public]);

    let by_key = store.find_by_name_and_grid("ana", "tema", "").await.unwrap().unwrap();
    assert_eq!(by_key.id, own);
    assert_eq!(
        by_key.kind,
        PreferenceKind::Any {
            extra: r#"{"dark":true}"#.to_owned()
        }
    );
}

#[tokio::test]
async fn delete_removes_a_single_preference() {
    let store = sqlite_store().await;
    let id = store.save(&grid_pref("ana", "Resumen", "Posicion")).await.unwrap();

    store.delete(id).await.unwrap();
    assert!(store.find_by_id(id).await.unwrap().is_none());
    assert!(matches!(store.delete(id).await, Err(StoreError::NotFound)));

    let view = store.find_view("Posicion").await.unwrap().unwrap();
    assert!(view.entries.is_empty());
}
