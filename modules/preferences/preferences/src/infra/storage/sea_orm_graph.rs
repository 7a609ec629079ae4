//! Graph store over a relational database.
//!
//! Node tables are joined through `pref_relationship`. Every write runs in
//! one transaction; reads of a preference together with its children run in a
//! read transaction so a concurrent overwrite is never seen half applied.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use preferences_sdk::{Preference, PreferenceId};
use sea_orm::{
    AccessMode, ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectOptions,
    ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use sea_orm_migration::MigratorTrait;

use super::entity::{column, entry, filter, relationship, view};
use super::graph::{GraphStore, RelType, StoreError};
use super::mapper::{self, ColumnNode, ColumnRole, EntryNode, FilterNode, Subgraph};
use super::migrations::Migrator;
use crate::config::DatabaseConfig;
use crate::domain::repo::PreferenceView;

pub(crate) fn db_err(e: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = e.sql_err() {
        return StoreError::Conflict(message);
    }
    if let Some(message) = rejected_by_database(&e) {
        return StoreError::Rejected(message);
    }
    match e {
        DbErr::RecordNotFound(_) => StoreError::NotFound,
        DbErr::Type(message) | DbErr::Json(message) => StoreError::Corrupt(message),
        DbErr::TryIntoErr { from, into, .. } => {
            StoreError::Corrupt(format!("cannot convert {from} into {into}"))
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}

/// Constraint violations and data exceptions (SQLSTATE class 22, such as a
/// value too long for its column). Lock contention, serialization failures
/// and lost connections are not among them.
#[cfg(any(feature = "db-sqlite", feature = "db-pg"))]
fn rejected_by_database(e: &DbErr) -> Option<String> {
    use sea_orm::RuntimeErr;
    use sqlx::error::ErrorKind;

    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))) = e
    else {
        return None;
    };
    let constraint = matches!(
        db.kind(),
        ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation
    );
    let data_exception = db
        .code()
        .is_some_and(|code| code.len() == 5 && code.starts_with("22"));
    (constraint || data_exception).then(|| db.message().to_owned())
}

#[cfg(not(any(feature = "db-sqlite", feature = "db-pg")))]
#[allow(clippy::unnecessary_wraps)]
fn rejected_by_database(_: &DbErr) -> Option<String> {
    None
}

fn to_db_id(id: PreferenceId) -> Option<i64> {
    i64::try_from(id).ok()
}

fn from_db_id(id: i64) -> Result<PreferenceId, StoreError> {
    PreferenceId::try_from(id).map_err(|_| StoreError::Corrupt(format!("negative node id {id}")))
}

fn to_db_position(position: u32) -> Result<i32, StoreError> {
    i32::try_from(position)
        .map_err(|_| StoreError::Corrupt(format!("position {position} out of range")))
}

fn from_db_position(position: i32) -> Result<u32, StoreError> {
    u32::try_from(position)
        .map_err(|_| StoreError::Corrupt(format!("negative position {position}")))
}

fn child_rel_types() -> [&'static str; 2] {
    [RelType::HasColumn.as_str(), RelType::HasFilter.as_str()]
}

fn is_in_memory(dsn: &str) -> bool {
    dsn.starts_with("sqlite") && (dsn.contains(":memory:") || dsn.contains("mode=memory"))
}

pub struct SeaOrmGraphStore {
    db: DatabaseConnection,
}

impl SeaOrmGraphStore {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open a connection pool for `cfg`.
    ///
    /// # Errors
    /// `Unavailable` when the database cannot be reached.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut opts = ConnectOptions::new(cfg.connection_url());
        // every connection to an in-memory SQLite database sees its own database
        let max = if is_in_memory(&cfg.dsn) { 1 } else { cfg.max_connections.max(1) };
        opts.max_connections(max)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        tracing::debug!(dsn = %cfg.redacted_dsn(), max_connections = max, "connecting preference store");
        let db = Database::connect(opts).await.map_err(db_err)?;
        Ok(Self::new(db))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    /// `Unavailable` when a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        Migrator::up(&self.db, None).await.map_err(db_err)
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn save_once(&self, preference: &Preference) -> Result<PreferenceId, StoreError> {
        let Subgraph {
            entry: node,
            columns,
            filters,
        } = mapper::to_subgraph(preference);

        let txn = self.db.begin().await.map_err(db_err)?;
        let existing =
            find_entry_by_key(&txn, &node.owner, &node.pref_name, &node.grid_name).await?;

        let id = if preference.is_persisted() {
            let id = to_db_id(preference.id).ok_or(StoreError::NotFound)?;
            if entry::Entity::find_by_id(id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .is_none()
            {
                return Err(StoreError::NotFound);
            }
            if let Some(other) = existing.filter(|e| e.id != id) {
                return Err(StoreError::Conflict(format!(
                    "'{}' in '{}' is already stored as preference {}",
                    node.pref_name, node.grid_name, other.id
                )));
            }
            Some(id)
        } else {
            existing.map(|e| e.id)
        };

        let grid_name = node.grid_name.clone();
        let (id, former_views) = match id {
            Some(id) => {
                entry_model(Some(id), node).update(&txn).await.map_err(db_err)?;
                (id, detach(&txn, &[id]).await?)
            }
            None => {
                let id = entry::Entity::insert(entry_model(None, node))
                    .exec(&txn)
                    .await
                    .map_err(db_err)?
                    .last_insert_id;
                (id, BTreeSet::new())
            }
        };

        if !grid_name.is_empty() {
            let view_id = view_id_or_create(&txn, &grid_name).await?;
            link(&txn, RelType::HasPreference, view_id, id).await?;
        }
        write_children(&txn, id, columns, filters).await?;
        prune_views(&txn, &former_views).await?;

        txn.commit().await.map_err(db_err)?;
        from_db_id(id)
    }

    async fn begin_read(&self) -> Result<DatabaseTransaction, StoreError> {
        let txn = match self.db.get_database_backend() {
            DatabaseBackend::Postgres => {
                self.db
                    .begin_with_config(
                        Some(IsolationLevel::RepeatableRead),
                        Some(AccessMode::ReadOnly),
                    )
                    .await
            }
            DatabaseBackend::Sqlite | DatabaseBackend::MySql => self.db.begin().await,
        };
        txn.map_err(db_err)
    }
}

async fn load_preferences<C: ConnectionTrait>(
    conn: &C,
    entries: Vec<entry::Model>,
) -> Result<Vec<Preference>, StoreError> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = entries.iter().map(|e| e.id).collect();

    let edges = relationship::Entity::find()
        .filter(relationship::Column::RelType.is_in(child_rel_types()))
        .filter(relationship::Column::FromId.is_in(ids))
        .all(conn)
        .await
        .map_err(db_err)?;

    let column_ids: Vec<i64> = edges
        .iter()
        .filter(|r| r.rel_type == RelType::HasColumn.as_str())
        .map(|r| r.to_id)
        .collect();
    let filter_ids: Vec<i64> = edges
        .iter()
        .filter(|r| r.rel_type == RelType::HasFilter.as_str())
        .map(|r| r.to_id)
        .collect();

    let mut columns: HashMap<i64, column::Model> = HashMap::new();
    if !column_ids.is_empty() {
        for c in column::Entity::find()
            .filter(column::Column::Id.is_in(column_ids))
            .all(conn)
            .await
            .map_err(db_err)?
        {
            columns.insert(c.id, c);
        }
    }
    let mut filters: HashMap<i64, filter::Model> = HashMap::new();
    if !filter_ids.is_empty() {
        for f in filter::Entity::find()
            .filter(filter::Column::Id.is_in(filter_ids))
            .all(conn)
            .await
            .map_err(db_err)?
        {
            filters.insert(f.id, f);
        }
    }

    let mut children: BTreeMap<i64, (Vec<ColumnNode>, Vec<FilterNode>)> = BTreeMap::new();
    for edge in edges {
        let slot = children.entry(edge.from_id).or_default();
        // column and filter ids come from different tables and may collide
        if edge.rel_type == RelType::HasColumn.as_str() {
            if let Some(c) = columns.remove(&edge.to_id) {
                slot.0.push(ColumnNode {
                    role: ColumnRole::parse(&c.role)?,
                    position: from_db_position(c.position)?,
                    value: c.value,
                });
            }
        } else if let Some(f) = filters.remove(&edge.to_id) {
            slot.1.push(FilterNode {
                position: from_db_position(f.position)?,
                column_name: f.column_name,
                value: f.value,
            });
        }
    }

    entries
        .into_iter()
        .map(|e| {
            let (columns, filters) = children.remove(&e.id).unwrap_or_default();
            let id = from_db_id(e.id)?;
            let graph = Subgraph {
                entry: EntryNode {
                    pref_name: e.pref_name,
                    grid_name: e.grid_name,
                    owner: e.owner,
                    publica: e.publica,
                    description: e.description,
                    kind: e.kind,
                    extra: e.extra,
                },
                columns,
                filters,
            };
            mapper::from_subgraph(id, graph)
        })
        .collect()
}

/// Drop the children of `ids` and their links from views; the entry rows stay.
/// Returns the views the entries were linked from.
async fn detach<C: ConnectionTrait>(conn: &C, ids: &[i64]) -> Result<BTreeSet<i64>, StoreError> {
    let views = relationship::Entity::find()
        .filter(relationship::Column::RelType.eq(RelType::HasPreference.as_str()))
        .filter(relationship::Column::ToId.is_in(ids.iter().copied()))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(|r| r.from_id)
        .collect();

    let edges = relationship::Entity::find()
        .filter(relationship::Column::RelType.is_in(child_rel_types()))
        .filter(relationship::Column::FromId.is_in(ids.iter().copied()))
        .all(conn)
        .await
        .map_err(db_err)?;

    let (column_ids, filter_ids): (Vec<_>, Vec<_>) = edges
        .iter()
        .partition(|r| r.rel_type == RelType::HasColumn.as_str());
    if !column_ids.is_empty() {
        column::Entity::delete_many()
            .filter(column::Column::Id.is_in(column_ids.iter().map(|r| r.to_id)))
            .exec(conn)
            .await
            .map_err(db_err)?;
    }
    if !filter_ids.is_empty() {
        filter::Entity::delete_many()
            .filter(filter::Column::Id.is_in(filter_ids.iter().map(|r| r.to_id)))
            .exec(conn)
            .await
            .map_err(db_err)?;
    }

    relationship::Entity::delete_many()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(relationship::Column::RelType.is_in(child_rel_types()))
                        .add(relationship::Column::FromId.is_in(ids.iter().copied())),
                )
                .add(
                    Condition::all()
                        .add(relationship::Column::RelType.eq(RelType::HasPreference.as_str()))
                        .add(relationship::Column::ToId.is_in(ids.iter().copied())),
                ),
        )
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(views)
}

/// Remove the views of `views` that no preference links to any more.
async fn prune_views<C: ConnectionTrait>(conn: &C, views: &BTreeSet<i64>) -> Result<(), StoreError> {
    for &view_id in views {
        let linked = relationship::Entity::find()
            .filter(relationship::Column::RelType.eq(RelType::HasPreference.as_str()))
            .filter(relationship::Column::FromId.eq(view_id))
            .count(conn)
            .await
            .map_err(db_err)?;
        if linked == 0 {
            view::Entity::delete_by_id(view_id)
                .exec(conn)
                .await
                .map_err(db_err)?;
        }
    }
    Ok(())
}

/// Remove the entries with their subtrees; returns the number of entry rows
/// deleted.
async fn remove_entries<C: ConnectionTrait>(conn: &C, ids: &[i64]) -> Result<u64, StoreError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let views = detach(conn, ids).await?;
    let removed = entry::Entity::delete_many()
        .filter(entry::Column::Id.is_in(ids.iter().copied()))
        .exec(conn)
        .await
        .map_err(db_err)?
        .rows_affected;
    prune_views(conn, &views).await?;
    Ok(removed)
}

async fn link<C: ConnectionTrait>(
    conn: &C,
    rel: RelType,
    from_id: i64,
    to_id: i64,
) -> Result<(), StoreError> {
    relationship::Entity::insert(relationship::ActiveModel {
        id: NotSet,
        rel_type: Set(rel.as_str().to_owned()),
        from_id: Set(from_id),
        to_id: Set(to_id),
    })
    .exec(conn)
    .await
    .map_err(db_err)?;
    Ok(())
}

async fn view_id_or_create<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i64, StoreError> {
    if let Some(v) = view::Entity::find()
        .filter(view::Column::Name.eq(name))
        .one(conn)
        .await
        .map_err(db_err)?
    {
        return Ok(v.id);
    }
    let res = view::Entity::insert(view::ActiveModel {
        id: NotSet,
        name: Set(name.to_owned()),
    })
    .exec(conn)
    .await
    .map_err(db_err)?;
    Ok(res.last_insert_id)
}

fn entry_model(id: Option<i64>, node: EntryNode) -> entry::ActiveModel {
    entry::ActiveModel {
        id: id.map_or(NotSet, Set),
        owner: Set(node.owner),
        pref_name: Set(node.pref_name),
        grid_name: Set(node.grid_name),
        publica: Set(node.publica),
        description: Set(node.description),
        kind: Set(node.kind),
        extra: Set(node.extra),
    }
}

async fn write_children<C: ConnectionTrait>(
    conn: &C,
    id: i64,
    columns: Vec<ColumnNode>,
    filters: Vec<FilterNode>,
) -> Result<(), StoreError> {
    for c in columns {
        let res = column::Entity::insert(column::ActiveModel {
            id: NotSet,
            role: Set(c.role.as_str().to_owned()),
            position: Set(to_db_position(c.position)?),
            value: Set(c.value),
        })
        .exec(conn)
        .await
        .map_err(db_err)?;
        link(conn, RelType::HasColumn, id, res.last_insert_id).await?;
    }
    for f in filters {
        let res = filter::Entity::insert(filter::ActiveModel {
            id: NotSet,
            position: Set(to_db_position(f.position)?),
            column_name: Set(f.column_name),
            value: Set(f.value),
        })
        .exec(conn)
        .await
        .map_err(db_err)?;
        link(conn, RelType::HasFilter, id, res.last_insert_id).await?;
    }
    Ok(())
}

async fn find_entry_by_key<C: ConnectionTrait>(
    conn: &C,
    owner: &str,
    pref_name: &str,
    grid_name: &str,
) -> Result<Option<entry::Model>, StoreError> {
    entry::Entity::find()
        .filter(entry::Column::Owner.eq(owner))
        .filter(entry::Column::PrefName.eq(pref_name))
        .filter(entry::Column::GridName.eq(grid_name))
        .one(conn)
        .await
        .map_err(db_err)
}

#[async_trait]
impl GraphStore for SeaOrmGraphStore {
    async fn save(&self, preference: &Preference) -> Result<PreferenceId, StoreError> {
        match self.save_once(preference).await {
            // a concurrent writer inserted the same key or view between our
            // lookup and insert; the second pass finds and overwrites it
            Err(StoreError::Conflict(message)) => {
                tracing::debug!(%message, "preference save lost an insert race, retrying");
                self.save_once(preference).await
            }
            other => other,
        }
    }

    async fn find_by_id(&self, id: PreferenceId) -> Result<Option<Preference>, StoreError> {
        let Some(id) = to_db_id(id) else {
            return Ok(None);
        };
        let txn = self.begin_read().await?;
        let Some(found) = entry::Entity::find_by_id(id).one(&txn).await.map_err(db_err)? else {
            return Ok(None);
        };
        let loaded = load_preferences(&txn, vec![found]).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(loaded.into_iter().next())
    }

    async fn find_all_by_owner_or_public(
        &self,
        username: &str,
    ) -> Result<Vec<Preference>, StoreError> {
        let txn = self.begin_read().await?;
        let entries = entry::Entity::find()
            .filter(
                Condition::any()
                    .add(entry::Column::Owner.eq(username))
                    .add(entry::Column::Publica.eq(true)),
            )
            .order_by_asc(entry::Column::Id)
            .all(&txn)
            .await
            .map_err(db_err)?;
        let loaded = load_preferences(&txn, entries).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(loaded)
    }

    async fn find_by_name_and_grid(
        &self,
        owner: &str,
        pref_name: &str,
        grid_name: &str,
    ) -> Result<Option<Preference>, StoreError> {
        let txn = self.begin_read().await?;
        let Some(found) = find_entry_by_key(&txn, owner, pref_name, grid_name).await? else {
            return Ok(None);
        };
        let loaded = load_preferences(&txn, vec![found]).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(loaded.into_iter().next())
    }

    async fn find_view(&self, name: &str) -> Result<Option<PreferenceView>, StoreError> {
        let txn = self.begin_read().await?;
        let Some(v) = view::Entity::find()
            .filter(view::Column::Name.eq(name))
            .one(&txn)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        let entry_ids: Vec<i64> = relationship::Entity::find()
            .filter(relationship::Column::RelType.eq(RelType::HasPreference.as_str()))
            .filter(relationship::Column::FromId.eq(v.id))
            .all(&txn)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|r| r.to_id)
            .collect();
        let entries = if entry_ids.is_empty() {
            Vec::new()
        } else {
            entry::Entity::find()
                .filter(entry::Column::Id.is_in(entry_ids))
                .order_by_asc(entry::Column::Id)
                .all(&txn)
                .await
                .map_err(db_err)?
        };
        let entries = load_preferences(&txn, entries).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(Some(PreferenceView {
            id: from_db_id(v.id)?,
            name: v.name,
            entries,
        }))
    }

    async fn delete(&self, id: PreferenceId) -> Result<(), StoreError> {
        let id = to_db_id(id).ok_or(StoreError::NotFound)?;
        let txn = self.db.begin().await.map_err(db_err)?;
        if entry::Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .is_none()
        {
            return Err(StoreError::NotFound);
        }
        remove_entries(&txn, &[id]).await?;
        txn.commit().await.map_err(db_err)
    }

    async fn delete_all(&self, ids: &[PreferenceId]) -> Result<u64, StoreError> {
        let ids: BTreeSet<i64> = ids
            .iter()
            .map(|&id| to_db_id(id).ok_or(StoreError::NotFound))
            .collect::<Result<_, _>>()?;
        let ids: Vec<i64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let removed = remove_entries(&txn, &ids).await?;
        if removed != ids.len() as u64 {
            txn.rollback().await.map_err(db_err)?;
            return Err(StoreError::NotFound);
        }
        txn.commit().await.map_err(db_err)?;
        Ok(removed)
    }

    async fn exists_with_other_owner(
        &self,
        view_name: &str,
        pref_name: &str,
        owner: &str,
    ) -> Result<bool, StoreError> {
        let count = entry::Entity::find()
            .filter(entry::Column::GridName.eq(view_name))
            .filter(entry::Column::PrefName.eq(pref_name))
            .filter(entry::Column::Owner.ne(owner))
            .count(&self.db)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

#[cfg(all(test, feature = "db-sqlite"))]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use sea_orm::RuntimeErr;

    async fn migrated() -> SeaOrmGraphStore {
        let store = SeaOrmGraphStore::connect(&DatabaseConfig {
            dsn: "sqlite::memory:".to_owned(),
            username: None,
            password: None,
            max_connections: 1,
            run_migrations: true,
        })
        .await
        .unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn constraint_violations_are_rejected_without_retry() {
        let store = migrated().await;
        let err = store
            .connection()
            .execute_unprepared(
                "INSERT INTO pref_entry (owner, pref_name, grid_name, kind) VALUES ('ana', 'tema', '', NULL)",
            )
            .await
            .unwrap_err();

        let err = db_err(err);
        assert!(matches!(err, StoreError::Rejected(_)), "{err:?}");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn duplicate_keys_conflict() {
        let store = migrated().await;
        let insert = "INSERT INTO pref_entry (owner, pref_name, grid_name, kind) VALUES ('ana', 'tema', '', 'any')";
        store.connection().execute_unprepared(insert).await.unwrap();
        let err = store.connection().execute_unprepared(insert).await.unwrap_err();

        assert!(matches!(db_err(err), StoreError::Conflict(_)));
    }

    #[test]
    fn lost_connections_stay_retryable() {
        let err = db_err(DbErr::Conn(RuntimeErr::Internal("connection reset".to_owned())));
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(err.is_retryable());
    }
}
