use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        let sql = match manager.get_database_backend() {
            DatabaseBackend::Postgres => {
                r"
CREATE TABLE IF NOT EXISTS pref_view (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(255) NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS uk_pref_view_name ON pref_view(name);

CREATE TABLE IF NOT EXISTS pref_entry (
    id BIGSERIAL PRIMARY KEY,
    owner VARCHAR(255) NOT NULL,
    pref_name VARCHAR(255) NOT NULL,
    grid_name VARCHAR(255) NOT NULL,
    publica BOOLEAN NOT NULL DEFAULT FALSE,
    description TEXT NOT NULL DEFAULT '',
    kind VARCHAR(16) NOT NULL,
    extra TEXT NOT NULL DEFAULT ''
);
CREATE UNIQUE INDEX IF NOT EXISTS uk_pref_entry_key ON pref_entry(owner, grid_name, pref_name);
CREATE INDEX IF NOT EXISTS idx_pref_entry_grid ON pref_entry(grid_name);

CREATE TABLE IF NOT EXISTS pref_column (
    id BIGSERIAL PRIMARY KEY,
    role VARCHAR(16) NOT NULL,
    position INTEGER NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pref_filter (
    id BIGSERIAL PRIMARY KEY,
    position INTEGER NOT NULL,
    column_name VARCHAR(255) NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pref_relationship (
    id BIGSERIAL PRIMARY KEY,
    rel_type VARCHAR(32) NOT NULL,
    from_id BIGINT NOT NULL,
    to_id BIGINT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pref_relationship_from ON pref_relationship(rel_type, from_id);
CREATE INDEX IF NOT EXISTS idx_pref_relationship_to ON pref_relationship(rel_type, to_id);
                "
            }
            DatabaseBackend::Sqlite => {
                r"
CREATE TABLE IF NOT EXISTS pref_view (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS uk_pref_view_name ON pref_view(name);

CREATE TABLE IF NOT EXISTS pref_entry (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    pref_name TEXT NOT NULL,
    grid_name TEXT NOT NULL,
    publica BOOLEAN NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    kind TEXT NOT NULL,
    extra TEXT NOT NULL DEFAULT ''
);
CREATE UNIQUE INDEX IF NOT EXISTS uk_pref_entry_key ON pref_entry(owner, grid_name, pref_name);
CREATE INDEX IF NOT EXISTS idx_pref_entry_grid ON pref_entry(grid_name);

CREATE TABLE IF NOT EXISTS pref_column (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    role TEXT NOT NULL,
    position INTEGER NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pref_filter (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    position INTEGER NOT NULL,
    column_name TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pref_relationship (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    rel_type TEXT NOT NULL,
    from_id INTEGER NOT NULL,
    to_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pref_relationship_from ON pref_relationship(rel_type, from_id);
CREATE INDEX IF NOT EXISTS idx_pref_relationship_to ON pref_relationship(rel_type, to_id);
                "
            }
            DatabaseBackend::MySql => {
                return Err(DbErr::Migration(
                    "MySQL is not a supported preference store".to_owned(),
                ));
            }
        };

        conn.execute_unprepared(sql).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        let sql = r"
DROP TABLE IF EXISTS pref_relationship;
DROP TABLE IF EXISTS pref_filter;
DROP TABLE IF EXISTS pref_column;
DROP TABLE IF EXISTS pref_entry;
DROP TABLE IF EXISTS pref_view;
        ";

        conn.execute_unprepared(sql).await?;
        Ok(())
    }
}
