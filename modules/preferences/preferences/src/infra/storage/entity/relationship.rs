use sea_orm::entity::prelude::*;

/// A typed edge. `rel_type` decides which tables `from_id` and `to_id` point
/// into: `HAS_PREFERENCE` goes from a view to an entry, `HAS_COLUMN` and
/// `HAS_FILTER` from an entry to its children.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pref_relationship")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub rel_type: String,
    pub from_id: i64,
    pub to_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
