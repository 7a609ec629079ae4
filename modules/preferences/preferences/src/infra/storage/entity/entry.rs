use sea_orm::entity::prelude::*;

/// A preference node. `(owner, grid_name, pref_name)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pref_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner: String,
    pub pref_name: String,
    pub grid_name: String,
    pub publica: bool,
    pub description: String,
    /// `any`, `grid` or `form`.
    pub kind: String,
    pub extra: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
