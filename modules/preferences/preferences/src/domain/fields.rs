//! Wire names of validated fields, used in validation errors.

pub const ID: &str = "id";
pub const PREF_NAME: &str = "prefName";
pub const GRID_NAME: &str = "gridName";
pub const FORM_NAME: &str = "formName";
pub const OWNER: &str = "owner";
pub const USUARIO: &str = "usuario";
pub const PREFERENCIAS: &str = "preferencias";
pub const COLUMN_NAME: &str = "columnName";
