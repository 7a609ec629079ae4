//! Conversion between preference aggregates and their stored subgraph.

use preferences_sdk::{
    FormLayout, GridFilter, GridLayout, Preference, PreferenceId, PreferenceKind,
};

use super::graph::StoreError;

/// Role of a column node under a preference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnRole {
    Order,
    Hide,
    Freeze,
    /// Grid user-defined column; the value is a JSON descriptor.
    Udf,
    /// Form user-defined field.
    Field,
}

impl ColumnRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Hide => "hide",
            Self::Freeze => "freeze",
            Self::Udf => "udf",
            Self::Field => "field",
        }
    }

    /// # Errors
    /// `Corrupt` for an unknown role name.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        match raw {
            "order" => Ok(Self::Order),
            "hide" => Ok(Self::Hide),
            "freeze" => Ok(Self::Freeze),
            "udf" => Ok(Self::Udf),
            "field" => Ok(Self::Field),
            other => Err(StoreError::Corrupt(format!("unknown column role '{other}'"))),
        }
    }
}

/// Properties of a preference node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryNode {
    pub pref_name: String,
    pub grid_name: String,
    pub owner: String,
    pub publica: bool,
    pub description: String,
    pub kind: String,
    pub extra: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNode {
    pub role: ColumnRole,
    pub position: u32,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNode {
    pub position: u32,
    pub column_name: String,
    /// JSON text of the filter value.
    pub value: String,
}

/// A preference node with everything it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgraph {
    pub entry: EntryNode,
    pub columns: Vec<ColumnNode>,
    pub filters: Vec<FilterNode>,
}

impl EntryNode {
    #[must_use]
    pub fn same_key(&self, owner: &str, pref_name: &str, grid_name: &str) -> bool {
        self.owner == owner && self.pref_name == pref_name && self.grid_name == grid_name
    }
}

#[must_use]
pub fn to_subgraph(p: &Preference) -> Subgraph {
    let mut columns = Vec::new();
    let mut filters = Vec::new();
    let mut extra = String::new();

    match &p.kind {
        PreferenceKind::Any { extra: payload } => extra.clone_from(payload),
        PreferenceKind::Grid(layout) => {
            push_columns(&mut columns, ColumnRole::Order, layout.order_columns.iter().cloned());
            push_columns(&mut columns, ColumnRole::Hide, layout.hide_columns.iter().cloned());
            push_columns(&mut columns, ColumnRole::Freeze, layout.freeze_columns.iter().cloned());
            push_columns(
                &mut columns,
                ColumnRole::Udf,
                layout.udf_columns.iter().map(ToString::to_string),
            );
            filters.extend(layout.filters.iter().zip(0u32..).map(|(f, position)| FilterNode {
                position,
                column_name: f.column_name.clone(),
                value: f.value.to_string(),
            }));
        }
        PreferenceKind::Form(layout) => {
            push_columns(&mut columns, ColumnRole::Field, layout.udfs.iter().cloned());
        }
    }

    Subgraph {
        entry: EntryNode {
            pref_name: p.pref_name.clone(),
            grid_name: p.grid_name.clone(),
            owner: p.owner.clone(),
            publica: p.publica,
            description: p.description.clone(),
            kind: p.kind.tag().to_owned(),
            extra,
        },
        columns,
        filters,
    }
}

fn push_columns(out: &mut Vec<ColumnNode>, role: ColumnRole, values: impl Iterator<Item = String>) {
    out.extend(values.zip(0u32..).map(|(value, position)| ColumnNode {
        role,
        position,
        value,
    }));
}

/// Rebuild the aggregate stored under `id`.
///
/// # Errors
/// `Corrupt` when the kind tag or a stored JSON value cannot be read back.
pub fn from_subgraph(id: PreferenceId, graph: Subgraph) -> Result<Preference, StoreError> {
    let Subgraph {
        entry,
        mut columns,
        mut filters,
    } = graph;
    columns.sort_by_key(|c| (c.role, c.position));
    filters.sort_by_key(|f| f.position);

    let kind = match entry.kind.as_str() {
        "any" => PreferenceKind::Any { extra: entry.extra },
        "grid" => PreferenceKind::Grid(grid_layout(columns, filters)?),
        "form" => PreferenceKind::Form(FormLayout {
            udfs: columns
                .into_iter()
                .filter(|c| c.role == ColumnRole::Field)
                .map(|c| c.value)
                .collect(),
        }),
        other => {
            return Err(StoreError::Corrupt(format!(
                "preference {id} has unknown kind '{other}'"
            )));
        }
    };

    Ok(Preference {
        id,
        owner: entry.owner,
        publica: entry.publica,
        description: entry.description,
        pref_name: entry.pref_name,
        grid_name: entry.grid_name,
        kind,
    })
}

fn grid_layout(columns: Vec<ColumnNode>, filters: Vec<FilterNode>) -> Result<GridLayout, StoreError> {
    let mut layout = GridLayout::default();
    for column in columns {
        match column.role {
            ColumnRole::Order => layout.order_columns.push(column.value),
            ColumnRole::Hide => {
                layout.hide_columns.insert(column.value);
            }
            ColumnRole::Freeze => layout.freeze_columns.push(column.value),
            ColumnRole::Udf => layout.udf_columns.push(parse_json(&column.value)?),
            ColumnRole::Field => {}
        }
    }
    for filter in filters {
        layout.filters.push(GridFilter {
            value: parse_json(&filter.value)?,
            column_name: filter.column_name,
        });
    }
    Ok(layout)
}

fn parse_json(raw: &str) -> Result<serde_json::Value, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt(format!("invalid JSON value: {e}")))
}
