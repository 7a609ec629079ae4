//! Wire documents.
//!
//! Every sequence field is written as an array, even when empty, and read
//! back as an empty sequence when missing or `null`. Identities are written as
//! numbers and accepted as numbers or quoted digits.

use std::fmt;

use preferences_sdk::{
    FormLayout, FormPreference, GridFilter, GridLayout, GridPreference, NamedPreference,
    PreferenceForm, PreferenceGrid, PreferenceId,
};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

struct IdVisitor;

impl Visitor<'_> for IdVisitor {
    type Value = PreferenceId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative integer or a string of decimal digits")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        PreferenceId::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::invalid_value(de::Unexpected::Str(v), &self));
        }
        v.parse()
            .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(0)
    }
}

fn id_number_or_string<'de, D: Deserializer<'de>>(d: D) -> Result<PreferenceId, D::Error> {
    d.deserialize_any(IdVisitor)
}

fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// A preference with an opaque payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedPreferenceDto {
    #[serde(default, deserialize_with = "id_number_or_string")]
    #[schema(value_type = u64)]
    pub id: PreferenceId,
    #[serde(default, deserialize_with = "nullable")]
    pub pref_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub grid_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub publica: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub owner: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub extra: String,
}

impl From<NamedPreference> for NamedPreferenceDto {
    fn from(p: NamedPreference) -> Self {
        Self {
            id: p.id,
            pref_name: p.pref_name,
            grid_name: p.grid_name,
            publica: p.publica,
            owner: p.owner,
            description: p.description,
            extra: p.extra,
        }
    }
}

impl From<NamedPreferenceDto> for NamedPreference {
    fn from(d: NamedPreferenceDto) -> Self {
        Self {
            id: d.id,
            pref_name: d.pref_name,
            grid_name: d.grid_name,
            publica: d.publica,
            owner: d.owner,
            description: d.description,
            extra: d.extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterDto {
    #[serde(default, deserialize_with = "nullable")]
    pub column_name: String,
    /// Any JSON value.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GridPreferenceDto {
    #[serde(default, deserialize_with = "id_number_or_string")]
    #[schema(value_type = u64)]
    pub id: PreferenceId,
    #[serde(default, deserialize_with = "nullable")]
    pub pref_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub grid_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub publica: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub owner: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub order_columns: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub hide_columns: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub freeze_columns: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Vec<Object>)]
    pub udf_columns: Vec<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub filters: Vec<FilterDto>,
}

impl From<GridPreference> for GridPreferenceDto {
    fn from(p: GridPreference) -> Self {
        let GridLayout {
            order_columns,
            hide_columns,
            freeze_columns,
            udf_columns,
            filters,
        } = p.layout;
        Self {
            id: p.id,
            pref_name: p.pref_name,
            grid_name: p.grid_name,
            publica: p.publica,
            owner: p.owner,
            description: p.description,
            order_columns,
            hide_columns: hide_columns.into_iter().collect(),
            freeze_columns,
            udf_columns,
            filters: filters
                .into_iter()
                .map(|f| FilterDto {
                    column_name: f.column_name,
                    value: f.value,
                })
                .collect(),
        }
    }
}

impl From<GridPreferenceDto> for GridPreference {
    fn from(d: GridPreferenceDto) -> Self {
        Self {
            id: d.id,
            pref_name: d.pref_name,
            grid_name: d.grid_name,
            publica: d.publica,
            owner: d.owner,
            description: d.description,
            layout: GridLayout {
                order_columns: d.order_columns,
                hide_columns: d.hide_columns.into_iter().collect(),
                freeze_columns: d.freeze_columns,
                udf_columns: d.udf_columns,
                filters: d
                    .filters
                    .into_iter()
                    .map(|f| GridFilter {
                        column_name: f.column_name,
                        value: f.value,
                    })
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceGridDto {
    #[serde(default, deserialize_with = "id_number_or_string")]
    #[schema(value_type = u64)]
    pub id: PreferenceId,
    #[serde(default, deserialize_with = "nullable")]
    pub grid_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub preferencias: Vec<GridPreferenceDto>,
}

impl From<PreferenceGrid> for PreferenceGridDto {
    fn from(g: PreferenceGrid) -> Self {
        Self {
            id: g.id,
            grid_name: g.grid_name,
            preferencias: g.preferences.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PreferenceGridDto> for PreferenceGrid {
    fn from(d: PreferenceGridDto) -> Self {
        Self {
            id: d.id,
            grid_name: d.grid_name,
            preferences: d.preferencias.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormPreferenceDto {
    #[serde(default, deserialize_with = "id_number_or_string")]
    #[schema(value_type = u64)]
    pub id: PreferenceId,
    #[serde(default, deserialize_with = "nullable")]
    pub pref_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub form_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub publica: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub owner: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub udfs: Vec<String>,
}

impl From<FormPreference> for FormPreferenceDto {
    fn from(p: FormPreference) -> Self {
        Self {
            id: p.id,
            pref_name: p.pref_name,
            form_name: p.form_name,
            publica: p.publica,
            owner: p.owner,
            description: p.description,
            udfs: p.layout.udfs,
        }
    }
}

impl From<FormPreferenceDto> for FormPreference {
    fn from(d: FormPreferenceDto) -> Self {
        Self {
            id: d.id,
            pref_name: d.pref_name,
            form_name: d.form_name,
            publica: d.publica,
            owner: d.owner,
            description: d.description,
            layout: FormLayout { udfs: d.udfs },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceFormDto {
    #[serde(default, deserialize_with = "id_number_or_string")]
    #[schema(value_type = u64)]
    pub id: PreferenceId,
    #[serde(default, deserialize_with = "nullable")]
    pub form_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub preferencias: Vec<FormPreferenceDto>,
}

impl From<PreferenceForm> for PreferenceFormDto {
    fn from(f: PreferenceForm) -> Self {
        Self {
            id: f.id,
            form_name: f.form_name,
            preferencias: f.preferences.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PreferenceFormDto> for PreferenceForm {
    fn from(d: PreferenceFormDto) -> Self {
        Self {
            id: d.id,
            form_name: d.form_name,
            preferences: d.preferencias.into_iter().map(Into::into).collect(),
        }
    }
}

/// Preferences of one view selected by name. The response echoes the
/// request with `preferencias` replaced by the removed preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteByNameDto {
    #[serde(default, deserialize_with = "id_number_or_string")]
    #[schema(value_type = u64)]
    pub id: PreferenceId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub preferencias: Vec<NamedPreferenceDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedCountDto {
    pub deleted: u64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsuarioQuery {
    /// User whose own and public preferences are returned.
    pub usuario: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GridByNameQuery {
    pub grid_name: String,
    /// Only preferences of this owner.
    pub owner: Option<String>,
    pub usuario: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FormByNameQuery {
    pub form_name: String,
    /// Only preferences of this owner.
    pub owner: Option<String>,
    pub usuario: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OtherOwnerQuery {
    /// Grid or form name.
    pub nombre: String,
    pub pref_nombre: String,
    pub usuario: String,
}
