//! Rendering of any preference variant as a [`NamedPreference`].
//!
//! Free-form preferences keep their payload. Grid and form preferences carry
//! their layout as a JSON document in `extra`.

use preferences_sdk::{FormLayout, GridLayout, NamedPreference, Preference, PreferenceKind};
use serde_json::{Value, json};

#[must_use]
pub fn to_named(p: Preference) -> NamedPreference {
    let extra = match p.kind {
        PreferenceKind::Any { extra } => extra,
        PreferenceKind::Grid(layout) => grid_document(&layout).to_string(),
        PreferenceKind::Form(layout) => form_document(&layout).to_string(),
    };
    NamedPreference {
        id: p.id,
        pref_name: p.pref_name,
        grid_name: p.grid_name,
        publica: p.publica,
        owner: p.owner,
        description: p.description,
        extra,
    }
}

fn grid_document(layout: &GridLayout) -> Value {
    let filters: Vec<Value> = layout
        .filters
        .iter()
        .map(|f| json!({ "columnName": f.column_name, "value": f.value }))
        .collect();
    json!({
        "orderColumns": layout.order_columns,
        "hideColumns": layout.hide_columns,
        "freezeColumns": layout.freeze_columns,
        "udfColumns": layout.udf_columns,
        "filters": filters,
    })
}

fn form_document(layout: &FormLayout) -> Value {
    json!({ "udfs": layout.udfs })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use preferences_sdk::GridFilter;

    fn base(kind: PreferenceKind) -> Preference {
        Preference {
            id: 4,
            owner: "adminTEST".to_owned(),
            publica: false,
            description: "principal".to_owned(),
            pref_name: "Resumen".to_owned(),
            grid_name: "Posicion_Reporto".to_owned(),
            kind,
        }
    }

    #[test]
    fn free_form_payload_is_kept() {
        let named = to_named(base(PreferenceKind::Any {
            extra: "{\"tema\":\"oscuro\"}".to_owned(),
        }));
        assert_eq!(named.extra, "{\"tema\":\"oscuro\"}");
        assert_eq!(named.pref_name, "Resumen");
        assert_eq!(named.grid_name, "Posicion_Reporto");
    }

    #[test]
    fn grid_layout_is_rendered_as_document() {
        let layout = GridLayout {
            order_columns: vec!["fecha".to_owned()],
            hide_columns: ["monto".to_owned()].into_iter().collect(),
            filters: vec![GridFilter {
                column_name: "moneda".to_owned(),
                value: json!("MXN"),
            }],
            ..GridLayout::default()
        };
        let named = to_named(base(PreferenceKind::Grid(layout)));

        let doc: Value = serde_json::from_str(&named.extra).unwrap();
        assert_eq!(doc["orderColumns"], json!(["fecha"]));
        assert_eq!(doc["hideColumns"], json!(["monto"]));
        assert_eq!(doc["freezeColumns"], json!([]));
        assert_eq!(doc["udfColumns"], json!([]));
        assert_eq!(doc["filters"][0]["columnName"], "moneda");
    }

    #[test]
    fn form_layout_is_rendered_as_document() {
        let named = to_named(base(PreferenceKind::Form(FormLayout {
            udfs: vec!["rfc".to_owned()],
        })));
        assert_eq!(named.extra, r#"{"udfs":["rfc"]}"#);
    }
}
