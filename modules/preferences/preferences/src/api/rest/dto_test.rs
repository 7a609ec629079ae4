#![allow(clippy::unwrap_used, clippy::expect_used)]

use preferences_sdk::{GridFilter, GridLayout, GridPreference, NamedPreference, PreferenceGrid};
use serde_json::{Value, json};

use super::codec;
use super::dto::{DeleteByNameDto, NamedPreferenceDto, PreferenceFormDto, PreferenceGridDto};

fn test_grid() -> PreferenceGrid {
    PreferenceGrid {
        id: 0,
        grid_name: "TESTGrid".to_owned(),
        preferences: vec![GridPreference {
            id: 0,
            pref_name: "TestResumen".to_owned(),
            grid_name: "TestGrid".to_owned(),
            publica: true,
            owner: "TEST".to_owned(),
            description: String::new(),
            layout: GridLayout::default(),
        }],
    }
}

#[test]
fn test_grid_document_keeps_id_and_grid_name() {
    let bytes = codec::serialize::<PreferenceGridDto>(test_grid()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(doc["id"], json!(0));
    assert_eq!(doc["gridName"], json!("TESTGrid"));
    assert_eq!(doc["preferencias"][0]["prefName"], json!("TestResumen"));
}

#[test]
fn test_grid_document_reads_back_equal() {
    let doc = json!({
        "id": 0,
        "gridName": "TESTGrid",
        "preferencias": [{
            "id": 0,
            "prefName": "TestResumen",
            "gridName": "TestGrid",
            "publica": true,
            "owner": "TEST",
            "description": "",
            "orderColumns": [],
            "hideColumns": [],
            "freezeColumns": [],
            "udfColumns": [],
            "filters": []
        }]
    });
    let grid = codec::deserialize::<PreferenceGridDto>(doc.to_string().as_bytes()).unwrap();
    assert_eq!(grid, test_grid());
}

#[test]
fn empty_sequences_are_written_as_arrays() {
    let bytes = codec::serialize::<PreferenceGridDto>(test_grid()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    let entry = &doc["preferencias"][0];

    for field in ["orderColumns", "hideColumns", "freezeColumns", "udfColumns", "filters"] {
        assert_eq!(entry[field], json!([]), "{field} must be an empty array");
    }
    assert_eq!(
        codec::deserialize::<PreferenceGridDto>(&bytes).unwrap(),
        test_grid()
    );
}

#[test]
fn missing_and_null_sequences_read_as_empty() {
    let doc = json!({
        "gridName": "TESTGrid",
        "preferencias": [{
            "prefName": "TestResumen",
            "gridName": "TestGrid",
            "publica": true,
            "owner": "TEST",
            "description": null,
            "hideColumns": null,
            "filters": null
        }]
    });
    let grid = codec::deserialize::<PreferenceGridDto>(doc.to_string().as_bytes()).unwrap();
    assert_eq!(grid, test_grid());

    let form = codec::deserialize::<PreferenceFormDto>(br#"{"formName":"f","preferencias":null}"#)
        .unwrap();
    assert!(form.preferences.is_empty());
}

#[test]
fn quoted_and_numeric_ids_decode_the_same() {
    let quoted = codec::deserialize::<PreferenceGridDto>(
        br#"{"id":"0","gridName":"TESTGrid","preferencias":[{"id":"12","prefName":"a"}]}"#,
    )
    .unwrap();
    let numeric = codec::deserialize::<PreferenceGridDto>(
        br#"{"id":0,"gridName":"TESTGrid","preferencias":[{"id":12,"prefName":"a"}]}"#,
    )
    .unwrap();
    assert_eq!(quoted, numeric);
    assert_eq!(quoted.preferences[0].id, 12);
}

#[test]
fn ids_are_always_written_as_numbers() {
    let named = NamedPreference {
        id: 41,
        pref_name: "tema".to_owned(),
        ..NamedPreference::default()
    };
    let bytes = codec::serialize::<NamedPreferenceDto>(named).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["id"], json!(41));
}

#[test]
fn malformed_ids_are_rejected() {
    for id in [r#""-1""#, r#"" 12 ""#, r#""+3""#, r#""""#, "-1", r#""abc""#, "1.5"] {
        let doc = format!(r#"{{"id":{id},"prefName":"x"}}"#);
        assert!(
            codec::deserialize::<NamedPreferenceDto>(doc.as_bytes()).is_err(),
            "id {id} should be rejected"
        );
    }
}

#[test]
fn filter_values_keep_their_json_shape() {
    let mut grid = test_grid();
    grid.preferences[0].layout.filters = vec![GridFilter {
        column_name: "plazo".to_owned(),
        value: json!({ "min": 1, "max": 28 }),
    }];
    grid.preferences[0].layout.hide_columns = ["monto".to_owned()].into_iter().collect();

    let bytes = codec::serialize::<PreferenceGridDto>(grid.clone()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        doc["preferencias"][0]["filters"][0],
        json!({ "columnName": "plazo", "value": { "min": 1, "max": 28 } })
    );
    assert_eq!(codec::deserialize::<PreferenceGridDto>(&bytes).unwrap(), grid);
}

#[test]
fn delete_by_name_document_defaults() {
    let doc: DeleteByNameDto =
        codec::read(br#"{"name":"Posicion_Directo","preferencias":[{"prefName":"Resumen"}]}"#)
            .unwrap();
    assert_eq!(doc.id, 0);
    assert_eq!(doc.preferencias.len(), 1);
    assert_eq!(doc.preferencias[0].pref_name, "Resumen");
    assert_eq!(doc.preferencias[0].extra, "");
}
