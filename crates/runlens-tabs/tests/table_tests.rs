mod support;

use std::sync::Arc;

use runlens_tabs::*;
use support::*;

fn mixed_table_tab() -> TableTab {
    TableTab::new("Personal Bests", true, "fastest efforts", |_| {
        Ok(Table::new()
            .with_column("Sport", vec![Cell::text("Run"), Cell::text("Ride"), Cell::text("Swim")])
            .with_column(
                "Activity",
                vec![
                    Cell::link("https://example.com/a/1", "Parkrun"),
                    Cell::Null,
                    Cell::link("https://example.com/a/3", "Lake swim"),
                ],
            )
            .with_column("Distance (km)", vec![Cell::Number(5.0), Cell::Number(40.2), Cell::Null]))
    })
}

#[test]
fn test_only_columns_with_links_are_typed_link() {
    let data = mixed_table_tab().get_table_data(&[]).unwrap();
    let types: Vec<(&str, ColumnType)> = data
        .columns
        .iter()
        .map(|c| (c.column_name.as_str(), c.column_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("Sport", ColumnType::String),
            ("Activity", ColumnType::Link),
            ("Distance (km)", ColumnType::String),
        ]
    );
}

#[test]
fn test_link_column_cells_serialize_as_url_text_or_null() {
    let data = mixed_table_tab().get_table_data(&[]).unwrap();
    assert_eq!(
        data.table_data["Activity"],
        serde_json::json!([
            {"url": "https://example.com/a/1", "text": "Parkrun"},
            null,
            {"url": "https://example.com/a/3", "text": "Lake swim"}
        ])
    );
    for value in data.table_data["Activity"].as_array().unwrap() {
        assert!(value.is_null() || (value.get("url").is_some() && value.get("text").is_some()));
    }
    assert_eq!(data.table_data["Sport"], serde_json::json!(["Run", "Ride", "Swim"]));
}

#[test]
fn test_table_payload_shape() {
    let json = serde_json::to_value(mixed_table_tab().get_table_data(&[]).unwrap()).unwrap();
    assert_eq!(json["show_headings"], true);
    assert_eq!(json["columns"][1], serde_json::json!({"column_name": "Activity", "column_type": "link"}));
    let order: Vec<&String> = json["table_data"].as_object().unwrap().keys().collect();
    assert_eq!(order, vec!["Sport", "Activity", "Distance (km)"]);
}

#[test]
fn test_headings_can_be_hidden() {
    let data = names_table("Names").with_headings(false).get_table_data(&runs()).unwrap();
    assert!(!data.show_headings);
    assert_eq!(data.table_data["Name"], serde_json::json!(["Morning Run", "Long Run"]));
}

#[test]
fn test_processed_table_round_trips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let env = env_with(Arc::new(MemStore::default()), dir.path());
    let tab = mixed_table_tab();

    tab.backend_processing_hook(&runs(), &env, AthleteId(4)).unwrap();
    let served = tab.retrieve_frontend_data(&env, AthleteId(4)).unwrap();
    let direct = serde_json::to_value(tab.get_table_data(&runs()).unwrap()).unwrap();
    assert_eq!(served, direct);
}
