//! Unit tests for CSV serialization and file naming

use chrono::{TimeZone, Utc};
use config_to_csv::config::parser::parse_config;
use config_to_csv::models::{DataRow, FieldId, Schema};
use config_to_csv::services::csv_export::{resolve_file_name, serialize, CsvExporter, ExportError};

fn schema(text: &str) -> Schema {
    parse_config(text).unwrap()
}

fn row(schema: &Schema, values: &[&str]) -> DataRow {
    schema
        .iter()
        .zip(values)
        .fold(DataRow::empty(schema), |row, (field, value)| {
            row.with(schema, &field.id, *value).unwrap()
        })
}

#[test]
fn test_header_uses_labels_in_schema_order() {
    let schema = schema("textbox: B\ntextbox: A\ndropdown: C | x");
    let csv = serialize(&schema, &[row(&schema, &["1", "2", "x"])], true).unwrap();
    assert_eq!(csv, "B,A,C\n1,2,x");
}

#[test]
fn test_values_follow_schema_not_insertion_order() {
    let schema = schema("textbox: First\ntextbox: Second");
    let row = DataRow::empty(&schema)
        .with(&schema, &FieldId::new("textbox-1"), "two")
        .unwrap()
        .with(&schema, &FieldId::new("textbox-0"), "one")
        .unwrap();
    assert_eq!(serialize(&schema, &[row], false).unwrap(), "one,two");
}

#[test]
fn test_quoting_only_when_needed() {
    let schema = schema("textbox: Value\ntextbox: Plain");
    let rows = [
        row(&schema, &["a,b", "x"]),
        row(&schema, &["say \"hi\"", "x"]),
        row(&schema, &["two\nlines", "x"]),
        row(&schema, &["  spaced  ", "x"]),
    ];
    assert_eq!(
        serialize(&schema, &rows, false).unwrap(),
        "\"a,b\",x\n\"say \"\"hi\"\"\",x\n\"two\nlines\",x\n  spaced  ,x"
    );
}

#[test]
fn test_labels_are_escaped_too() {
    let schema = schema("textbox: Last, First\ntextbox: Notes");
    let csv = serialize(&schema, &[row(&schema, &["Doe, J", ""])], true).unwrap();
    assert_eq!(csv, "\"Last, First\",Notes\n\"Doe, J\",");
}

#[test]
fn test_output_reads_back() {
    let schema = schema("textbox: Name\ntextbox: Quote\ndropdown: Status | Active, Inactive");
    let rows = [
        row(&schema, &["Jane, A.", "She said \"yes\"", "Active"]),
        row(&schema, &["Bob", "multi\nline", ""]),
    ];
    let csv = serialize(&schema, &rows, true).unwrap();

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, ["Name", "Quote", "Status"]);

    let records: Vec<Vec<String>> = reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect();
    assert_eq!(
        records,
        vec![
            vec!["Jane, A.", "She said \"yes\"", "Active"],
            vec!["Bob", "multi\nline", ""],
        ]
    );
}

#[test]
fn test_nothing_to_export() {
    let schema = schema("textbox: Name");
    assert!(matches!(serialize(&schema, &[], true), Err(ExportError::NothingToExport)));
}

#[test]
fn test_generated_and_explicit_names() {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(
        resolve_file_name("", "config-to-csv", at).unwrap(),
        format!("config-to-csv_{}.csv", at.timestamp_millis())
    );
    assert_eq!(resolve_file_name(" staff ", "p", at).unwrap(), "staff.csv");
    assert_eq!(resolve_file_name("staff.csv", "p", at).unwrap(), "staff.csv");
    assert!(resolve_file_name("staff?", "p", at).is_err());
}

#[test]
fn test_exporter_overwrites_existing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let exporter = CsvExporter::new(dir.path());

    exporter.export_as_file("old,content", "data.csv").unwrap();
    let exported = exporter.export_as_file("new", "data.csv").unwrap();

    assert_eq!(exported.bytes, 3);
    assert_eq!(std::fs::read_to_string(exported.path).unwrap(), "new");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
