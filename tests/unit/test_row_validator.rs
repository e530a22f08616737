//! Unit tests for row and file name validation

use config_to_csv::config::parser::parse_config;
use config_to_csv::config::validator::{
    validate_file_name, validate_row, FieldErrorKind, FileNameError, RowValidator,
};
use config_to_csv::models::{DataRow, FieldId, Schema};

fn schema() -> Schema {
    parse_config("textbox*: Full Name\ndropdown*: Gender | Male, Female\ntextbox: Notes\ndropdown: Team | Red, Blue")
        .unwrap()
}

fn row(schema: &Schema, values: &[(&str, &str)]) -> DataRow {
    values.iter().fold(DataRow::empty(schema), |row, (id, value)| {
        row.with(schema, &FieldId::new(*id), *value).unwrap()
    })
}

#[test]
fn test_valid_row_has_no_errors() {
    let schema = schema();
    let row = row(&schema, &[("textbox-0", "Jane"), ("dropdown-1", "Female")]);
    assert!(validate_row(&schema, &row).is_empty());
    assert!(RowValidator::default().is_acceptable(&schema, &row));
}

#[test]
fn test_errors_reported_in_field_order() {
    let schema = schema();
    let row = row(&schema, &[("textbox-0", "   "), ("dropdown-3", "Green")]);
    let errors = validate_row(&schema, &row);

    let summary: Vec<(&str, FieldErrorKind)> = errors
        .iter()
        .map(|error| (error.field_id.as_str(), error.kind))
        .collect();
    assert_eq!(
        summary,
        [
            ("textbox-0", FieldErrorKind::Required),
            ("dropdown-1", FieldErrorKind::Required),
            ("dropdown-3", FieldErrorKind::InvalidOption),
        ]
    );

    let messages: Vec<String> = errors.iter().map(|error| error.message()).collect();
    assert_eq!(
        messages,
        [
            "Full Name is required",
            "Gender is required",
            "Invalid option selected for Team",
        ]
    );
}

#[test]
fn test_optional_fields_may_stay_empty() {
    let schema = schema();
    let row = row(&schema, &[("textbox-0", "A"), ("dropdown-1", "Male"), ("dropdown-3", "")]);
    assert!(validate_row(&schema, &row).is_empty());
}

#[test]
fn test_option_match_is_exact() {
    let schema = schema();
    let row = row(&schema, &[("textbox-0", "A"), ("dropdown-1", "male")]);
    let errors = validate_row(&schema, &row);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, FieldErrorKind::InvalidOption);
}

#[test]
fn test_text_length_counts_characters() {
    let schema = schema();
    let at_limit = "é".repeat(500);
    let row_ok = row(&schema, &[("textbox-0", at_limit.as_str()), ("dropdown-1", "Male")]);
    assert!(validate_row(&schema, &row_ok).is_empty());

    let over = "x".repeat(501);
    let row_long = row(&schema, &[("textbox-0", "A"), ("dropdown-1", "Male"), ("textbox-2", over.as_str())]);
    let errors = validate_row(&schema, &row_long);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, FieldErrorKind::TooLong { max: 500 });
    assert_eq!(errors[0].to_string(), "Notes must be less than 500 characters");
}

#[test]
fn test_whitespace_values_still_checked_against_options_and_length() {
    let schema = parse_config("dropdown: Status | Active,Inactive\ntextbox: Note").unwrap();
    let spaces = " ".repeat(600);
    let row = row(&schema, &[("dropdown-0", "   "), ("textbox-1", spaces.as_str())]);

    let kinds: Vec<FieldErrorKind> = validate_row(&schema, &row)
        .iter()
        .map(|error| error.kind)
        .collect();
    assert_eq!(
        kinds,
        [FieldErrorKind::InvalidOption, FieldErrorKind::TooLong { max: 500 }]
    );
}

#[test]
fn test_blank_required_text_can_break_two_rules() {
    let schema = parse_config("textbox*: Code").unwrap();
    let validator = RowValidator::with_max_text_length(2);
    let row = row(&schema, &[("textbox-0", "     ")]);

    let kinds: Vec<FieldErrorKind> = validator
        .validate(&schema, &row)
        .iter()
        .map(|error| error.kind)
        .collect();
    assert_eq!(kinds, [FieldErrorKind::Required, FieldErrorKind::TooLong { max: 2 }]);
}

#[test]
fn test_custom_length_limit() {
    let schema = schema();
    let validator = RowValidator::with_max_text_length(3);
    let row = row(&schema, &[("textbox-0", "Jane"), ("dropdown-1", "Male")]);
    assert_eq!(
        validator.validate(&schema, &row)[0].kind,
        FieldErrorKind::TooLong { max: 3 }
    );
}

#[test]
fn test_file_names() {
    assert_eq!(validate_file_name(""), Ok(()));
    assert_eq!(validate_file_name("   "), Ok(()));
    assert_eq!(validate_file_name("report 2024.csv"), Ok(()));

    for bad in ["a/b", "a\\b", "a:b", "a*b", "a?b", "a\"b", "a<b", "a>b", "a|b"] {
        assert_eq!(validate_file_name(bad), Err(FileNameError::InvalidCharacters), "{}", bad);
    }

    assert_eq!(validate_file_name(&"n".repeat(255)), Ok(()));
    assert_eq!(
        validate_file_name(&"n".repeat(256)),
        Err(FileNameError::TooLong { length: 256 })
    );
}
