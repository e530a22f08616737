//! Unit tests for configuration parsing
//!
//! Covers the line grammar, positional ids, the required marker and
//! error collection across lines.

use config_to_csv::config::parser::{parse_config, ConfigParser, ConfigSyntaxError};
use config_to_csv::models::{FieldId, FieldKind, SchemaError};

#[test]
fn test_parse_mixed_configuration() {
    let schema = parse_config(
        "textbox*: Full Name\n\
         dropdown*: Gender | Male, Female, Other\n\
         textbox: Email Address\n\
         dropdown: Department | Sales, Marketing, IT, HR",
    )
    .unwrap();

    assert_eq!(schema.len(), 4);
    let labels: Vec<&str> = schema.labels().collect();
    assert_eq!(labels, ["Full Name", "Gender", "Email Address", "Department"]);

    let gender = &schema.fields()[1];
    assert_eq!(gender.id, FieldId::new("dropdown-1"));
    assert!(gender.required);
    assert_eq!(
        gender.kind,
        FieldKind::Choice {
            options: vec!["Male".into(), "Female".into(), "Other".into()]
        }
    );

    let email = &schema.fields()[2];
    assert_eq!(email.kind, FieldKind::Text);
    assert!(!email.required);
    assert_eq!(email.options(), None);
}

#[test]
fn test_textbox_label_kept_verbatim() {
    let schema = parse_config("textbox: Time: HH:MM, local").unwrap();
    assert_eq!(schema.fields()[0].label, "Time: HH:MM, local");
}

#[test]
fn test_keywords_are_case_insensitive() {
    let schema = parse_config("TextBox*: A\nDROPDOWN: B | x").unwrap();
    assert_eq!(schema.fields()[0].kind, FieldKind::Text);
    assert!(schema.fields()[0].required);
    assert!(schema.fields()[1].is_choice());
}

#[test]
fn test_blank_lines_skipped_for_ids() {
    let schema = parse_config("\n  \ntextbox: A\n\n\ndropdown: B | x, y\n").unwrap();
    let ids: Vec<&str> = schema.iter().map(|field| field.id.as_str()).collect();
    assert_eq!(ids, ["textbox-0", "dropdown-1"]);
}

#[test]
fn test_same_text_gives_same_ids() {
    let text = "textbox: A\ndropdown: B | x\ntextbox: C";
    assert_eq!(parse_config(text).unwrap(), parse_config(text).unwrap());
}

#[test]
fn test_empty_options_filtered() {
    let schema = parse_config("dropdown: Size | S, , M ,").unwrap();
    assert_eq!(schema.fields()[0].options().unwrap(), ["S", "M"]);
}

#[test]
fn test_all_errors_collected_with_original_lines() {
    let errors = ConfigParser::new()
        .parse(
            "textbox: Fine\n\
             \n\
             checkbox: Nope\n\
             textbox without colon\n\
             textbox:   \n\
             dropdown: Size\n\
             dropdown: | a, b\n\
             dropdown: Size | , ",
        )
        .unwrap_err();

    assert_eq!(
        errors,
        vec![
            ConfigSyntaxError::UnknownComponentType {
                line: 3,
                keyword: "checkbox".into()
            },
            ConfigSyntaxError::InvalidFormat { line: 4 },
            ConfigSyntaxError::MissingLabel { line: 5 },
            ConfigSyntaxError::MissingOptionSeparator { line: 6 },
            ConfigSyntaxError::MissingLabel { line: 7 },
            ConfigSyntaxError::MissingOptions { line: 8 },
        ]
    );
    let lines: Vec<Option<usize>> = errors.iter().map(ConfigSyntaxError::line).collect();
    assert_eq!(lines, [Some(3), Some(4), Some(5), Some(6), Some(7), Some(8)]);
}

#[test]
fn test_empty_configuration() {
    for text in ["", "   ", "\n\n \t\n"] {
        assert_eq!(
            parse_config(text).unwrap_err(),
            vec![ConfigSyntaxError::EmptyConfiguration]
        );
    }
    assert_eq!(
        ConfigSyntaxError::EmptyConfiguration.to_string(),
        "Configuration cannot be empty"
    );
}

#[test]
fn test_error_messages_name_the_line() {
    let errors = parse_config("textbox: A\nwidget: B").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("Line 2: unknown component type \"widget\""));

    let source = SchemaError::DuplicateFieldId(FieldId::new("textbox-0"));
    let error = ConfigSyntaxError::Schema { line: 9, source };
    assert!(error.to_string().starts_with("Line 9: "));
}

#[test]
fn test_syntax_help_parses() {
    let help = ConfigParser::syntax_help();
    let example: String = help
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            line.starts_with("textbox") || line.starts_with("dropdown")
        })
        .collect::<Vec<_>>()
        .join("\n");
    assert!(parse_config(&example).is_ok());
}
