use crate::models::{DataRow, FieldDescriptor, FieldId, FieldKind, Schema};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Longest accepted value for a text field, in characters
pub const MAX_TEXT_LENGTH: usize = 500;
/// Longest accepted export file name, in characters
pub const MAX_FILE_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    TooLong { max: usize },
    InvalidOption,
}

/// Validation failure attributed to one field of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field_id: FieldId,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldErrorKind,
}

impl FieldError {
    fn new(field: &FieldDescriptor, kind: FieldErrorKind) -> Self {
        Self {
            field_id: field.id.clone(),
            label: field.label.clone(),
            kind,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FieldErrorKind::Required => write!(f, "{} is required", self.label),
            FieldErrorKind::TooLong { max } => {
                write!(f, "{} must be less than {} characters", self.label, max)
            }
            FieldErrorKind::InvalidOption => write!(f, "Invalid option selected for {}", self.label),
        }
    }
}

impl std::error::Error for FieldError {}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FileNameError {
    #[error("File name cannot be empty")]
    Empty,
    #[error("File name contains invalid characters")]
    InvalidCharacters,
    #[error("File name is too long ({length} characters, max 255)")]
    TooLong { length: usize },
}

/// Validates candidate rows against a schema.
#[derive(Debug, Clone)]
pub struct RowValidator {
    max_text_length: usize,
}

impl Default for RowValidator {
    fn default() -> Self {
        Self {
            max_text_length: MAX_TEXT_LENGTH,
        }
    }
}

impl RowValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_text_length(max_text_length: usize) -> Self {
        Self { max_text_length }
    }

    /// Check every field of the row and report all violations.
    pub fn validate(&self, schema: &Schema, row: &DataRow) -> Vec<FieldError> {
        schema
            .iter()
            .flat_map(|field| self.validate_field(field, row.value(&field.id)))
            .collect()
    }

    /// True when the row may be stored.
    pub fn is_acceptable(&self, schema: &Schema, row: &DataRow) -> bool {
        self.validate(schema, row).is_empty()
    }

    // Each rule is checked on its own, so one field may break several.
    fn validate_field(&self, field: &FieldDescriptor, value: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if field.required && value.trim().is_empty() {
            errors.push(FieldError::new(field, FieldErrorKind::Required));
        }

        match &field.kind {
            FieldKind::Text if value.chars().count() > self.max_text_length => {
                errors.push(FieldError::new(
                    field,
                    FieldErrorKind::TooLong {
                        max: self.max_text_length,
                    },
                ));
            }
            FieldKind::Choice { options }
                if !value.is_empty() && !options.iter().any(|option| option == value) =>
            {
                errors.push(FieldError::new(field, FieldErrorKind::InvalidOption));
            }
            _ => {}
        }

        errors
    }
}

/// Validate a row with the default limits.
pub fn validate_row(schema: &Schema, row: &DataRow) -> Vec<FieldError> {
    RowValidator::default().validate(schema, row)
}

fn invalid_file_name_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("file name pattern is valid"))
}

/// Check a user-supplied export file name.
///
/// Blank names pass; a name is generated for them at export time.
pub fn validate_file_name(name: &str) -> Result<(), FileNameError> {
    if name.trim().is_empty() {
        return Ok(());
    }

    if invalid_file_name_chars().is_match(name) {
        return Err(FileNameError::InvalidCharacters);
    }

    let length = name.chars().count();
    if length > MAX_FILE_NAME_LENGTH {
        return Err(FileNameError::TooLong { length });
    }

    Ok(())
}
