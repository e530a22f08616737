use crate::models::{FieldDescriptor, FieldId, Schema, SchemaError};
use thiserror::Error;
use tracing::debug;

/// Separator between the component type and the rest of a line
const TYPE_SEPARATOR: char = ':';
/// Separator between a dropdown label and its options
const OPTIONS_SEPARATOR: char = '|';
/// Separator between dropdown options
const OPTION_SEPARATOR: char = ',';
/// Marker placed right after the type keyword to make a field required
const REQUIRED_MARKER: char = '*';

const TEXTBOX_KEYWORD: &str = "textbox";
const DROPDOWN_KEYWORD: &str = "dropdown";

const SYNTAX_HELP: &str = "\
Each non-blank line defines one form field:

  textbox: <label>
  dropdown: <label> | <option>, <option>, ...

Append * to the type to make the field required (textbox*: Name).
Type names are case-insensitive and blank lines are ignored.

Example:

textbox*: Full Name
dropdown*: Gender | Male, Female, Other
textbox: Email Address
dropdown: Department | Sales, Marketing, IT, HR
";

/// A problem found while parsing the form configuration.
///
/// Line numbers are 1-based and refer to the original text, blank lines
/// included.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigSyntaxError {
    #[error("Configuration cannot be empty")]
    EmptyConfiguration,
    #[error("Line {line}: invalid format, use \"textbox: label\" or \"dropdown: label | option1, option2\"")]
    InvalidFormat { line: usize },
    #[error("Line {line}: unknown component type \"{keyword}\", use \"textbox\" or \"dropdown\"")]
    UnknownComponentType { line: usize, keyword: String },
    #[error("Line {line}: missing label")]
    MissingLabel { line: usize },
    #[error("Line {line}: dropdown needs a label and options separated by \"|\"")]
    MissingOptionSeparator { line: usize },
    #[error("Line {line}: dropdown needs at least one option")]
    MissingOptions { line: usize },
    #[error("Line {line}: {source}")]
    Schema { line: usize, source: SchemaError },
}

impl ConfigSyntaxError {
    /// Source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ConfigSyntaxError::EmptyConfiguration => None,
            ConfigSyntaxError::InvalidFormat { line }
            | ConfigSyntaxError::UnknownComponentType { line, .. }
            | ConfigSyntaxError::MissingLabel { line }
            | ConfigSyntaxError::MissingOptionSeparator { line }
            | ConfigSyntaxError::MissingOptions { line }
            | ConfigSyntaxError::Schema { line, .. } => Some(*line),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComponentType {
    Textbox,
    Dropdown,
}

impl ComponentType {
    fn keyword(self) -> &'static str {
        match self {
            ComponentType::Textbox => TEXTBOX_KEYWORD,
            ComponentType::Dropdown => DROPDOWN_KEYWORD,
        }
    }
}

/// Parser for the line-oriented form configuration syntax.
///
/// The parser keeps no state between calls; parsing the same text twice
/// yields identical schemas, ids included.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigParser;

impl ConfigParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse configuration text into a schema.
    ///
    /// Every line is checked; on failure all line errors are returned
    /// together and no schema is produced.
    pub fn parse(&self, text: &str) -> Result<Schema, Vec<ConfigSyntaxError>> {
        let mut schema = Schema::new();
        let mut errors = Vec::new();
        let mut position = 0;

        for (line_index, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let line_number = line_index + 1;

            match self.parse_line(line, line_number, position) {
                Ok(field) => {
                    if let Err(source) = schema.insert(field) {
                        errors.push(ConfigSyntaxError::Schema {
                            line: line_number,
                            source,
                        });
                    }
                }
                Err(error) => errors.push(error),
            }
            position += 1;
        }

        if position == 0 {
            return Err(vec![ConfigSyntaxError::EmptyConfiguration]);
        }

        if errors.is_empty() {
            debug!("Parsed configuration into {} fields", schema.len());
            Ok(schema)
        } else {
            debug!("Configuration has {} errors", errors.len());
            Err(errors)
        }
    }

    /// Grammar help shown to users writing a configuration.
    pub fn syntax_help() -> &'static str {
        SYNTAX_HELP
    }

    fn parse_line(
        &self,
        line: &str,
        line_number: usize,
        position: usize,
    ) -> Result<FieldDescriptor, ConfigSyntaxError> {
        let (head, rest) = line
            .split_once(TYPE_SEPARATOR)
            .ok_or(ConfigSyntaxError::InvalidFormat { line: line_number })?;

        let (component, required) = self.parse_type(head.trim(), line_number)?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(ConfigSyntaxError::MissingLabel { line: line_number });
        }

        let id = FieldId::positional(component.keyword(), position);
        match component {
            ComponentType::Textbox => Ok(FieldDescriptor::text(id, rest, required)),
            ComponentType::Dropdown => {
                let (label, options) = self.parse_dropdown(rest, line_number)?;
                Ok(FieldDescriptor::choice(id, label, required, options))
            }
        }
    }

    fn parse_type(
        &self,
        head: &str,
        line_number: usize,
    ) -> Result<(ComponentType, bool), ConfigSyntaxError> {
        let (keyword, required) = match head.strip_suffix(REQUIRED_MARKER) {
            Some(keyword) => (keyword, true),
            None => (head, false),
        };

        let component = if keyword.eq_ignore_ascii_case(TEXTBOX_KEYWORD) {
            ComponentType::Textbox
        } else if keyword.eq_ignore_ascii_case(DROPDOWN_KEYWORD) {
            ComponentType::Dropdown
        } else {
            return Err(ConfigSyntaxError::UnknownComponentType {
                line: line_number,
                keyword: head.to_string(),
            });
        };

        Ok((component, required))
    }

    fn parse_dropdown(
        &self,
        rest: &str,
        line_number: usize,
    ) -> Result<(String, Vec<String>), ConfigSyntaxError> {
        let (label, options) = rest
            .split_once(OPTIONS_SEPARATOR)
            .ok_or(ConfigSyntaxError::MissingOptionSeparator { line: line_number })?;

        let label = label.trim();
        if label.is_empty() {
            return Err(ConfigSyntaxError::MissingLabel { line: line_number });
        }

        let options: Vec<String> = options
            .split(OPTION_SEPARATOR)
            .map(str::trim)
            .filter(|option| !option.is_empty())
            .map(str::to_string)
            .collect();

        if options.is_empty() {
            return Err(ConfigSyntaxError::MissingOptions { line: line_number });
        }

        Ok((label.to_string(), options))
    }
}

/// Parse configuration text with the default parser.
pub fn parse_config(text: &str) -> Result<Schema, Vec<ConfigSyntaxError>> {
    ConfigParser::new().parse(text)
}
