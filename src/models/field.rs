//! Field descriptor model
//!
//! A field descriptor is the schema unit produced by parsing one line of the
//! form configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a field within one parsed schema.
///
/// Ids are derived from the component type and the position of the line
/// among the non-blank configuration lines, e.g. `textbox-0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the positional id for a component keyword.
    pub fn positional(keyword: &str, index: usize) -> Self {
        Self(format!("{}-{}", keyword, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Kind of input control a field renders as.
///
/// Options only exist on the `Choice` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line free text
    Text,
    /// Single selection out of a fixed list
    Choice { options: Vec<String> },
}

impl FieldKind {
    /// Configuration keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldKind::Text => "textbox",
            FieldKind::Choice { .. } => "dropdown",
        }
    }
}

/// One form field of a parsed schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Unique id within the schema
    pub id: FieldId,

    /// Display name, also used as the CSV column header
    pub label: String,

    /// Whether an empty value blocks the row
    pub required: bool,

    /// Control kind and, for choices, the allowed options
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn text(id: FieldId, label: impl Into<String>, required: bool) -> Self {
        Self {
            id,
            label: label.into(),
            required,
            kind: FieldKind::Text,
        }
    }

    pub fn choice(id: FieldId, label: impl Into<String>, required: bool, options: Vec<String>) -> Self {
        Self {
            id,
            label: label.into(),
            required,
            kind: FieldKind::Choice { options },
        }
    }

    /// Allowed options, present only for choice fields.
    pub fn options(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::Text => None,
            FieldKind::Choice { options } => Some(options),
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.kind, FieldKind::Choice { .. })
    }
}
