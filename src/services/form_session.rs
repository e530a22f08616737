//! Row-entry state machine
//!
//! All state changes flow through [`reduce`]: it takes the current state and
//! an action and returns the next state plus the side effects the caller
//! must perform. The reducer itself performs no I/O.

use crate::config::app_config::DEFAULT_FILE_NAME_PREFIX;
use crate::config::parser::{ConfigParser, ConfigSyntaxError};
use crate::config::settings::{SettingKey, Settings};
use crate::config::validator::{FieldError, FileNameError, RowValidator};
use crate::models::{DataRow, FieldId, RowStore, RowStoreError, Schema, SchemaError};
use crate::services::csv_export::{resolve_file_name, serialize, ExportError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Whether the draft row creates a new row or replaces a stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Adding,
    Editing { index: usize },
}

/// Why the user is being asked to confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationReason {
    /// Applying a new schema drops the stored rows
    DiscardRows { row_count: usize },
}

/// Work deferred until the user answers a confirmation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    ReplaceSchema(Schema),
    KeepSchema,
}

/// Outstanding yes/no request, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    Idle,
    AwaitingConfirmation {
        reason: ConfirmationReason,
        on_accept: Deferred,
        on_reject: Deferred,
    },
}

impl Confirmation {
    pub fn is_pending(&self) -> bool {
        matches!(self, Confirmation::AwaitingConfirmation { .. })
    }
}

/// User intents handled by the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the raw configuration text
    EditConfig(String),
    /// Parse the configuration and build a new form
    Generate,
    /// Answer yes to the pending confirmation
    Confirm,
    /// Answer no to the pending confirmation
    Reject,
    /// Change one value of the draft row
    SetField { field_id: FieldId, value: String },
    /// Validate the draft row and store it
    SubmitRow,
    /// Load a stored row into the draft for editing
    StartEdit(usize),
    /// Drop the draft row
    CancelEdit,
    DeleteRow(usize),
    SetFileName(String),
    SetRemoveHeaders(bool),
    /// Serialize the stored rows; `at` names generated files
    Export { at: DateTime<Utc> },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write a setting to the key-value store
    Persist { key: SettingKey, value: Value },
    /// Write CSV text to a file
    WriteCsv { file_name: String, contents: String },
}

/// Reasons an action was refused. The state is left unchanged apart from
/// attached error lists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A confirmation is pending")]
    AwaitingConfirmation,
    #[error("There is nothing to confirm")]
    NothingToConfirm,
    #[error("Generate a form from the configuration first")]
    NoSchema,
    #[error("Configuration has {error_count} errors")]
    InvalidConfiguration { error_count: usize },
    #[error("Row has {error_count} validation errors")]
    InvalidRow { error_count: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    RowStore(#[from] RowStoreError),
    #[error(transparent)]
    FileName(#[from] FileNameError),
    #[error("Nothing to export")]
    NothingToExport,
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<ExportError> for SessionError {
    fn from(error: ExportError) -> Self {
        match error {
            ExportError::NothingToExport => SessionError::NothingToExport,
            ExportError::FileName(e) => SessionError::FileName(e),
            other => SessionError::Serialization(other.to_string()),
        }
    }
}

/// Complete application state of one form session.
#[derive(Debug, Clone)]
pub struct FormState {
    settings: Settings,
    config_errors: Vec<ConfigSyntaxError>,
    schema: Option<Schema>,
    rows: RowStore,
    draft: DataRow,
    draft_errors: Vec<FieldError>,
    mode: EntryMode,
    confirmation: Confirmation,
    last_error: Option<SessionError>,
    parser: ConfigParser,
    validator: RowValidator,
    file_name_prefix: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl FormState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            config_errors: Vec::new(),
            schema: None,
            rows: RowStore::new(),
            draft: DataRow::default(),
            draft_errors: Vec::new(),
            mode: EntryMode::Adding,
            confirmation: Confirmation::Idle,
            last_error: None,
            parser: ConfigParser::new(),
            validator: RowValidator::default(),
            file_name_prefix: DEFAULT_FILE_NAME_PREFIX.to_string(),
        }
    }

    pub fn with_validator(mut self, validator: RowValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_file_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_name_prefix = prefix.into();
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_text(&self) -> &str {
        &self.settings.config_text
    }

    pub fn config_errors(&self) -> &[ConfigSyntaxError] {
        &self.config_errors
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn draft(&self) -> &DataRow {
        &self.draft
    }

    pub fn draft_errors(&self) -> &[FieldError] {
        &self.draft_errors
    }

    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    pub fn confirmation(&self) -> &Confirmation {
        &self.confirmation
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }
}

/// Result of one reducer step.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: FormState,
    pub effects: Vec<Effect>,
}

/// Apply one action to the state.
pub fn reduce(mut state: FormState, action: Action) -> Transition {
    state.last_error = None;
    let mut effects = Vec::new();

    if let Err(error) = apply(&mut state, action, &mut effects) {
        debug!("Action refused: {}", error);
        state.last_error = Some(error);
    }

    Transition { state, effects }
}

fn apply(state: &mut FormState, action: Action, effects: &mut Vec<Effect>) -> Result<(), SessionError> {
    if state.confirmation.is_pending() && !matches!(action, Action::Confirm | Action::Reject) {
        return Err(SessionError::AwaitingConfirmation);
    }

    match action {
        Action::EditConfig(text) => {
            state.settings.config_text = text;
            persist(state, SettingKey::ConfigText, effects);
            Ok(())
        }
        Action::Generate => generate(state),
        Action::Confirm => resolve_confirmation(state, true),
        Action::Reject => resolve_confirmation(state, false),
        Action::SetField { field_id, value } => set_field(state, &field_id, value),
        Action::SubmitRow => submit_row(state),
        Action::StartEdit(index) => start_edit(state, index),
        Action::CancelEdit => {
            reset_draft(state);
            Ok(())
        }
        Action::DeleteRow(index) => delete_row(state, index),
        Action::SetFileName(name) => {
            state.settings.file_name = name;
            persist(state, SettingKey::FileName, effects);
            Ok(())
        }
        Action::SetRemoveHeaders(remove) => {
            state.settings.remove_headers = remove;
            persist(state, SettingKey::RemoveHeaders, effects);
            Ok(())
        }
        Action::Export { at } => export(state, at, effects),
    }
}

fn persist(state: &FormState, key: SettingKey, effects: &mut Vec<Effect>) {
    effects.push(Effect::Persist {
        key,
        value: state.settings.value_of(key),
    });
}

fn generate(state: &mut FormState) -> Result<(), SessionError> {
    let schema = match state.parser.parse(&state.settings.config_text) {
        Ok(schema) => schema,
        Err(errors) => {
            let error_count = errors.len();
            state.config_errors = errors;
            return Err(SessionError::InvalidConfiguration { error_count });
        }
    };
    state.config_errors.clear();

    if state.rows.is_empty() {
        apply_schema(state, schema);
    } else {
        debug!("Schema regeneration waits for confirmation");
        state.confirmation = Confirmation::AwaitingConfirmation {
            reason: ConfirmationReason::DiscardRows {
                row_count: state.rows.len(),
            },
            on_accept: Deferred::ReplaceSchema(schema),
            on_reject: Deferred::KeepSchema,
        };
    }
    Ok(())
}

fn resolve_confirmation(state: &mut FormState, accepted: bool) -> Result<(), SessionError> {
    let (on_accept, on_reject) = match std::mem::take(&mut state.confirmation) {
        Confirmation::Idle => return Err(SessionError::NothingToConfirm),
        Confirmation::AwaitingConfirmation {
            on_accept,
            on_reject,
            ..
        } => (on_accept, on_reject),
    };

    match if accepted { on_accept } else { on_reject } {
        Deferred::ReplaceSchema(schema) => apply_schema(state, schema),
        Deferred::KeepSchema => {}
    }
    Ok(())
}

fn apply_schema(state: &mut FormState, schema: Schema) {
    debug!("Applying schema with {} fields", schema.len());
    state.rows.clear();
    state.draft = DataRow::empty(&schema);
    state.draft_errors.clear();
    state.mode = EntryMode::Adding;
    state.schema = Some(schema);
}

fn reset_draft(state: &mut FormState) {
    state.draft = state.schema.as_ref().map(DataRow::empty).unwrap_or_default();
    state.draft_errors.clear();
    state.mode = EntryMode::Adding;
}

fn set_field(state: &mut FormState, field_id: &FieldId, value: String) -> Result<(), SessionError> {
    let schema = state.schema.as_ref().ok_or(SessionError::NoSchema)?;
    state.draft.set(schema, field_id, value)?;
    state.draft_errors = state.validator.validate(schema, &state.draft);
    Ok(())
}

fn submit_row(state: &mut FormState) -> Result<(), SessionError> {
    let schema = state.schema.as_ref().ok_or(SessionError::NoSchema)?;
    let errors = state.validator.validate(schema, &state.draft);
    if !errors.is_empty() {
        let error_count = errors.len();
        state.draft_errors = errors;
        return Err(SessionError::InvalidRow { error_count });
    }

    let row = std::mem::replace(&mut state.draft, DataRow::empty(schema));
    match state.mode {
        EntryMode::Adding => state.rows.push(row),
        EntryMode::Editing { index } => {
            if let Err(e) = state.rows.replace(index, row.clone()) {
                state.draft = row;
                return Err(e.into());
            }
        }
    }

    state.draft_errors.clear();
    state.mode = EntryMode::Adding;
    Ok(())
}

fn start_edit(state: &mut FormState, index: usize) -> Result<(), SessionError> {
    if state.schema.is_none() {
        return Err(SessionError::NoSchema);
    }
    let row = state.rows.get(index).cloned().ok_or(RowStoreError::OutOfRange {
        index,
        len: state.rows.len(),
    })?;

    state.draft = row;
    state.draft_errors.clear();
    state.mode = EntryMode::Editing { index };
    Ok(())
}

fn delete_row(state: &mut FormState, index: usize) -> Result<(), SessionError> {
    state.rows.remove(index)?;

    if let EntryMode::Editing { index: editing } = state.mode {
        if editing == index {
            reset_draft(state);
        } else if editing > index {
            state.mode = EntryMode::Editing { index: editing - 1 };
        }
    }
    Ok(())
}

fn export(state: &FormState, at: DateTime<Utc>, effects: &mut Vec<Effect>) -> Result<(), SessionError> {
    let file_name = resolve_file_name(&state.settings.file_name, &state.file_name_prefix, at)?;
    let schema = state.schema.as_ref().ok_or(SessionError::NothingToExport)?;
    let contents = serialize(schema, state.rows.as_slice(), !state.settings.remove_headers)?;

    effects.push(Effect::WriteCsv { file_name, contents });
    Ok(())
}
