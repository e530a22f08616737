//! Owner of the form state
//!
//! The controller feeds actions through the reducer one at a time and
//! carries out the effects each transition asks for.

use crate::config::persistence::KeyValueStore;
use crate::config::settings::{write_setting, Settings};
use crate::config::validator::RowValidator;
use crate::services::csv_export::{CsvExporter, ExportError, ExportedFile};
use crate::services::form_session::{reduce, Action, Effect, FormState, SessionError};
use crate::trace_performance;
use tracing::{debug, instrument, warn};

/// What a dispatched action produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// File written by an export, if any
    pub exported: Option<ExportedFile>,
    /// Why the reducer refused the action, if it did
    pub refused: Option<SessionError>,
}

impl DispatchOutcome {
    pub fn is_accepted(&self) -> bool {
        self.refused.is_none()
    }
}

pub struct FormController<S: KeyValueStore> {
    state: FormState,
    store: S,
    exporter: CsvExporter,
}

impl<S: KeyValueStore> FormController<S> {
    /// Build a controller whose settings are restored from `store`.
    pub fn new(store: S, exporter: CsvExporter, validator: RowValidator) -> Self {
        let settings = Settings::load(&store);
        debug!("Restored settings: {:?}", settings);

        let state = FormState::new(settings)
            .with_validator(validator)
            .with_file_name_prefix(exporter.file_name_prefix());

        Self {
            state,
            store,
            exporter,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply an action and perform its effects.
    ///
    /// Refusals from the reducer are reported in the outcome. Only a failed
    /// file write is returned as an error; settings that cannot be stored are
    /// logged and skipped.
    #[instrument(skip(self))]
    pub fn dispatch(&mut self, action: Action) -> Result<DispatchOutcome, ExportError> {
        let transition = reduce(std::mem::take(&mut self.state), action);
        self.state = transition.state;

        let mut outcome = DispatchOutcome {
            exported: None,
            refused: self.state.last_error().cloned(),
        };

        for effect in transition.effects {
            match effect {
                Effect::Persist { key, value } => {
                    if let Err(e) = write_setting(&mut self.store, key, &value) {
                        warn!("Failed to store setting {}: {}", key, e);
                    }
                }
                Effect::WriteCsv {
                    file_name,
                    contents,
                } => {
                    let exported = trace_performance!("export_csv", {
                        self.exporter.export_as_file(&contents, &file_name)
                    })?;
                    outcome.exported = Some(exported);
                }
            }
        }

        Ok(outcome)
    }
}
