//! Form session, CSV export and the controller that connects them

pub mod controller;
pub mod csv_export;
pub mod form_session;

pub use controller::{DispatchOutcome, FormController};
pub use csv_export::{
    resolve_file_name, serialize, CsvExporter, ExportError, ExportedFile, CSV_MIME_TYPE,
};
pub use form_session::{
    reduce, Action, Confirmation, ConfirmationReason, Deferred, Effect, EntryMode, FormState,
    SessionError, Transition,
};
