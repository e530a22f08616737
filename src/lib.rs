//! config-to-csv - describe a data-entry form in a terse text syntax, fill
//! in rows and export them as CSV
//!
//! A configuration such as
//!
//! ```text
//! textbox*: Name
//! dropdown: Status | Active, Inactive
//! ```
//!
//! is parsed into a [`Schema`], rows entered against it are checked by the
//! [`RowValidator`](config::RowValidator) and accepted rows are written out
//! by the CSV exporter. The form session state machine in
//! [`services::form_session`] ties these together.

pub mod cli;
pub mod config;
pub mod logging;
pub mod models;
pub mod services;

pub use models::*;
pub use services::*;

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

/// Errors reported by the command-line front end
#[derive(thiserror::Error, Debug)]
pub enum ConfigToCsvError {
    #[error("Configuration has {error_count} errors")]
    InvalidConfiguration { error_count: usize },

    #[error("Row {row}: unknown column \"{column}\"")]
    UnknownColumn { row: usize, column: String },

    #[error("Row {row} rejected: {details}")]
    InvalidRow { row: usize, details: String },

    #[error("Rows file must hold a JSON array of objects: {0}")]
    InvalidRowsFile(String),

    #[error("Action refused: {0}")]
    Refused(#[from] services::SessionError),
}
