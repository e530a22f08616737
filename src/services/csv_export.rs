//! CSV serialization and file export

use crate::config::app_config::DEFAULT_FILE_NAME_PREFIX;
use crate::config::validator::{validate_file_name, FileNameError};
use crate::models::{DataRow, Schema};
use chrono::{DateTime, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// MIME type of exported files
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";
const CSV_EXTENSION: &str = ".csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export")]
    NothingToExport,
    #[error("Invalid file name: {0}")]
    FileName(#[from] FileNameError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Serialize accepted rows as CSV text.
///
/// Columns follow schema order and values are quoted only when they hold a
/// comma, a double quote or a line break. Lines end with `\n` and the last
/// line has no terminator. A row made of one empty value is written as `""`
/// so it still reads back as a record.
pub fn serialize(
    schema: &Schema,
    rows: &[DataRow],
    include_headers: bool,
) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if include_headers {
        writer.write_record(schema.labels())?;
    }
    for row in rows {
        writer.write_record(row.ordered_values(schema))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }

    debug!(
        "Serialized {} rows x {} columns ({} bytes)",
        rows.len(),
        schema.len(),
        text.len()
    );
    Ok(text)
}

/// Turn the user's file name into the name of the exported file.
///
/// The name is validated first. A blank name becomes
/// `<prefix>_<unix millis>.csv`; a name without the `.csv` suffix gets it
/// appended.
pub fn resolve_file_name(
    raw: &str,
    prefix: &str,
    now: DateTime<Utc>,
) -> Result<String, FileNameError> {
    validate_file_name(raw)?;

    let name = raw.trim();
    if name.is_empty() {
        return Ok(format!("{}_{}{}", prefix, now.timestamp_millis(), CSV_EXTENSION));
    }

    if name.ends_with(CSV_EXTENSION) {
        Ok(name.to_string())
    } else {
        Ok(format!("{}{}", name, CSV_EXTENSION))
    }
}

/// Description of a file written by [`CsvExporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub bytes: usize,
    pub mime_type: &'static str,
}

/// Writes CSV text into an export directory.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    directory: PathBuf,
    file_name_prefix: String,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(".")
    }
}

impl CsvExporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_name_prefix: DEFAULT_FILE_NAME_PREFIX.to_string(),
        }
    }

    pub fn with_file_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_name_prefix = prefix.into();
        self
    }

    pub fn file_name_prefix(&self) -> &str {
        &self.file_name_prefix
    }

    /// Write `csv_text` to `<directory>/<file_name>`.
    ///
    /// `file_name` must already be resolved; it is validated again so the
    /// file never lands outside the export directory.
    pub fn export_as_file(&self, csv_text: &str, file_name: &str) -> Result<ExportedFile, ExportError> {
        validate_file_name(file_name)?;
        if file_name.trim().is_empty() {
            return Err(ExportError::FileName(FileNameError::Empty));
        }

        if !self.directory.exists() {
            fs::create_dir_all(&self.directory)?;
        }

        let path = self.directory.join(file_name);
        let temp_path = path.with_extension("csv.tmp");
        if let Err(error) = fs::write(&temp_path, csv_text).and_then(|()| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(error.into());
        }

        info!("Exported {} bytes to {}", csv_text.len(), path.display());
        Ok(ExportedFile {
            path,
            bytes: csv_text.len(),
            mime_type: CSV_MIME_TYPE,
        })
    }
}
