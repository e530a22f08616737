//! Command-line interface
//!
//! Provides one-shot commands for checking configurations, exporting rows
//! and managing stored settings, plus an interactive entry session.

pub mod session;

use crate::config::{
    validate_file_name, AppConfig, ConfigParser, KeyValueStore, MemoryStore, RowValidator,
    SettingKey, Settings,
};
use crate::config::settings::write_setting;
use crate::models::FieldId;
use crate::services::{Action, CsvExporter, DispatchOutcome, FormController, FormState, SessionError};
use crate::{ConfigToCsvError, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const STDIN_PATH: &str = "-";

/// config-to-csv command-line interface
#[derive(Parser)]
#[command(name = "config-to-csv")]
#[command(about = "Describe a data-entry form, fill in rows and export them as CSV")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct ConfigToCsvCli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Application configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable JSON output for machine-readable results
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a form configuration and print its fields or errors
    Check {
        /// Configuration file, or "-" for stdin
        file: String,
    },

    /// Validate rows against a form configuration and export them as CSV
    Export(ExportArgs),

    /// Enter rows interactively
    Session,

    /// Stored settings commands
    Settings(SettingsCommands),

    /// Print the configuration syntax
    Syntax,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Form configuration file, or "-" for stdin
    #[arg(short, long)]
    pub form: String,

    /// JSON file holding an array of {"<label>": "<value>"} objects
    #[arg(short, long)]
    pub rows: PathBuf,

    /// Export file name; defaults to the stored setting
    #[arg(long)]
    pub file_name: Option<String>,

    /// Omit the header line
    #[arg(long)]
    pub no_headers: bool,

    /// Directory to write into; defaults to the configured export directory
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub action: SettingsActions,
}

#[derive(Subcommand)]
pub enum SettingsActions {
    /// Show stored settings
    Show,

    /// Store the export file name (empty for a generated name)
    SetFileName {
        name: String,
    },

    /// Store whether exports omit the header line
    SetRemoveHeaders {
        #[arg(action = ArgAction::Set)]
        value: bool,
    },

    /// Remove all stored settings
    Reset,
}

/// CLI command executor
pub struct CliExecutor<S: KeyValueStore> {
    app_config: AppConfig,
    store: S,
    json_output: bool,
}

impl<S: KeyValueStore> CliExecutor<S> {
    pub fn new(app_config: AppConfig, store: S, json_output: bool) -> Self {
        Self {
            app_config,
            store,
            json_output,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Execute a CLI command, writing results to `out`
    pub fn execute(&mut self, command: Commands, out: &mut dyn Write) -> Result<()> {
        match command {
            Commands::Check { file } => self.execute_check(&file, out),
            Commands::Export(args) => self.execute_export(args, out),
            Commands::Session => {
                let stdin = io::stdin();
                self.execute_session(stdin.lock(), out)
            }
            Commands::Settings(cmd) => self.execute_settings_command(cmd, out),
            Commands::Syntax => {
                writeln!(out, "{}", ConfigParser::syntax_help())?;
                Ok(())
            }
        }
    }

    fn validator(&self) -> RowValidator {
        RowValidator::with_max_text_length(self.app_config.validation.max_text_length)
    }

    fn exporter(&self, directory: Option<PathBuf>) -> CsvExporter {
        let directory = directory.unwrap_or_else(|| self.app_config.export.directory.clone());
        CsvExporter::new(directory).with_file_name_prefix(&self.app_config.export.file_name_prefix)
    }

    fn execute_check(&self, file: &str, out: &mut dyn Write) -> Result<()> {
        let text = read_input(file)?;
        info!("Checking configuration from {}", file);

        match ConfigParser::new().parse(&text) {
            Ok(schema) => {
                if self.json_output {
                    let report = json!({ "valid": true, "fields": schema });
                    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
                } else {
                    writeln!(out, "Configuration is valid ({} fields):", schema.len())?;
                    for field in &schema {
                        let required = if field.required { "required" } else { "optional" };
                        write!(
                            out,
                            "  {:<12} {:<9} {:<9} {}",
                            field.id.as_str(),
                            field.kind.keyword(),
                            required,
                            field.label
                        )?;
                        match field.options() {
                            Some(options) => writeln!(out, " [{}]", options.join(", "))?,
                            None => writeln!(out)?,
                        }
                    }
                }
                Ok(())
            }
            Err(errors) => {
                if self.json_output {
                    let errors: Vec<Value> = errors
                        .iter()
                        .map(|e| json!({ "line": e.line(), "message": e.to_string() }))
                        .collect();
                    let report = json!({ "valid": false, "errors": errors });
                    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
                } else {
                    for e in &errors {
                        writeln!(out, "{}", e)?;
                    }
                }
                Err(ConfigToCsvError::InvalidConfiguration {
                    error_count: errors.len(),
                }
                .into())
            }
        }
    }

    fn execute_export(&self, args: ExportArgs, out: &mut dyn Write) -> Result<()> {
        let config_text = read_input(&args.form)?;
        let rows = read_rows(&args.rows)?;
        let stored = Settings::load(&self.store);

        // One-shot exports leave the stored settings alone
        let mut controller =
            FormController::new(MemoryStore::new(), self.exporter(args.out_dir), self.validator());

        controller.dispatch(Action::EditConfig(config_text))?;
        let outcome = controller.dispatch(Action::Generate)?;
        if let Some(SessionError::InvalidConfiguration { error_count }) = &outcome.refused {
            for e in controller.state().config_errors() {
                error!("{}", e);
            }
            return Err(ConfigToCsvError::InvalidConfiguration {
                error_count: *error_count,
            }
            .into());
        }
        accepted(outcome)?;

        for (index, values) in rows.into_iter().enumerate() {
            let row = index + 1;
            for (column, value) in values {
                let field_id = field_for_column(controller.state(), &column)
                    .ok_or_else(|| ConfigToCsvError::UnknownColumn { row, column })?;
                accepted(controller.dispatch(Action::SetField {
                    field_id,
                    value: cell_text(value),
                })?)?;
            }

            let outcome = controller.dispatch(Action::SubmitRow)?;
            if outcome.refused.is_some() {
                let details = controller
                    .state()
                    .draft_errors()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(ConfigToCsvError::InvalidRow { row, details }.into());
            }
        }
        debug!("Accepted {} rows", controller.state().rows().len());

        let file_name = args.file_name.unwrap_or(stored.file_name);
        accepted(controller.dispatch(Action::SetFileName(file_name))?)?;
        accepted(controller.dispatch(Action::SetRemoveHeaders(
            args.no_headers || stored.remove_headers,
        ))?)?;

        let outcome = controller.dispatch(Action::Export { at: Utc::now() })?;
        let row_count = controller.state().rows().len();
        let exported = match accepted(outcome)?.exported {
            Some(exported) => exported,
            None => return Err(ConfigToCsvError::Refused(SessionError::NothingToExport).into()),
        };

        if self.json_output {
            let report = json!({ "rows": row_count, "file": exported });
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            writeln!(
                out,
                "Exported {} rows ({} bytes) to {}",
                row_count,
                exported.bytes,
                exported.path.display()
            )?;
        }
        Ok(())
    }

    fn execute_session<R: BufRead>(&mut self, input: R, out: &mut dyn Write) -> Result<()> {
        let exporter = self.exporter(None);
        let validator = self.validator();
        let mut controller = FormController::new(&mut self.store, exporter, validator);
        session::run_session(&mut controller, input, out)
    }

    fn execute_settings_command(&mut self, cmd: SettingsCommands, out: &mut dyn Write) -> Result<()> {
        match cmd.action {
            SettingsActions::Show => {
                let settings = Settings::load(&self.store);
                if self.json_output {
                    writeln!(out, "{}", serde_json::to_string_pretty(&settings)?)?;
                } else {
                    let file_name = if settings.file_name.is_empty() {
                        "(generated)"
                    } else {
                        settings.file_name.as_str()
                    };
                    writeln!(out, "File name:      {}", file_name)?;
                    writeln!(out, "Remove headers: {}", settings.remove_headers)?;
                    writeln!(out, "Configuration:  {} lines", settings.config_text.lines().count())?;
                }
            }
            SettingsActions::SetFileName { name } => {
                validate_file_name(&name)?;
                write_setting(&mut self.store, SettingKey::FileName, &Value::String(name.clone()))?;
                info!("Stored file name \"{}\"", name);
                writeln!(out, "File name set to \"{}\"", name)?;
            }
            SettingsActions::SetRemoveHeaders { value } => {
                write_setting(&mut self.store, SettingKey::RemoveHeaders, &Value::Bool(value))?;
                writeln!(out, "Remove headers set to {}", value)?;
            }
            SettingsActions::Reset => {
                Settings::clear(&mut self.store)?;
                info!("Stored settings cleared");
                writeln!(out, "Settings reset")?;
            }
        }
        Ok(())
    }
}

fn accepted(outcome: DispatchOutcome) -> Result<DispatchOutcome> {
    match outcome.refused {
        Some(error) => Err(ConfigToCsvError::Refused(error).into()),
        None => Ok(outcome),
    }
}

/// Column names match field ids first, then labels
fn field_for_column(state: &FormState, column: &str) -> Option<FieldId> {
    let schema = state.schema()?;
    schema
        .get(&FieldId::new(column))
        .or_else(|| schema.find_by_label(column))
        .map(|field| field.id.clone())
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn read_input(source: &str) -> Result<String> {
    if source == STDIN_PATH {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        Ok(fs::read_to_string(source)?)
    }
}

fn read_rows(path: &Path) -> Result<Vec<Map<String, Value>>> {
    let content = fs::read_to_string(path)?;
    let Value::Array(items) = serde_json::from_str::<Value>(&content)? else {
        return Err(ConfigToCsvError::InvalidRowsFile("top level is not an array".to_string()).into());
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => rows.push(map),
            _ => {
                let message = format!("item {} is not an object", index + 1);
                return Err(ConfigToCsvError::InvalidRowsFile(message).into());
            }
        }
    }
    Ok(rows)
}

/// Run a parsed command, reporting failures on stdout (JSON) or the log
pub fn run_cli<S: KeyValueStore>(cli: ConfigToCsvCli, app_config: AppConfig, store: S) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut executor = CliExecutor::new(app_config, store, cli.json);

    if let Err(e) = executor.execute(cli.command, &mut out) {
        if cli.json {
            let error_json = json!({
                "error": true,
                "message": e.to_string()
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&error_json)?)?;
        } else {
            error!("Command failed: {:#}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}
