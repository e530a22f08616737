//! Line-oriented interactive session
//!
//! Each input line is one command. Commands map onto reducer actions and
//! the resulting state is echoed back after every step.

use crate::config::parser::ConfigParser;
use crate::config::persistence::KeyValueStore;
use crate::models::FieldId;
use crate::services::controller::{DispatchOutcome, FormController};
use crate::services::form_session::{
    Action, Confirmation, ConfirmationReason, EntryMode, FormState, SessionError,
};
use crate::Result;
use chrono::Utc;
use std::fs;
use std::io::{BufRead, Write};
use tracing::debug;

const PROMPT: &str = "> ";
const CONFIG_TERMINATOR: &str = ".";

const HELP: &str = "\
Commands:
  config                 enter configuration text, end with a line containing only '.'
  load <path>            read configuration text from a file
  show                   print the configuration text
  generate               build the form from the configuration
  yes | no               answer a pending confirmation
  form                   print the form and the row being edited
  set <field> = <value>  set a field by label or id
  submit                 validate the current row and store it
  edit <n>               load stored row n for editing
  cancel                 discard the current row
  delete <n>             delete stored row n
  rows                   list stored rows
  name [file name]       set the export file name (blank for a generated one)
  headers on|off         include or omit the header line
  export                 write stored rows to a CSV file
  syntax                 print the configuration syntax
  help                   print this help
  quit                   leave the session";

/// One parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Config,
    Load(String),
    Show,
    Generate,
    Yes,
    No,
    Form,
    Set { field: String, value: String },
    Submit,
    Edit(usize),
    Cancel,
    Delete(usize),
    Rows,
    Name(String),
    Headers(bool),
    Export,
    Syntax,
    Help,
    Quit,
}

impl SessionCommand {
    /// Parse one input line. Row numbers are 1-based.
    pub fn parse(line: &str) -> std::result::Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "config" => SessionCommand::Config,
            "load" if !rest.is_empty() => SessionCommand::Load(rest.to_string()),
            "load" => return Err("Usage: load <path>".to_string()),
            "show" => SessionCommand::Show,
            "generate" => SessionCommand::Generate,
            "yes" | "y" => SessionCommand::Yes,
            "no" | "n" => SessionCommand::No,
            "form" => SessionCommand::Form,
            "set" => {
                let (field, value) = rest
                    .split_once('=')
                    .ok_or_else(|| "Usage: set <field> = <value>".to_string())?;
                SessionCommand::Set {
                    field: field.trim().to_string(),
                    value: value.trim().to_string(),
                }
            }
            "submit" => SessionCommand::Submit,
            "edit" => SessionCommand::Edit(parse_row_number(rest)?),
            "cancel" => SessionCommand::Cancel,
            "delete" => SessionCommand::Delete(parse_row_number(rest)?),
            "rows" => SessionCommand::Rows,
            "name" => SessionCommand::Name(rest.to_string()),
            "headers" => match rest.to_ascii_lowercase().as_str() {
                "on" => SessionCommand::Headers(true),
                "off" => SessionCommand::Headers(false),
                _ => return Err("Usage: headers on|off".to_string()),
            },
            "export" => SessionCommand::Export,
            "syntax" => SessionCommand::Syntax,
            "help" | "?" => SessionCommand::Help,
            "quit" | "exit" => SessionCommand::Quit,
            other => return Err(format!("Unknown command \"{}\", type 'help'", other)),
        };
        Ok(command)
    }
}

fn parse_row_number(text: &str) -> std::result::Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Expected a row number starting at 1, got \"{}\"", text)),
    }
}

/// Run the session until `quit` or end of input.
pub fn run_session<S, R, W>(controller: &mut FormController<S>, input: R, out: &mut W) -> Result<()>
where
    S: KeyValueStore,
    R: BufRead,
    W: Write + ?Sized,
{
    writeln!(out, "config-to-csv session, type 'help' for commands")?;
    if !controller.state().config_text().is_empty() {
        writeln!(out, "Restored configuration, type 'generate' to build the form")?;
    }

    let mut config_lines: Option<Vec<String>> = None;
    write!(out, "{}", PROMPT)?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;

        if let Some(lines) = config_lines.as_mut() {
            if line.trim() == CONFIG_TERMINATOR {
                let text = lines.join("\n");
                config_lines = None;
                dispatch(controller, Action::EditConfig(text), out)?;
                writeln!(out, "Configuration updated")?;
            } else {
                lines.push(line);
                out.flush()?;
                continue;
            }
        } else if !line.trim().is_empty() {
            match SessionCommand::parse(&line) {
                Ok(SessionCommand::Quit) => break,
                Ok(SessionCommand::Config) => {
                    writeln!(out, "Enter configuration, end with '{}':", CONFIG_TERMINATOR)?;
                    config_lines = Some(Vec::new());
                    out.flush()?;
                    continue;
                }
                Ok(command) => execute(controller, command, out)?,
                Err(message) => writeln!(out, "{}", message)?,
            }
        }

        write!(out, "{}", PROMPT)?;
        out.flush()?;
    }

    writeln!(out)?;
    Ok(())
}

fn execute<S: KeyValueStore, W: Write + ?Sized>(
    controller: &mut FormController<S>,
    command: SessionCommand,
    out: &mut W,
) -> Result<()> {
    debug!("Session command: {:?}", command);

    match command {
        SessionCommand::Load(path) => match fs::read_to_string(&path) {
            Ok(text) => {
                dispatch(controller, Action::EditConfig(text), out)?;
                writeln!(out, "Configuration loaded from {}", path)?;
            }
            Err(e) => writeln!(out, "Cannot read {}: {}", path, e)?,
        },
        SessionCommand::Show => {
            let text = controller.state().config_text();
            if text.is_empty() {
                writeln!(out, "(no configuration)")?;
            } else {
                writeln!(out, "{}", text)?;
            }
        }
        SessionCommand::Generate => {
            if dispatch(controller, Action::Generate, out)?.is_accepted()
                && !controller.state().confirmation().is_pending()
            {
                print_form(controller.state(), out)?;
            }
        }
        SessionCommand::Yes => {
            if dispatch(controller, Action::Confirm, out)?.is_accepted() {
                print_form(controller.state(), out)?;
            }
        }
        SessionCommand::No => {
            if dispatch(controller, Action::Reject, out)?.is_accepted() {
                writeln!(out, "Kept the current form")?;
            }
        }
        SessionCommand::Form => print_form(controller.state(), out)?,
        SessionCommand::Set { field, value } => {
            let field_id = resolve_field(controller.state(), &field);
            dispatch(controller, Action::SetField { field_id, value }, out)?;
            print_draft_errors(controller.state(), out)?;
        }
        SessionCommand::Submit => {
            let adding = controller.state().mode() == EntryMode::Adding;
            if dispatch(controller, Action::SubmitRow, out)?.is_accepted() {
                let verb = if adding { "Added" } else { "Updated" };
                writeln!(out, "{} row, {} stored", verb, controller.state().rows().len())?;
            }
        }
        SessionCommand::Edit(index) => {
            if dispatch(controller, Action::StartEdit(index), out)?.is_accepted() {
                print_form(controller.state(), out)?;
            }
        }
        SessionCommand::Cancel => {
            let had_input = !controller.state().draft().is_blank();
            if dispatch(controller, Action::CancelEdit, out)?.is_accepted() && had_input {
                writeln!(out, "Discarded the current row")?;
            }
        }
        SessionCommand::Delete(index) => {
            if dispatch(controller, Action::DeleteRow(index), out)?.is_accepted() {
                writeln!(out, "Deleted row {}", index + 1)?;
            }
        }
        SessionCommand::Rows => print_rows(controller.state(), out)?,
        SessionCommand::Name(name) => {
            dispatch(controller, Action::SetFileName(name), out)?;
        }
        SessionCommand::Headers(include) => {
            dispatch(controller, Action::SetRemoveHeaders(!include), out)?;
        }
        SessionCommand::Export => match controller.dispatch(Action::Export { at: Utc::now() }) {
            Ok(outcome) => report(controller.state(), &outcome, out)?,
            Err(e) => writeln!(out, "Export failed: {}", e)?,
        },
        SessionCommand::Syntax => writeln!(out, "{}", ConfigParser::syntax_help())?,
        SessionCommand::Help => writeln!(out, "{}", HELP)?,
        SessionCommand::Config | SessionCommand::Quit => {}
    }

    Ok(())
}

/// Dispatch a non-export action and report refusals.
fn dispatch<S: KeyValueStore, W: Write + ?Sized>(
    controller: &mut FormController<S>,
    action: Action,
    out: &mut W,
) -> Result<DispatchOutcome> {
    let outcome = controller.dispatch(action)?;
    report(controller.state(), &outcome, out)?;
    Ok(outcome)
}

fn report<W: Write + ?Sized>(state: &FormState, outcome: &DispatchOutcome, out: &mut W) -> Result<()> {
    if let Some(file) = &outcome.exported {
        writeln!(out, "Exported {} bytes to {}", file.bytes, file.path.display())?;
    }

    if let Some(error) = &outcome.refused {
        writeln!(out, "Error: {}", error)?;
        match error {
            SessionError::InvalidConfiguration { .. } => {
                for e in state.config_errors() {
                    writeln!(out, "  {}", e)?;
                }
            }
            SessionError::InvalidRow { .. } => print_draft_errors(state, out)?,
            SessionError::AwaitingConfirmation => print_confirmation(state, out)?,
            _ => {}
        }
    } else {
        print_confirmation(state, out)?;
    }
    Ok(())
}

fn print_confirmation<W: Write + ?Sized>(state: &FormState, out: &mut W) -> Result<()> {
    if let Confirmation::AwaitingConfirmation { reason, .. } = state.confirmation() {
        match reason {
            ConfirmationReason::DiscardRows { row_count } => writeln!(
                out,
                "Generating a new form discards {} stored row(s). Continue? (yes/no)",
                row_count
            )?,
        }
    }
    Ok(())
}

fn print_draft_errors<W: Write + ?Sized>(state: &FormState, out: &mut W) -> Result<()> {
    for error in state.draft_errors() {
        writeln!(out, "  {}", error)?;
    }
    Ok(())
}

fn print_form<W: Write + ?Sized>(state: &FormState, out: &mut W) -> Result<()> {
    let Some(schema) = state.schema() else {
        writeln!(out, "No form yet, type 'generate'")?;
        return Ok(());
    };

    match state.mode() {
        EntryMode::Adding => writeln!(out, "New row:")?,
        EntryMode::Editing { index } => writeln!(out, "Editing row {}:", index + 1)?,
    }
    for field in schema {
        let marker = if field.required { "*" } else { "" };
        write!(
            out,
            "  [{}] {}{}: {}",
            field.id,
            field.label,
            marker,
            state.draft().value(&field.id)
        )?;
        match field.options() {
            Some(options) => writeln!(out, "  ({})", options.join(" / "))?,
            None => writeln!(out)?,
        }
    }
    Ok(())
}

fn print_rows<W: Write + ?Sized>(state: &FormState, out: &mut W) -> Result<()> {
    let (Some(schema), false) = (state.schema(), state.rows().is_empty()) else {
        writeln!(out, "No rows stored")?;
        return Ok(());
    };

    writeln!(out, "    {}", schema.labels().collect::<Vec<_>>().join(" | "))?;
    for (n, row) in state.rows().iter().enumerate() {
        let values: Vec<&str> = row.ordered_values(schema).collect();
        writeln!(out, "{:>3} {}", n + 1, values.join(" | "))?;
    }
    Ok(())
}

/// Field ids take precedence over labels.
fn resolve_field(state: &FormState, name: &str) -> FieldId {
    let id = FieldId::new(name);
    match state.schema() {
        Some(schema) if !schema.contains(&id) => schema
            .find_by_label(name)
            .map(|field| field.id.clone())
            .unwrap_or(id),
        _ => id,
    }
}
