//! Interactive session: one command per line, driving an [`EditSession`].
//!
//! While an edit is in flight the loop keeps reading input; `reset` cancels
//! the request and empties the session, anything else is refused until the
//! result arrives.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::EditError;
use crate::output::{export, is_stdout};
use crate::ports::{ImageEditor, ImagePayload};
use crate::presets::Preset;
use crate::session::{EditSession, SessionState};

const HELP: &str = "\
Commands:
  upload <path>     load a product photo
  prompt <text>     set the edit instruction
  preset <name>     use a canned instruction (remove-background, clean-shadows, retro, vivid)
  submit            send the photo and instruction for editing (alias: enhance)
  save [path]       export the edited image ('-' prints a data URL)
  reset             clear the session (cancels an edit in progress)
  status            show the session state
  help              show this help
  quit              leave";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load an image from disk.
    Upload(PathBuf),
    /// Replace the instruction.
    Prompt(String),
    /// Replace the instruction with a preset.
    Preset(Preset),
    /// Dispatch the edit.
    Submit,
    /// Export the result, optionally to a specific path.
    Save(Option<PathBuf>),
    /// Clear the session.
    Reset,
    /// Print the session state.
    Status,
    /// Print the command list.
    Help,
    /// Exit the loop.
    Quit,
}

/// Parse a line. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns a message for unknown commands or missing arguments.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match word.to_ascii_lowercase().as_str() {
        "upload" if rest.is_empty() => return Err("usage: upload <path>".into()),
        "upload" => Command::Upload(PathBuf::from(rest)),
        "prompt" => Command::Prompt(rest.to_string()),
        "preset" => Command::Preset(Preset::parse(rest)?),
        "submit" | "enhance" => Command::Submit,
        "save" => Command::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "reset" => Command::Reset,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help' for commands.")),
    };
    Ok(Some(command))
}

/// Run the interactive loop until `quit` or end of input.
///
/// # Errors
///
/// Returns an error only when reading input or writing output fails;
/// everything else is reported inline and the loop continues.
pub async fn run<R, W>(
    session: &mut EditSession,
    editor: &dyn ImageEditor,
    default_output: &Path,
    input: R,
    mut out: W,
) -> Result<(), EditError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "snapedit interactive session. Type 'help' for commands.")?;

    loop {
        write!(out, "snapedit> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(out, "{message}")?;
                continue;
            }
        };

        match command {
            Command::Upload(path) => {
                match ImagePayload::from_path(&path)
                    .and_then(|image| session.upload(image).map_err(EditError::from))
                {
                    Ok(()) => writeln!(out, "Uploaded {}", path.display())?,
                    Err(e) => writeln!(out, "{e}")?,
                }
            }
            Command::Prompt(text) => set_instruction(session, text, &mut out)?,
            Command::Preset(preset) => set_instruction(session, preset.instruction(), &mut out)?,
            Command::Submit => submit(session, editor, &mut lines, &mut out).await?,
            Command::Save(path) => {
                let path = path.unwrap_or_else(|| default_output.to_path_buf());
                match session.retrieve_result().map_err(EditError::from) {
                    Ok(image) => match export(image, &path, &mut out) {
                        Ok(()) if is_stdout(&path) => {}
                        Ok(()) => writeln!(out, "Saved: {}", path.display())?,
                        Err(e) => writeln!(out, "{e}")?,
                    },
                    Err(e) => writeln!(out, "{e}")?,
                }
            }
            Command::Reset => {
                session.reset();
                writeln!(out, "Session cleared.")?;
            }
            Command::Status => write_status(session, &mut out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => break,
        }
    }
    Ok(())
}

fn set_instruction<W: Write>(
    session: &mut EditSession,
    text: impl Into<String>,
    out: &mut W,
) -> Result<(), EditError> {
    match session.set_instruction(text) {
        Ok(()) => writeln!(out, "Instruction: {}", session.instruction())?,
        Err(e) => writeln!(out, "{e}")?,
    }
    Ok(())
}

/// Dispatch the edit and wait for it, watching the input for `reset`.
async fn submit<R, W>(
    session: &mut EditSession,
    editor: &dyn ImageEditor,
    lines: &mut tokio::io::Lines<R>,
    out: &mut W,
) -> Result<(), EditError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let pending = match session.begin_submit() {
        Ok(pending) => pending,
        Err(e) => {
            writeln!(out, "{e}")?;
            return Ok(());
        }
    };
    writeln!(out, "Processing...")?;
    out.flush()?;

    let mut edit = editor.edit(&pending.request);
    let result = loop {
        tokio::select! {
            biased;
            result = &mut edit => break Some(result),
            line = lines.next_line() => match line? {
                None => break Some((&mut edit).await),
                Some(line) => match parse_command(&line) {
                    Ok(Some(Command::Reset)) => break None,
                    Ok(None) => {}
                    _ => writeln!(out, "Busy: an edit is in progress (type 'reset' to cancel)")?,
                },
            },
        }
    };
    drop(edit);

    let Some(result) = result else {
        session.reset();
        writeln!(out, "Edit cancelled. Session cleared.")?;
        return Ok(());
    };

    session.complete(pending.ticket, result);
    match session.state() {
        SessionState::Succeeded => writeln!(out, "Done. Type 'save' to export.")?,
        _ => {
            if let Some(failure) = session.error() {
                writeln!(out, "Edit failed: {failure}")?;
            }
        }
    }
    Ok(())
}

fn write_status<W: Write>(session: &EditSession, out: &mut W) -> Result<(), EditError> {
    writeln!(out, "State: {}", session.state())?;
    if let Some(image) = session.original() {
        writeln!(out, "Original: {} ({} bytes)", image.mime_type, image.data.len())?;
    }
    if !session.instruction().is_empty() {
        writeln!(out, "Instruction: {}", session.instruction())?;
    }
    if let Some(image) = session.edited() {
        writeln!(out, "Edited: {} ({} bytes)", image.mime_type, image.data.len())?;
    }
    if let Some(failure) = session.error() {
        writeln!(out, "Error: {failure}")?;
    }
    Ok(())
}
