//! The uix Command-Line Interface.
//!
//! Reads a session file, runs one core operation on it and, for mutating
//! commands, writes the next session back. Diagnostics go to stderr through
//! `tracing` (filter taken from `UIX_LOG`, default `warn`).

use std::path::Path;
use std::{fs, process};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, OutputArgs, UixArgs};
use crate::cli::output::{print_error, print_history, print_projection_diff, print_report};
use crate::integrity::{self, IntegrityStatus};
use crate::oracle::decode_batch;
use crate::projection::{digest, project};
use crate::{Session, UixError};

pub mod args;
pub mod output;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "UIX_LOG";

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = UixArgs::parse();
    match dispatch(args.command) {
        Ok(code) => process::exit(code),
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs one command, returning the process exit code.
pub fn dispatch(command: Command) -> Result<i32, UixError> {
    match command {
        Command::New { session, force } => {
            if session.exists() && !force {
                return Err(UixError::io(
                    &session,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "session exists (use --force to overwrite)",
                    ),
                ));
            }
            write_session(&session, &Session::default())?;
            println!("Created {}", session.display());
        }

        Command::Project { session, digest: as_digest } => {
            let session = read_session(&session)?;
            if as_digest {
                println!("{}", digest(session.tree()));
            } else {
                println!("{}", project(session.tree()));
            }
        }

        Command::Check {
            session,
            json,
            strict,
        } => {
            let report = integrity::check(&read_session(&session)?);
            if json {
                let text = serde_json::to_string_pretty(&report)
                    .map_err(|source| UixError::Encode { source })?;
                println!("{}", text);
            } else {
                print_report(&report);
            }
            if strict && report.status != IntegrityStatus::Pass {
                return Ok(1);
            }
        }

        Command::Apply {
            session: path,
            batch,
            out,
        } => {
            let session = read_session(&path)?;
            let raw = fs::read_to_string(&batch).map_err(|e| UixError::io(&batch, e))?;
            let batch = decode_batch(&raw)?;
            let id = batch.id.clone();
            let next = session.apply_batch(batch);
            write_output(&path, &out, &next)?;
            println!("Applied {}", id);
        }

        Command::Undo { session: path, out } => {
            let session = read_session(&path)?;
            if !session.history().can_undo() {
                println!("Nothing to undo");
                return Ok(0);
            }
            write_output(&path, &out, &session.undo())?;
            println!("Undone {}", last_id(&session));
        }

        Command::Redo { session: path, out } => {
            let session = read_session(&path)?;
            let Some(next_id) = session.history().future().front().map(|b| b.id.clone()) else {
                println!("Nothing to redo");
                return Ok(0);
            };
            write_output(&path, &out, &session.redo())?;
            println!("Redone {}", next_id);
        }

        Command::History { session } => {
            print_history(read_session(&session)?.history());
        }

        Command::Diff { session } => {
            let session = read_session(&session)?;
            let history = session.history();
            if !history.can_undo() {
                println!("(no batches)");
                return Ok(0);
            }
            print_projection_diff(&project(&history.before_last()), &project(history.current()));
        }

        Command::Summary { session } => {
            let session = read_session(&session)?;
            let text = serde_json::to_string_pretty(&session.tree().summary())
                .map_err(|source| UixError::Encode { source })?;
            println!("{}", text);
        }

        Command::Collapse {
            session: path,
            node,
            expand,
            out,
        } => {
            let session = read_session(&path)?;
            let forced = if expand { Some(false) } else { None };
            let Some(batch) = session.collapse_batch(&node, forced) else {
                eprintln!("No node with id {}", node);
                return Ok(1);
            };
            write_output(&path, &out, &session.apply_batch(batch))?;
        }
    }
    Ok(0)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn read_session(path: &Path) -> Result<Session, UixError> {
    let raw = fs::read_to_string(path).map_err(|e| UixError::io(path, e))?;
    Session::from_json(&raw)
}

fn write_session(path: &Path, session: &Session) -> Result<(), UixError> {
    let text = session.to_json()?;
    fs::write(path, text).map_err(|e| UixError::io(path, e))
}

fn write_output(input: &Path, out: &OutputArgs, session: &Session) -> Result<(), UixError> {
    write_session(out.output.as_deref().unwrap_or(input), session)
}

fn last_id(session: &Session) -> String {
    session
        .history()
        .past()
        .back()
        .map(|b| b.id.clone())
        .unwrap_or_default()
}
