//! Command-line arguments and subcommands for the uix CLI.
//!
//! Every command works on a session file in the persisted JSON layout.
//! Mutating commands write the next session back to the same file unless
//! `--output` names another one.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "uix",
    version,
    about = "Edit, version and inspect a UI component tree."
)]
pub struct UixArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Where a mutating command writes the resulting session.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Write the result here instead of overwriting the input session.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a fresh session holding only the initial tree.
    New {
        session: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the canonical XML projection of the current tree.
    Project {
        session: PathBuf,
        /// Print the SHA-256 of the projection instead.
        #[arg(long)]
        digest: bool,
    },
    /// Run the integrity checker.
    Check {
        session: PathBuf,
        /// Emit the structured report as JSON.
        #[arg(long)]
        json: bool,
        /// Exit with status 1 when the report is not PASS.
        #[arg(long)]
        strict: bool,
    },
    /// Apply a patch batch file (oracle JSON format).
    Apply {
        session: PathBuf,
        batch: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Undo the most recent batch.
    Undo {
        session: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Re-apply the most recently undone batch.
    Redo {
        session: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// List applied and undone batches.
    History { session: PathBuf },
    /// Show how the most recent batch changed the projection.
    Diff { session: PathBuf },
    /// Print the flattened node summary handed to the oracle.
    Summary { session: PathBuf },
    /// Toggle the collapsed flag of a node.
    Collapse {
        session: PathBuf,
        node: String,
        /// Force the node expanded instead of toggling.
        #[arg(long)]
        expand: bool,
        #[command(flatten)]
        out: OutputArgs,
    },
}
