//! Handles all user-facing output for the CLI.
//!
//! Colour goes through `termcolor` so it is dropped automatically when stdout
//! is not a terminal. Errors are rendered as `miette` reports on stderr.

use difference::{Changeset, Difference};
use miette::Report;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::history::History;
use crate::integrity::{IntegrityReport, IntegrityStatus};
use crate::patch::PatchBatch;
use crate::UixError;

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

pub fn print_error(error: UixError) {
    let report = Report::new(error);
    eprintln!("{report:?}");
}

/// Prints the textual integrity report with the status line coloured.
pub fn print_report(report: &IntegrityReport) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let text = report.to_string();
    for line in text.lines() {
        if line.starts_with("Integrity Status:") {
            let color = match report.status {
                IntegrityStatus::Pass => Color::Green,
                IntegrityStatus::Warn => Color::Yellow,
            };
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
            println!("{}", line);
            let _ = stdout.reset();
        } else if line.starts_with("[CRITICAL]") || line.starts_with("[ERROR]") {
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
            println!("{}", line);
            let _ = stdout.reset();
        } else {
            println!("{}", line);
        }
    }
}

/// Lists applied batches oldest first, then undone batches in redo order.
pub fn print_history(history: &History) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if history.past().is_empty() && history.future().is_empty() {
        println!("(no batches)");
        return;
    }
    for (i, batch) in history.past().iter().enumerate() {
        println!("{:>3}  {}", i + 1, batch_line(batch));
    }
    for batch in history.future().iter() {
        let _ = stdout.set_color(ColorSpec::new().set_dimmed(true));
        println!("redo {}", batch_line(batch));
        let _ = stdout.reset();
    }
}

/// Prints a line diff between two projections.
pub fn print_projection_diff(before: &str, after: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let changeset = Changeset::new(before, after, "\n");
    print_diff(&mut stdout, &changeset.diffs);
    let _ = stdout.reset();
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn batch_line(batch: &PatchBatch) -> String {
    format!(
        "{} [{}] {} ({} ops)",
        batch.id,
        batch.author.as_str(),
        batch.description,
        batch.ops.len()
    )
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    println!(" {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    println!("+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    println!("-{}", line);
                }
            }
        }
    }
}
