//! `updraft reset`: forget the persisted since cursor.

use super::file_cursor;
use crate::output::{CliError, OutputMode, render_error, render_mode};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use updraft_core::config::ProjectConfig;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Cursor file (overrides `cursor.path`).
    #[arg(long)]
    pub cursor: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ResetReport {
    pub path: String,
    pub removed: bool,
}

/// Execute `updraft reset`.
///
/// # Errors
///
/// Returns an error if the cursor lock cannot be taken or the file cannot
/// be removed.
pub fn run_reset(
    args: &ResetArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let cursor = file_cursor(config, project_root, args.cursor.as_ref());
    let removed = match cursor.reset() {
        Ok(removed) => removed,
        Err(e) => {
            render_error(output, &CliError::coded(e.code(), &e))?;
            return Err(e.into());
        }
    };

    let report = ResetReport {
        path: cursor.path().display().to_string(),
        removed,
    };
    render_mode(output, &report, render_human, render_human)
}

fn render_human(report: &ResetReport, w: &mut dyn Write) -> std::io::Result<()> {
    if report.removed {
        writeln!(w, "✓ cursor reset ({})", report.path)
    } else {
        writeln!(w, "no cursor stored at {}", report.path)
    }
}
