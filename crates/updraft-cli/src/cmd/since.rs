//! `updraft since`: show the persisted since cursor.

use super::file_cursor;
use crate::output::{CliError, OutputMode, pretty_kv, render_error, render_mode};
use chrono::DateTime;
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};
use updraft_core::CursorStore;
use updraft_core::config::ProjectConfig;

#[derive(Args, Debug)]
pub struct SinceArgs {
    /// Cursor file (overrides `cursor.path`).
    #[arg(long)]
    pub cursor: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SinceReport {
    pub path: String,
    pub since: Option<i64>,
}

/// Execute `updraft since`.
///
/// # Errors
///
/// Returns an error if the cursor file is locked, unreadable or corrupt.
pub fn run_since(
    args: &SinceArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let cursor = file_cursor(config, project_root, args.cursor.as_ref());
    let since = match cursor.since() {
        Ok(since) => since,
        Err(e) => {
            render_error(output, &CliError::coded(e.code(), &e))?;
            return Err(e.into());
        }
    };

    let report = SinceReport {
        path: cursor.path().display().to_string(),
        since,
    };
    render_mode(
        output,
        &report,
        |r, w| match r.since {
            Some(secs) => writeln!(w, "{secs}"),
            None => writeln!(w, "unset"),
        },
        |r, w| {
            pretty_kv(w, "cursor", &r.path)?;
            let value = r.since.map_or_else(
                || "unset".to_string(),
                |secs| {
                    DateTime::from_timestamp(secs, 0)
                        .map_or_else(|| secs.to_string(), |ts| format!("{secs} ({})", ts.to_rfc3339()))
                },
            );
            pretty_kv(w, "since", value)
        },
    )
}
