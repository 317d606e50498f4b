pub mod key;
pub mod render;
pub mod reset;
pub mod since;

use crate::output::{CliError, OutputMode, render_error};
use anyhow::Context;
use std::io;
use std::path::{Path, PathBuf};
use updraft_core::FileCursor;
use updraft_core::change::{Change, parse_changes};
use updraft_core::config::ProjectConfig;

/// Read a change stream from `path`, or stdin when absent or `-`.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read change stream {}", p.display())),
        _ => io::read_to_string(io::stdin()).context("Failed to read change stream from stdin"),
    }
}

/// Parse a JSON-lines stream, reporting the first bad line in `output` mode.
pub fn load_changes(path: Option<&Path>, output: OutputMode) -> anyhow::Result<Vec<Change>> {
    let input = read_input(path)?;
    match parse_changes(&input) {
        Ok(changes) => Ok(changes),
        Err(e) => {
            render_error(output, &CliError::coded(e.code(), &e))?;
            Err(e.into())
        }
    }
}

/// The persisted cursor for this project, honoring a `--cursor` override.
pub fn file_cursor(
    config: &ProjectConfig,
    project_root: &Path,
    cursor_override: Option<&PathBuf>,
) -> FileCursor {
    let path = cursor_override.map_or_else(
        || config.cursor.resolve_path(project_root),
        |p| project_root.join(p),
    );
    FileCursor::new(path).with_lock_timeout(config.cursor.lock_timeout())
}
