//! `updraft key`: print the identity key of every change in a stream.
//!
//! Handy when checking that an upstream mapper produces changes that merge
//! the way you expect.

use super::load_changes;
use crate::output::{OutputMode, render_mode};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use updraft_core::feed::ChangeKey;

#[derive(Args, Debug)]
pub struct KeyArgs {
    /// JSON-lines change stream; `-` or omitted reads stdin.
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct KeyedChange {
    pub line: usize,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub mergeable: bool,
}

/// Execute `updraft key`.
///
/// # Errors
///
/// Returns an error if the stream cannot be read or parsed.
pub fn run_key(args: &KeyArgs, output: OutputMode) -> anyhow::Result<()> {
    let changes = load_changes(args.input.as_deref(), output)?;
    let keyed: Vec<KeyedChange> = changes
        .iter()
        .enumerate()
        .map(|(idx, change)| KeyedChange {
            line: idx + 1,
            key: ChangeKey::of(change).to_string(),
            kind: change.type_tag().to_string(),
            mergeable: change.kind().is_some_and(|k| k.is_mergeable()),
        })
        .collect();

    render_mode(
        output,
        &keyed,
        |rows, w| {
            for row in rows {
                writeln!(w, "{}", row.key)?;
            }
            Ok(())
        },
        |rows, w| {
            for row in rows {
                let merge = if row.mergeable { "merges" } else { "once" };
                writeln!(w, "{:>4}  {:<48} {merge}", row.line, row.key)?;
            }
            Ok(())
        },
    )
}
