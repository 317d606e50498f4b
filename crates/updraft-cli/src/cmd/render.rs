//! `updraft render`: replay a change stream and print the feed.

use super::{file_cursor, load_changes};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use chrono::{DateTime, Local};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use updraft_core::change::Change;
use updraft_core::config::ProjectConfig;
use updraft_core::cursor::{CursorStore, MemoryCursor};
use updraft_core::feed::{FeedOptions, TrackedChanges};
use updraft_core::profile::HexJsonProfileDecoder;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// JSON-lines change stream; `-` or omitted reads stdin.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Changes to show (overrides `feed.target_count`).
    #[arg(long)]
    pub target: Option<usize>,

    /// Contributors named per merged change (overrides `feed.sample_cap`).
    #[arg(long)]
    pub sample_cap: Option<usize>,

    /// Cursor file (overrides `cursor.path`).
    #[arg(long, conflicts_with = "no_cursor")]
    pub cursor: Option<PathBuf>,

    /// Do not read or persist the since cursor.
    #[arg(long)]
    pub no_cursor: bool,
}

/// One rendered feed row.
#[derive(Debug, Serialize)]
pub struct RenderedChange {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: i64,
    pub summary: String,
    pub change: Change,
}

#[derive(Debug, Serialize)]
pub struct FeedReport {
    pub changes: Vec<RenderedChange>,
    pub tracked: usize,
    pub truncated: bool,
    pub since: Option<i64>,
}

/// Execute `updraft render`.
///
/// # Errors
///
/// Returns an error if the stream cannot be read or parsed, or output fails.
/// A cursor that cannot be persisted is logged, not returned.
pub fn run_render(
    args: &RenderArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let changes = load_changes(args.input.as_deref(), output)?;
    let mut options = config.feed.options();
    if let Some(target) = args.target {
        options.target_count = target;
    }
    if let Some(cap) = args.sample_cap {
        options.sample_cap = cap;
    }

    let report = if args.no_cursor {
        replay(MemoryCursor::new(), options, changes)
    } else {
        let cursor = file_cursor(config, project_root, args.cursor.as_ref());
        replay(cursor, options, changes)
    };

    tracing::info!(
        shown = report.changes.len(),
        tracked = report.tracked,
        truncated = report.truncated,
        "feed rendered"
    );

    render_mode(output, &report, render_text, render_pretty)
}

fn replay<C: CursorStore>(cursor: C, options: FeedOptions, changes: Vec<Change>) -> FeedReport {
    let mut feed = TrackedChanges::with_options(cursor, HexJsonProfileDecoder, options);
    feed.extend(changes);

    let tracked = feed.len();
    let rendered = feed.keyed_changes_to_render();
    let truncated = rendered.len() < tracked;
    let since = feed.cursor().since().unwrap_or_else(|e| {
        tracing::warn!(code = %e.code(), "could not read back since cursor: {e}");
        None
    });

    let changes = rendered
        .into_iter()
        .map(|(key, change)| RenderedChange {
            key: key.to_string(),
            kind: change.type_tag().to_string(),
            time: change.time(),
            summary: change.summary(),
            change,
        })
        .collect();

    FeedReport {
        changes,
        tracked,
        truncated,
        since,
    }
}

fn local_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

fn render_text(report: &FeedReport, w: &mut dyn Write) -> std::io::Result<()> {
    for row in &report.changes {
        writeln!(w, "{}\t{}\t{}", row.time, row.kind, row.summary)?;
    }
    Ok(())
}

fn render_pretty(report: &FeedReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!("Feed ({} of {})", report.changes.len(), report.tracked),
    )?;
    if report.changes.is_empty() {
        writeln!(w, "Nothing new.")?;
    }
    for row in &report.changes {
        writeln!(w, "{}  {}", local_time(row.time), row.summary)?;
    }
    writeln!(w)?;
    pretty_kv(
        w,
        "since",
        report
            .since
            .map_or_else(|| "unset".to_string(), |s| s.to_string()),
    )
}
