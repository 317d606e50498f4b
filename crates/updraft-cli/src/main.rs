#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use updraft_core::config;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "updraft: tracked-changes feed for Updraft ideas and solutions",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides `--json`, `FORMAT` and the user config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Replay changes and render the feed",
        long_about = "Read JSON-lines changes, merge them by identity and print the newest \
                      entries. Advances the persisted since cursor when the feed overflows.",
        after_help = "EXAMPLES:\n    # Render a stream from a file\n    updraft render --input changes.jsonl\n\n    # Show only the newest 5 without touching the cursor\n    cat changes.jsonl | updraft render --target 5 --no-cursor\n\n    # Emit machine-readable output\n    updraft render --input changes.jsonl --json"
    )]
    Render(cmd::render::RenderArgs),

    #[command(
        about = "Show the stored since cursor",
        after_help = "EXAMPLES:\n    updraft since\n    updraft since --cursor /tmp/since.json --json"
    )]
    Since(cmd::since::SinceArgs),

    #[command(
        about = "Delete the stored since cursor",
        after_help = "EXAMPLES:\n    updraft reset"
    )]
    Reset(cmd::reset::ResetArgs),

    #[command(
        about = "Print the identity key of each change",
        after_help = "EXAMPLES:\n    updraft key --input changes.jsonl"
    )]
    Key(cmd::key::KeyArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("UPDRAFT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "updraft=debug,info"
        } else {
            "updraft=info,warn"
        })
    });

    let format = env::var("UPDRAFT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let effective = config::resolve_config(&project_root, cli.json)?;
    let output = output::resolve_output_mode(cli.format, effective.output);
    debug!(?output, root = %project_root.display(), "starting");

    match cli.command {
        Commands::Render(ref args) => {
            cmd::render::run_render(args, output, &project_root, &effective.project)
        }
        Commands::Since(ref args) => {
            cmd::since::run_since(args, output, &project_root, &effective.project)
        }
        Commands::Reset(ref args) => {
            cmd::reset::run_reset(args, output, &project_root, &effective.project)
        }
        Commands::Key(ref args) => cmd::key::run_key(args, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["updraft", "--json", "since"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Since(_)));
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["updraft", "render", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["updraft", "key", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn render_args_parse() {
        let cli = Cli::parse_from([
            "updraft",
            "render",
            "--input",
            "changes.jsonl",
            "--target",
            "5",
            "--sample-cap",
            "2",
            "--no-cursor",
        ]);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.target, Some(5));
        assert_eq!(args.sample_cap, Some(2));
        assert!(args.no_cursor);
        assert_eq!(
            args.input.as_deref(),
            Some(std::path::Path::new("changes.jsonl"))
        );
    }

    #[test]
    fn cursor_and_no_cursor_conflict() {
        let result = Cli::try_parse_from([
            "updraft",
            "render",
            "--cursor",
            "x.json",
            "--no-cursor",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn verbose_flag_parsed() {
        let cli = Cli::parse_from(["updraft", "-v", "reset"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Reset(_)));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["updraft"]).is_err());
    }
}
