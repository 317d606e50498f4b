use crate::error::ErrorCode;
use crate::feed::{DEFAULT_SAMPLE_CAP, DEFAULT_TARGET_COUNT, FeedOptions};
use crate::lock::DEFAULT_LOCK_TIMEOUT;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            sample_cap: default_sample_cap(),
        }
    }
}

impl FeedConfig {
    #[must_use]
    pub const fn options(&self) -> FeedOptions {
        FeedOptions {
            target_count: self.target_count,
            sample_cap: self.sample_cap,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CursorConfig {
    #[serde(default = "default_cursor_path")]
    pub path: PathBuf,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: default_cursor_path(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl CursorConfig {
    /// Cursor path, resolved against the project root when relative.
    #[must_use]
    pub fn resolve_path(&self, project_root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            project_root.join(&self.path)
        }
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

impl OutputFormat {
    /// Case-insensitive parse; unknown values yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub output: OutputFormat,
}

/// Read `.updraft/config.toml` under `project_root`, or defaults when absent.
///
/// # Errors
///
/// Fails when the file cannot be read, is not valid TOML (`E1001`), or sets
/// a zero count (`E1002`).
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".updraft/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content).with_context(|| {
        format!(
            "{}: Failed to parse {}",
            ErrorCode::ConfigParseError.code(),
            path.display()
        )
    })?;
    validate(&config).with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(config)
}

/// Read the per-user config, or defaults when there is none.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed (`E1001`).
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("updraft/config.toml"))
}

fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content).with_context(|| {
        format!(
            "{}: Failed to parse {}",
            ErrorCode::ConfigParseError.code(),
            path.display()
        )
    })
}

/// Load project and user config and settle the output format.
///
/// Output precedence: `--json`, then `FORMAT`, then the user config, then
/// pretty on a terminal and text otherwise.
///
/// # Errors
///
/// Fails when either config file exists but cannot be read, parsed or
/// validated.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let output = resolve_output(
        cli_json,
        user.output.as_deref(),
        env_format.as_deref(),
        std::io::stdout().is_terminal(),
    );
    tracing::debug!(?output, "resolved output format");

    Ok(EffectiveConfig {
        project,
        user,
        output,
    })
}

fn validate(config: &ProjectConfig) -> Result<()> {
    if config.feed.target_count == 0 {
        bail!(
            "{}: feed.target_count must be at least 1",
            ErrorCode::InvalidConfigValue.code()
        );
    }
    if config.feed.sample_cap == 0 {
        bail!(
            "{}: feed.sample_cap must be at least 1",
            ErrorCode::InvalidConfigValue.code()
        );
    }
    Ok(())
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
    is_tty: bool,
) -> OutputFormat {
    if cli_json {
        return OutputFormat::Json;
    }
    [env_format, user_output]
        .into_iter()
        .flatten()
        .find_map(OutputFormat::parse)
        .unwrap_or(if is_tty {
            OutputFormat::Pretty
        } else {
            OutputFormat::Text
        })
}

const fn default_target_count() -> usize {
    DEFAULT_TARGET_COUNT
}

const fn default_sample_cap() -> usize {
    DEFAULT_SAMPLE_CAP
}

fn default_cursor_path() -> PathBuf {
    PathBuf::from(".updraft/since.json")
}

#[allow(clippy::cast_possible_truncation)]
const fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_project_config(root: &Path, body: &str) {
        let dir = root.join(".updraft");
        std::fs::create_dir_all(&dir).expect("create .updraft");
        std::fs::write(dir.join("config.toml"), body).expect("write config");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.feed.target_count, 10);
        assert_eq!(cfg.feed.sample_cap, 3);
        assert_eq!(cfg.cursor.path, PathBuf::from(".updraft/since.json"));
        assert_eq!(cfg.cursor.lock_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_project_config_keeps_other_defaults() {
        let root = TempDir::new().expect("tempdir");
        write_project_config(root.path(), "[feed]\ntarget_count = 4\n");
        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.feed.target_count, 4);
        assert_eq!(cfg.feed.sample_cap, 3);
        assert_eq!(
            cfg.feed.options(),
            FeedOptions {
                target_count: 4,
                sample_cap: 3
            }
        );
    }

    #[test]
    fn zero_target_count_is_rejected() {
        let root = TempDir::new().expect("tempdir");
        write_project_config(root.path(), "[feed]\ntarget_count = 0\n");
        let err = load_project_config(root.path()).expect_err("invalid");
        assert!(format!("{err:#}").contains("E1002"));
    }

    #[test]
    fn malformed_project_config_reports_parse_code() {
        let root = TempDir::new().expect("tempdir");
        write_project_config(root.path(), "[feed\n");
        let err = load_project_config(root.path()).expect_err("malformed");
        assert!(format!("{err:#}").contains("E1001"));
    }

    #[test]
    fn relative_cursor_path_resolves_against_root() {
        let cfg = CursorConfig::default();
        assert_eq!(
            cfg.resolve_path(Path::new("/srv/app")),
            PathBuf::from("/srv/app/.updraft/since.json")
        );

        let absolute = CursorConfig {
            path: PathBuf::from("/var/lib/updraft/since.json"),
            lock_timeout_ms: 10,
        };
        assert_eq!(
            absolute.resolve_path(Path::new("/srv/app")),
            PathBuf::from("/var/lib/updraft/since.json")
        );
    }

    #[test]
    fn user_config_parses_output() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = \"json\"\n").expect("write");
        let cfg = load_user_config_from(&path).expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }

    #[test]
    fn missing_user_config_is_default() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = load_user_config_from(&dir.path().join("absent.toml")).expect("default");
        assert!(cfg.output.is_none());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty"), Some("text"), true);
        assert_eq!(output, OutputFormat::Json);
    }

    #[test]
    fn env_beats_user_config() {
        let output = resolve_output(false, Some("json"), Some(" Text "), true);
        assert_eq!(output, OutputFormat::Text);
    }

    #[test]
    fn invalid_values_fall_through() {
        assert_eq!(
            resolve_output(false, Some("json"), Some("yaml"), true),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_output(false, Some("xml"), None, true),
            OutputFormat::Pretty
        );
        assert_eq!(resolve_output(false, None, None, false), OutputFormat::Text);
    }
}
