//! floodgate.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FloodgateError, FloodgateResult};

const DEFAULT_WINDOW: &str = "1h";
const DEFAULT_LOG_PATH: &str = "/var/tmp/floodgate.dat";
const DEFAULT_TIMEOUT: &str = "30s";
const DEFAULT_PROGRAM: &str = "/usr/local/bin/docker-compose run --rm web rails";
const DEFAULT_OPEN_ARG: &str = "mastodon:settings:open_registrations";
const DEFAULT_CLOSE_ARG: &str = "mastodon:settings:close_registrations";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodgateConfig {
    /// Base URL of the monitored instance, e.g. `https://vulpine.club`.
    pub base_url: String,
    /// Maximum accounts allowed to appear within one window.
    #[serde(default = "default_max_per_hour")]
    pub max_per_hour: u64,
    /// Age of the baseline sample ("1h", "90m", "3600").
    #[serde(default = "default_window")]
    pub window: String,
    /// What to do when the history holds no sample at all.
    #[serde(default)]
    pub on_missing_baseline: MissingBaseline,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub command: CommandConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingBaseline {
    #[default]
    Close,
    Open,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_log_path")]
    pub path: PathBuf,
    /// Samples older than this may be compacted away. Absent keeps everything.
    pub retention: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout")]
    pub timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Program and leading arguments, whitespace separated.
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_open_arg")]
    pub open_arg: String,
    #[serde(default = "default_close_arg")]
    pub close_arg: String,
}

fn default_max_per_hour() -> u64 {
    3
}

fn default_window() -> String {
    DEFAULT_WINDOW.to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_timeout() -> String {
    DEFAULT_TIMEOUT.to_string()
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

fn default_open_arg() -> String {
    DEFAULT_OPEN_ARG.to_string()
}

fn default_close_arg() -> String {
    DEFAULT_CLOSE_ARG.to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
            retention: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            open_arg: default_open_arg(),
            close_arg: default_close_arg(),
        }
    }
}

impl FloodgateConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> FloodgateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FloodgateError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> FloodgateResult<Self> {
        let config: FloodgateConfig =
            toml::from_str(content).map_err(|e| FloodgateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> FloodgateResult<String> {
        toml::to_string_pretty(self).map_err(|e| FloodgateError::Config(e.to_string()))
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> FloodgateResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(FloodgateError::Config("base_url must not be empty".into()));
        }
        if self.command.program.split_whitespace().next().is_none() {
            return Err(FloodgateError::Config(
                "command.program must name a program".into(),
            ));
        }
        let window = self.window()?;
        if window.is_zero() {
            return Err(FloodgateError::Config("window must be non-zero".into()));
        }
        if let Some(retention) = self.retention()?
            && retention <= window
        {
            return Err(FloodgateError::Config(format!(
                "history.retention ({}s) must be longer than window ({}s)",
                retention.as_secs(),
                window.as_secs()
            )));
        }
        self.timeout()?;
        Ok(())
    }

    pub fn window(&self) -> FloodgateResult<Duration> {
        parse_duration(&self.window)
    }

    pub fn retention(&self) -> FloodgateResult<Option<Duration>> {
        self.history
            .retention
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn timeout(&self) -> FloodgateResult<Duration> {
        parse_duration(&self.http.timeout)
    }

    /// Scaffold a config for the given instance with every default spelled out.
    pub fn scaffold(base_url: &str) -> Self {
        FloodgateConfig {
            base_url: base_url.to_string(),
            max_per_hour: default_max_per_hour(),
            window: default_window(),
            on_missing_baseline: MissingBaseline::Close,
            history: HistoryConfig {
                path: default_log_path(),
                retention: Some("1d".to_string()),
            },
            http: HttpConfig::default(),
            command: CommandConfig::default(),
        }
    }
}

/// Parse a duration string like "30s", "5m", "1h", "2d" or bare seconds.
pub fn parse_duration(s: &str) -> FloodgateResult<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&s[..idx], c),
        _ => (s, 's'),
    };
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => {
            return Err(FloodgateError::Config(format!(
                "unknown duration unit in {s:?}"
            )));
        }
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| FloodgateError::Config(format!("invalid duration {s:?}")))?;
    Ok(Duration::from_secs(value.saturating_mul(multiplier)))
}
