//! Installing a `tracing` subscriber for emitter diagnostics.
//!
//! The emitter logs registrations and removals at `debug` and every
//! delivery at `trace` under the `tidings_events` target. [`LogConfig`]
//! decides which of those records are kept and where they are written.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, fmt::MakeWriter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter used by [`setup_test_logging`] when the config's filter is invalid.
const TEST_FALLBACK_FILTER: &str = "warn";

/// How often a log file is rolled over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRotation {
    /// One file per day.
    #[default]
    Daily,
    /// One file per hour.
    Hourly,
    /// One file per minute.
    Minutely,
    /// A single file.
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(rotation: FileRotation) -> Self {
        match rotation {
            FileRotation::Daily => Self::DAILY,
            FileRotation::Hourly => Self::HOURLY,
            FileRotation::Minutely => Self::MINUTELY,
            FileRotation::Never => Self::NEVER,
        }
    }
}

/// Line format of emitted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented.
    #[default]
    Pretty,
    /// One short line per record.
    Compact,
    /// One JSON object per record. Never colored.
    Json,
    /// One line per record with all span fields.
    Full,
}

/// Where records are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    #[default]
    Stderr,
    /// Rolling files named `<prefix>.<date>` inside `directory`.
    File {
        /// Directory holding the log files. Created on setup.
        directory: PathBuf,
        /// File name prefix.
        #[serde(default = "default_file_prefix")]
        prefix: String,
        /// Rollover schedule.
        #[serde(default)]
        rotation: FileRotation,
    },
}

fn default_file_prefix() -> String {
    "tidings".to_string()
}

/// Logging configuration.
///
/// Unknown keys are rejected when deserializing, so a misspelled option in a
/// config file is reported instead of silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Base filter, e.g. `info` or `tidings_events=trace`.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
    /// Output destination.
    pub target: LogTarget,
    /// Color output on terminals.
    pub ansi: bool,
    /// Extra filter directives layered over `level`.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            ansi: true,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Config with the given base filter and defaults elsewhere.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Use `format` for every record.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Write to `target`.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Write daily-rolled files into `directory`.
    #[must_use]
    pub fn with_file_target(self, directory: impl Into<PathBuf>) -> Self {
        self.with_target(LogTarget::File {
            directory: directory.into(),
            prefix: default_file_prefix(),
            rotation: FileRotation::Daily,
        })
    }

    /// Add a filter directive such as `tidings_events=trace`.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Turn colors off.
    #[must_use]
    pub fn without_ansi(mut self) -> Self {
        self.ansi = false;
        self
    }

    /// Build the filter from `level` plus every directive.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::ConfigError`] naming the first directive
    /// that does not parse.
    pub fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |what: &str, e: &dyn std::fmt::Display| {
            TelemetryError::ConfigError(format!("invalid log filter '{what}': {e}"))
        };

        let base = EnvFilter::try_new(&self.level).map_err(|e| invalid(&self.level, &e))?;

        self.directives.iter().try_fold(base, |filter, directive| {
            let parsed = directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| invalid(directive, &e),
            )?;
            Ok(filter.add_directive(parsed))
        })
    }

    /// Colors are only written to terminals and never in JSON.
    fn colored(&self) -> bool {
        self.ansi
            && self.format != LogFormat::Json
            && !matches!(self.target, LogTarget::File { .. })
    }

    fn format_layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layer = fmt::layer().with_writer(writer).with_ansi(self.colored());

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Full => layer.boxed(),
        }
    }

    fn output_layer(&self) -> TelemetryResult<BoxedLayer> {
        match &self.target {
            LogTarget::Stdout => Ok(self.format_layer(std::io::stdout)),
            LogTarget::Stderr => Ok(self.format_layer(std::io::stderr)),
            LogTarget::File {
                directory,
                prefix,
                rotation,
            } => {
                std::fs::create_dir_all(directory).map_err(|e| {
                    TelemetryError::ConfigError(format!(
                        "failed to create log directory {}: {e}",
                        directory.display()
                    ))
                })?;
                let appender = RollingFileAppender::new((*rotation).into(), directory, prefix);
                Ok(self.format_layer(appender))
            },
        }
    }
}

/// Install `config` as the global subscriber.
///
/// # Errors
///
/// Returns an error if a filter does not parse, the log directory cannot be
/// created, or a global subscriber is already set.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;
    let layer = config.output_layer()?;

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install the default config: `info`, pretty, stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::default())
}

/// Route records matching `config`'s filter to the test harness output.
///
/// Format and target are ignored. Only the first call in a process installs
/// anything, so every test may call it.
pub fn setup_test_logging(config: &LogConfig) {
    let filter = config
        .env_filter()
        .unwrap_or_else(|_| EnvFilter::new(TEST_FALLBACK_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.colored());
    }

    #[test]
    fn test_file_target_uses_daily_prefixed_files() {
        let config = LogConfig::new("debug").with_file_target("logs");

        assert_eq!(
            config.target,
            LogTarget::File {
                directory: PathBuf::from("logs"),
                prefix: "tidings".to_string(),
                rotation: FileRotation::Daily,
            }
        );
    }

    #[test]
    fn test_colors_only_on_terminal_text() {
        assert!(!LogConfig::default().without_ansi().colored());
        assert!(!LogConfig::default().with_format(LogFormat::Json).colored());
        assert!(!LogConfig::default().with_file_target("logs").colored());
        assert!(LogConfig::default().with_format(LogFormat::Compact).colored());
    }

    #[test]
    fn test_env_filter_with_directives() {
        let config = LogConfig::new("warn").with_directive("tidings_events=trace");
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_env_filter_names_bad_directive() {
        // EnvFilter accepts unknown targets, so only broken syntax fails.
        let config = LogConfig::new("warn").with_directive("[broken=syntax");

        let err = config.env_filter().unwrap_err();
        assert!(err.to_string().contains("[broken=syntax"));
    }

    #[test]
    fn test_file_target_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");

        let config = LogConfig::default().with_file_target(&logs);
        assert!(config.output_layer().is_ok());
        assert!(logs.is_dir());
    }

    #[test]
    fn test_setup_test_logging_is_idempotent() {
        setup_test_logging(&LogConfig::new("debug"));
        setup_test_logging(&LogConfig::new("trace").with_directive("[broken"));
        tracing::debug!("still fine");
    }
}
