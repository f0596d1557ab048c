//! Loading the logging configuration from TOML files and the environment.
//!
//! A config file may either hold the logging keys at the top level or nest
//! them under a `[logging]` table:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "compact"
//! directives = ["tidings_events=trace"]
//! ```

use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{TelemetryError, TelemetryResult};
use crate::logging::{LogConfig, LogFormat};

/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "TIDINGS_LOG";

/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV: &str = "TIDINGS_LOG_FORMAT";

const LOGGING_SECTION: &str = "logging";

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            other => Err(TelemetryError::ConfigError(format!(
                "unknown log format '{other}' (expected pretty, compact, json or full)"
            ))),
        }
    }
}

impl LogConfig {
    /// Parse a logging configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, if `logging` is not a
    /// table, or if a field has the wrong type.
    pub fn from_toml_str(content: &str) -> TelemetryResult<Self> {
        parse(content, "<inline>")
    }

    /// Load a logging configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> TelemetryResult<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            },
            Err(e) => return Err(e.into()),
        };

        parse(&content, &path.display().to_string())
    }

    /// Apply overrides from [`LOG_LEVEL_ENV`] and [`LOG_FORMAT_ENV`].
    ///
    /// # Errors
    ///
    /// Returns an error if the format variable holds an unknown format.
    pub fn apply_env(self) -> TelemetryResult<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the format variable holds an unknown format.
    pub fn apply_env_from<F>(mut self, lookup: F) -> TelemetryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name| lookup(name).filter(|value: &String| !value.trim().is_empty());

        if let Some(level) = present(LOG_LEVEL_ENV) {
            self.level = level;
        }
        if let Some(format) = present(LOG_FORMAT_ENV) {
            self.format = format.parse()?;
        }

        Ok(self)
    }
}

fn parse(content: &str, origin: &str) -> TelemetryResult<LogConfig> {
    let parse_err = |source| TelemetryError::ParseError {
        path: origin.to_string(),
        source,
    };

    let mut table: toml::Table = toml::from_str(content).map_err(parse_err)?;

    let section = match table.remove(LOGGING_SECTION) {
        Some(toml::Value::Table(section)) => section,
        Some(_) => {
            return Err(TelemetryError::ConfigError(format!(
                "'{LOGGING_SECTION}' in {origin} must be a table"
            )));
        },
        None => table,
    };

    toml::Value::Table(section).try_into().map_err(parse_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{FileRotation, LogTarget};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_logging_section() {
        let config = LogConfig::from_toml_str(
            r#"
            [logging]
            level = "debug"
            format = "json"
            ansi = false
            directives = ["tidings_events=trace"]
            "#,
        )
        .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.ansi);
        assert_eq!(config.directives, vec!["tidings_events=trace"]);
    }

    #[test]
    fn test_parse_bare_table() {
        let config = LogConfig::from_toml_str("level = \"warn\"\nformat = \"compact\"").unwrap();

        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.ansi);
    }

    #[test]
    fn test_parse_file_target() {
        let config = LogConfig::from_toml_str(
            r#"
            [logging.target.file]
            directory = "/var/log/tidings"
            rotation = "hourly"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.target,
            LogTarget::File {
                directory: PathBuf::from("/var/log/tidings"),
                prefix: "tidings".to_string(),
                rotation: FileRotation::Hourly,
            }
        );
    }

    #[test]
    fn test_parse_stdout_target() {
        let config = LogConfig::from_toml_str("target = \"stdout\"").unwrap();
        assert_eq!(config.target, LogTarget::Stdout);
    }

    #[test]
    fn test_parse_empty_gives_defaults() {
        let config = LogConfig::from_toml_str("").unwrap();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = LogConfig::from_toml_str("level = ");
        assert!(matches!(result, Err(TelemetryError::ParseError { .. })));
    }

    #[test]
    fn test_parse_wrong_field_type() {
        let result = LogConfig::from_toml_str("[logging]\nansi = \"yes\"");
        assert!(matches!(result, Err(TelemetryError::ParseError { .. })));
    }

    #[test]
    fn test_parse_unknown_key() {
        let result = LogConfig::from_toml_str("[logging]\nlevle = \"debug\"");
        assert!(matches!(result, Err(TelemetryError::ParseError { .. })));
    }

    #[test]
    fn test_parse_logging_not_a_table() {
        let result = LogConfig::from_toml_str("logging = 3");
        assert!(matches!(result, Err(TelemetryError::ConfigError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"trace\"").unwrap();

        let config = LogConfig::load(file.path()).unwrap();
        assert_eq!(config.level, "trace");
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "level = [").unwrap();

        let err = LogConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_env_overrides() {
        let config = LogConfig::default()
            .apply_env_from(env(&[(LOG_LEVEL_ENV, "debug"), (LOG_FORMAT_ENV, "JSON")]))
            .unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_env_empty_values_ignored() {
        let config = LogConfig::new("warn")
            .apply_env_from(env(&[(LOG_LEVEL_ENV, "  ")]))
            .unwrap();

        assert_eq!(config.level, "warn");
    }

    #[test]
    fn test_env_invalid_format() {
        let result = LogConfig::default().apply_env_from(env(&[(LOG_FORMAT_ENV, "xml")]));
        assert!(matches!(result, Err(TelemetryError::ConfigError(_))));
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!(" Full ".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert!("verbose".parse::<LogFormat>().is_err());
    }
}
