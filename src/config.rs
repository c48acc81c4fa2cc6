//! Process configuration from `HEADWAY_*` environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;
use crate::application::DEFAULT_LATENCY;
use crate::HeadwayError;

pub const DEFAULT_DB_PATH: &str = "headway.db";
pub const DEFAULT_LOG_FILE: &str = "headway.log";

/// Where log output goes. Never stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    File,
    Stderr,
    /// File when `HEADWAY_LOG_FILE` is set, stderr otherwise
    #[default]
    Auto,
}

impl FromStr for LogMode {
    type Err = HeadwayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "stderr" => Ok(Self::Stderr),
            "auto" | "" => Ok(Self::Auto),
            other => Err(HeadwayError::Validation(format!(
                "HEADWAY_LOG_MODE must be file, stderr or auto (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Replaces the bundled taxonomy when set
    pub taxonomy_path: Option<PathBuf>,
    pub analysis_latency: Duration,
    /// Fixed seed for reproducible severities
    pub severity_seed: Option<u64>,
    pub log_mode: LogMode,
    pub log_file: Option<PathBuf>,
    pub sanitize_max_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            taxonomy_path: None,
            analysis_latency: DEFAULT_LATENCY,
            severity_seed: None,
            log_mode: LogMode::Auto,
            log_file: None,
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

impl AppConfig {
    /// # Errors
    /// Returns a validation error for malformed values.
    pub fn from_env() -> Result<Self, HeadwayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    ///
    /// # Errors
    /// Returns a validation error for malformed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HeadwayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("HEADWAY_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        config.taxonomy_path = get("HEADWAY_TAXONOMY_PATH").map(PathBuf::from);
        if let Some(ms) = get("HEADWAY_ANALYSIS_LATENCY_MS") {
            config.analysis_latency = Duration::from_millis(parse_number("HEADWAY_ANALYSIS_LATENCY_MS", &ms)?);
        }
        config.severity_seed = get("HEADWAY_SEVERITY_SEED")
            .map(|seed| parse_number("HEADWAY_SEVERITY_SEED", &seed))
            .transpose()?;
        if let Some(mode) = get("HEADWAY_LOG_MODE") {
            config.log_mode = mode.parse()?;
        }
        config.log_file = get("HEADWAY_LOG_FILE").map(PathBuf::from);
        if let Some(bytes) = get("HEADWAY_SANITIZE_MAX_BYTES") {
            let bytes: u64 = parse_number("HEADWAY_SANITIZE_MAX_BYTES", &bytes)?;
            if bytes == 0 {
                return Err(HeadwayError::Validation(
                    "HEADWAY_SANITIZE_MAX_BYTES must be positive".to_string(),
                ));
            }
            config.sanitize_max_bytes = usize::try_from(bytes).unwrap_or(usize::MAX);
        }

        Ok(config)
    }

    /// Log file to write to, or `None` for stderr.
    #[must_use]
    pub fn log_destination(&self) -> Option<&Path> {
        match self.log_mode {
            LogMode::Stderr => None,
            LogMode::File => Some(
                self.log_file
                    .as_deref()
                    .unwrap_or_else(|| Path::new(DEFAULT_LOG_FILE)),
            ),
            LogMode::Auto => self.log_file.as_deref(),
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, HeadwayError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| HeadwayError::Validation(format!("{key} must be a non-negative integer (got {value:?})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, HeadwayError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).expect("Should load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.analysis_latency, Duration::from_millis(800));
        assert_eq!(config.log_destination(), None);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HEADWAY_DB_PATH", "/tmp/profile.db"),
            ("HEADWAY_TAXONOMY_PATH", "symptoms.json"),
            ("HEADWAY_ANALYSIS_LATENCY_MS", "0"),
            ("HEADWAY_SEVERITY_SEED", "42"),
            ("HEADWAY_LOG_MODE", "FILE"),
            ("HEADWAY_SANITIZE_MAX_BYTES", "4096"),
        ])
        .expect("Should load");

        assert_eq!(config.db_path, PathBuf::from("/tmp/profile.db"));
        assert_eq!(config.taxonomy_path, Some(PathBuf::from("symptoms.json")));
        assert_eq!(config.analysis_latency, Duration::ZERO);
        assert_eq!(config.severity_seed, Some(42));
        assert_eq!(config.sanitize_max_bytes, 4096);
        assert_eq!(config.log_destination(), Some(Path::new(DEFAULT_LOG_FILE)));
    }

    #[test]
    fn test_auto_log_mode_follows_log_file() {
        let config = config(&[("HEADWAY_LOG_FILE", "/var/log/headway.log")]).expect("Should load");
        assert_eq!(config.log_destination(), Some(Path::new("/var/log/headway.log")));

        let stderr = config_with_mode("stderr");
        assert_eq!(stderr.log_destination(), None);
    }

    fn config_with_mode(mode: &str) -> AppConfig {
        config(&[("HEADWAY_LOG_MODE", mode), ("HEADWAY_LOG_FILE", "ignored.log")]).expect("Should load")
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("HEADWAY_ANALYSIS_LATENCY_MS", "soon")]),
            Err(HeadwayError::Validation(_))
        ));
        assert!(matches!(
            config(&[("HEADWAY_LOG_MODE", "stdout")]),
            Err(HeadwayError::Validation(_))
        ));
        assert!(matches!(
            config(&[("HEADWAY_SANITIZE_MAX_BYTES", "0")]),
            Err(HeadwayError::Validation(_))
        ));
    }
}
