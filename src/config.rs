//! Configuration management module.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How leave days are counted for requests overlapping the report window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveDaysPolicy {
    /// Count the request's full `totalDays`, even for days outside the window.
    #[default]
    Full,
    /// Count only calendar days inside the window, capped at `totalDays`.
    Clipped,
}

/// Report engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Max per-employee monthly attendance summaries fetched per report.
    #[serde(default = "default_attendance_fan_out")]
    pub attendance_summary_fan_out: usize,
    /// Max per-employee leave balance lookups per report.
    #[serde(default = "default_leave_fan_out")]
    pub leave_balance_fan_out: usize,
    /// Leaderboard length.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Absences at or above which an employee is listed as chronically absent.
    #[serde(default = "default_chronic_absence_threshold")]
    pub chronic_absence_threshold: usize,
    /// Records requested per page from paginated sources.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub leave_days_policy: LeaveDaysPolicy,
}

fn default_attendance_fan_out() -> usize {
    20
}

fn default_leave_fan_out() -> usize {
    50
}

fn default_top_n() -> usize {
    10
}

fn default_chronic_absence_threshold() -> usize {
    3
}

fn default_page_size() -> u32 {
    500
}

/// Where the file-backed data source reads its JSON exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dir: PathBuf,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files; stderr only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Get config file path (per-user config directory, or next to the executable).
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("com", "gianged", "workforce-reports")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            })
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let report = &self.report;
        if report.attendance_summary_fan_out == 0 {
            return Err(ConfigError::Validation(
                "Attendance summary fan-out must be at least 1".to_string(),
            ));
        }
        if report.leave_balance_fan_out == 0 {
            return Err(ConfigError::Validation(
                "Leave balance fan-out must be at least 1".to_string(),
            ));
        }
        if report.top_n == 0 {
            return Err(ConfigError::Validation("Top-N must be at least 1".to_string()));
        }
        if report.chronic_absence_threshold == 0 {
            return Err(ConfigError::Validation(
                "Chronic absence threshold must be at least 1".to_string(),
            ));
        }
        if report.page_size == 0 || report.page_size > 5000 {
            return Err(ConfigError::Validation(
                "Page size must be between 1 and 5000".to_string(),
            ));
        }
        if self.data.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("Data directory cannot be empty".to_string()));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            attendance_summary_fan_out: default_attendance_fan_out(),
            leave_balance_fan_out: default_leave_fan_out(),
            top_n: default_top_n(),
            chronic_absence_threshold: default_chronic_absence_threshold(),
            page_size: default_page_size(),
            leave_days_policy: LeaveDaysPolicy::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.report.attendance_summary_fan_out, 20);
        assert_eq!(config.report.leave_balance_fan_out, 50);
        assert_eq!(config.report.chronic_absence_threshold, 3);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [report]
            top_n = 5
            leave_days_policy = "clipped"

            [data]
            dir = "/srv/hr-exports"
            "#,
        )
        .unwrap();

        assert_eq!(config.report.top_n, 5);
        assert_eq!(config.report.leave_days_policy, LeaveDaysPolicy::Clipped);
        assert_eq!(config.report.page_size, 500);
        assert_eq!(config.data.dir, PathBuf::from("/srv/hr-exports"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_zero_fan_out() {
        let mut config = AppConfig::default();
        config.report.leave_balance_fan_out = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_page_size_bounds() {
        let mut config = AppConfig::default();

        config.report.page_size = 0;
        assert!(config.validate().is_err());

        config.report.page_size = 5001;
        assert!(config.validate().is_err());

        config.report.page_size = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "chatty".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_try_load_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Missing));

        std::fs::write(&path, "[report]\ntop_n = 0\n").unwrap();
        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Invalid(_)));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.report.top_n = 7;
        config.save(&path).unwrap();

        match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(loaded) => assert_eq!(loaded.report.top_n, 7),
            other => panic!("unexpected load result: {other:?}"),
        }
    }
}
