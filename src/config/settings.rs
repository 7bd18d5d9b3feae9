//! Configuration settings for studytrack.
//!
//! Settings are loaded from `~/.studytrack/config.yaml`. Every field has a
//! default, so a partial file (or no file at all) is valid.

use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::error::TrackerError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Session limits.
    pub session: SessionConfig,
    /// Alert and recommendation thresholds.
    pub analysis: AnalysisConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    pub default_output: OutputFormat,
    /// Color output setting.
    pub color: ColorSetting,
}

/// Color output setting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorSetting {
    /// Auto-detect based on terminal.
    #[default]
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

impl ColorSetting {
    /// Apply this setting to the global `colored` override.
    pub fn apply(self) {
        match self {
            Self::Auto => colored::control::unset_override(),
            Self::Always => colored::control::set_override(true),
            Self::Never => colored::control::set_override(false),
        }
    }
}

/// Session limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Target duration used when `session create` is given none.
    pub default_target_minutes: u32,
    /// Longest target duration a session may be created with.
    pub max_target_minutes: u32,
    /// Shortest break that may be recorded.
    pub break_min_minutes: u32,
    /// Longest break that may be recorded.
    pub break_max_minutes: u32,
    /// Samples generated per `session simulate` call when no count is given.
    pub simulate_samples: usize,
}

/// Thresholds used when turning a metric sample into alerts and
/// recommendations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Focus below this raises a high focus alert.
    pub focus_high: f64,
    /// Focus below this raises a medium focus alert.
    pub focus_medium: f64,
    /// Posture below this raises a high posture alert.
    pub posture_high: f64,
    /// Posture below this raises a medium posture alert.
    pub posture_medium: f64,
    /// Eye strain above this raises a high eye strain alert.
    pub eye_strain_high: f64,
    /// Eye strain above this raises a medium eye strain alert.
    pub eye_strain_medium: f64,
    /// Distractions at or above this raise a distraction alert.
    pub distraction_alert: u32,
    /// Elapsed minutes after which a long break is recommended.
    pub long_session_minutes: i64,
    /// Pomodoro interval in minutes.
    pub pomodoro_minutes: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Pretty,
            color: ColorSetting::Auto,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_target_minutes: 60,
            max_target_minutes: 480,
            break_min_minutes: 1,
            break_max_minutes: 60,
            simulate_samples: 10,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            focus_high: 30.0,
            focus_medium: 50.0,
            posture_high: 40.0,
            posture_medium: 60.0,
            eye_strain_high: 80.0,
            eye_strain_medium: 60.0,
            distraction_alert: 3,
            long_session_minutes: 90,
            pomodoro_minutes: 25,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self, TrackerError> {
        let paths = Paths::new()?;
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// holds inconsistent limits.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, TrackerError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::Config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            TrackerError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), TrackerError> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| TrackerError::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents).map_err(|e| {
            TrackerError::Config(format!(
                "Failed to write config file {}: {e}",
                path.display()
            ))
        })
    }

    fn validate(&self) -> Result<(), TrackerError> {
        let s = &self.session;
        if s.max_target_minutes == 0 {
            return Err(TrackerError::Config(
                "session.max_target_minutes must be positive".to_string(),
            ));
        }
        if s.break_min_minutes == 0 || s.break_min_minutes > s.break_max_minutes {
            return Err(TrackerError::Config(format!(
                "break limits are inconsistent: {}..{}",
                s.break_min_minutes, s.break_max_minutes
            )));
        }
        if self.analysis.pomodoro_minutes <= 0 {
            return Err(TrackerError::Config(
                "analysis.pomodoro_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.general.default_output, OutputFormat::Pretty);
        assert_eq!(config.general.color, ColorSetting::Auto);
        assert_eq!(config.session.max_target_minutes, 480);
        assert_eq!(config.session.break_max_minutes, 60);
        assert!((config.analysis.focus_medium - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let config = Config::load_from_path(&config_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut config = Config::default();
        config.session.default_target_minutes = 45;
        config.analysis.distraction_alert = 5;

        config.save_to_path(&config_path).unwrap();
        let loaded = Config::load_from_path(&config_path).unwrap();

        assert_eq!(loaded.session.default_target_minutes, 45);
        assert_eq!(loaded.analysis.distraction_alert, 5);
    }

    #[test]
    fn test_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let partial_yaml = r"
session:
  break_max_minutes: 30
";
        std::fs::write(&config_path, partial_yaml).unwrap();

        let config = Config::load_from_path(&config_path).unwrap();

        assert_eq!(config.session.break_max_minutes, 30);
        assert_eq!(config.session.break_min_minutes, 1);
        assert_eq!(config.general.default_output, OutputFormat::Pretty);
    }

    #[test]
    fn test_inconsistent_break_limits_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        std::fs::write(
            &config_path,
            "session:\n  break_min_minutes: 20\n  break_max_minutes: 10\n",
        )
        .unwrap();

        let err = Config::load_from_path(&config_path).unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }
}
