//! Configuration management for studytrack.
//!
//! This module handles loading and saving configuration from `~/.studytrack/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{AnalysisConfig, ColorSetting, Config, GeneralConfig, SessionConfig};
