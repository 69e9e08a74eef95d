//! Monitor settings
//!
//! Layered with the `config` crate: optional settings file, then
//! `FATIGUE_`-prefixed environment variables (`__` between nested keys,
//! e.g. `FATIGUE_DETECTION__EAR_THRESHOLD=0.22`), then defaults.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use alerting::EmergencyContact;
use config::{Config, ConfigError, Environment, File};
use dms::FatigueConfig;
use serde::{Deserialize, Serialize};

/// Default settings file name (extension picked by the `config` crate)
pub const DEFAULT_SETTINGS_FILE: &str = "fatigue-monitor";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Detection thresholds
    pub detection: FatigueConfig,

    /// Who to notify on emergency escalation
    pub contact: Option<EmergencyContact>,

    /// JSON-lines landmark stream
    pub landmark_source: PathBuf,

    /// Session history
    pub session_log: PathBuf,

    /// Directory for per-session reports
    pub reports_dir: PathBuf,

    /// Output path of the long-term analysis report
    pub analysis_report: PathBuf,

    /// Frames buffered between the reader and the classifier
    pub frame_queue: usize,

    /// Prometheus exporter listen address
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            detection: FatigueConfig::default(),
            contact: None,
            landmark_source: PathBuf::from("landmarks.jsonl"),
            session_log: PathBuf::from("fatigue_log.json"),
            reports_dir: PathBuf::from("reports"),
            analysis_report: PathBuf::from("fatigue_analysis_report.txt"),
            frame_queue: 64,
            metrics_addr: None,
        }
    }
}

/// Load settings from `file` (required) or the default file (optional)
pub fn load_settings(file: Option<&Path>) -> Result<MonitorSettings, ConfigError> {
    let file_source = match file {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
    };

    Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("FATIGUE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
