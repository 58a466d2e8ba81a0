//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::PathBuf;

use crate::schema::ReportMode;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// apival configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the web form binds to
    pub host: Option<String>,

    /// Port the web form listens on
    pub port: Option<u16>,

    /// Directory where uploads are staged while a check runs
    pub upload_dir: Option<PathBuf>,

    /// Report the first violation only, or all of them
    pub report: Option<ReportMode>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (accessor fallbacks)

        // 2. Global user config (~/.config/apival/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                match std::fs::read_to_string(&global_path)
                    .map_err(|e| e.to_string())
                    .and_then(|contents| Self::from_yaml(&contents))
                {
                    Ok(global) => config.merge(global),
                    Err(e) => tracing::warn!(
                        path = %global_path.display(),
                        "ignoring unreadable config file: {}",
                        e
                    ),
                }
            }
        }

        // 3. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    /// Parse a YAML config document
    pub fn from_yaml(contents: &str) -> Result<Self, String> {
        serde_yml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "apival")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.upload_dir.is_some() {
            self.upload_dir = other.upload_dir;
        }
        if other.report.is_some() {
            self.report = other.report;
        }
    }

    /// Overlay `APIVAL_*` variables; unparseable values are skipped
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("APIVAL_HOST") {
            self.host = Some(host);
        }
        if let Some(port) = lookup("APIVAL_PORT") {
            match port.parse() {
                Ok(port) => self.port = Some(port),
                Err(_) => tracing::warn!("ignoring APIVAL_PORT={}: not a port number", port),
            }
        }
        if let Some(dir) = lookup("APIVAL_UPLOAD_DIR") {
            self.upload_dir = Some(PathBuf::from(dir));
        }
        if let Some(report) = lookup("APIVAL_REPORT") {
            match report.parse() {
                Ok(mode) => self.report = Some(mode),
                Err(e) => tracing::warn!("ignoring APIVAL_REPORT: {}", e),
            }
        }
    }

    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Upload staging directory, under the system temp dir by default
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("apival-uploads"))
    }

    pub fn report_mode(&self) -> ReportMode {
        self.report.unwrap_or_default()
    }
}
