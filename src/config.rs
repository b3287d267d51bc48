//! Client configuration.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config dir (or `--config`)
//! 3. environment (`STUDYSCOPE_*`, `.env` honored via dotenvy)
//! 4. command-line overrides
//!
//! ```toml
//! base_url = "https://studies.example.org"
//! timeout_ms = 15000
//! suggest_delay_ms = 300
//! data_dir = "/var/lib/studyscope"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::search::suggest::SUGGEST_DELAY;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin; API paths are resolved against it.
    pub base_url: String,
    /// Holds the credential file and TUI logs.
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub suggest_delay: Duration,
}

/// Shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub suggest_delay_ms: Option<u64>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: default_data_dir(),
            request_timeout: DEFAULT_TIMEOUT,
            suggest_delay: SUGGEST_DELAY,
        }
    }
}

impl ClientConfig {
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut cfg = Self::default();

        let file_path = overrides.config_path.clone().or_else(default_config_path);
        if let Some(path) = file_path {
            if path.exists() {
                let file = FileConfig::load(&path)?;
                cfg.apply_file(file);
                tracing::debug!(path = %path.display(), "loaded config file");
            } else if overrides.config_path.is_some() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
        }

        cfg.apply_env();

        if let Some(url) = &overrides.base_url {
            cfg.base_url = url.clone();
        }
        if let Some(dir) = &overrides.data_dir {
            cfg.data_dir = dir.clone();
        }
        Ok(cfg)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(url) = file.base_url {
            self.base_url = url;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(ms) = file.timeout_ms {
            self.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.suggest_delay_ms {
            self.suggest_delay = Duration::from_millis(ms);
        }
    }

    /// Environment overrides. Unparseable numbers are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(url) = dotenvy::var("STUDYSCOPE_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(dir) = dotenvy::var("STUDYSCOPE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(val) = dotenvy::var("STUDYSCOPE_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => self.request_timeout = Duration::from_millis(ms),
                Err(_) => tracing::warn!("ignoring STUDYSCOPE_TIMEOUT_MS={val}: not a number"),
            }
        }
        if let Ok(val) = dotenvy::var("STUDYSCOPE_SUGGEST_DELAY_MS") {
            match val.parse::<u64>() {
                Ok(ms) => self.suggest_delay = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!("ignoring STUDYSCOPE_SUGGEST_DELAY_MS={val}: not a number")
                }
            }
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("org", "studyscope", "studyscope")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

pub fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".studyscope"))
}
