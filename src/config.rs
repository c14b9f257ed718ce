use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;

/// Runtime settings, read from a JSON file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Offsets applied per render context.
    pub calibration: CalibrationConfig,
    /// Where uploaded and filled documents are kept.
    pub storage_dir: PathBuf,
    /// Upper bound for a whole fill, including image downloads.
    pub fill_timeout_secs: u64,
    /// Upper bound for a single remote image download.
    pub fetch_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            calibration: CalibrationConfig::IDENTITY,
            storage_dir: PathBuf::from("storage"),
            fill_timeout_secs: 60,
            fetch_timeout_secs: 15,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            log::info!("no config file given, using defaults");
            return Ok(Config::default());
        };
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: Config =
            serde_json::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn fill_timeout(&self) -> Duration {
        Duration::from_secs(self.fill_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
