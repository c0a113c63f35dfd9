// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::FacingMode;
use crate::constants::capture::DEFAULT_QUALITY;
use crate::constants::lut::DEFAULT_SIZE;
use crate::constants::{DEFAULT_READINESS_TIMEOUT, DEFAULT_REFRESH_RATE_HZ};
use crate::errors::ConfigError;
use crate::pipelines::photo::EncodingFormat;
use crate::pipelines::render::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const APP_DIR: &str = "camera-pipeline";
const CONFIG_FILE: &str = "config.json";

/// LUT to load at startup
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct LutSettings {
    /// Image holding the flattened cube
    pub path: PathBuf,
    /// Cube edge length
    #[serde(default = "default_lut_size")]
    pub size: u32,
}

fn default_lut_size() -> u32 {
    DEFAULT_SIZE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera requested at start
    pub default_facing: FacingMode,
    /// Still capture encoding
    pub capture_format: EncodingFormat,
    /// Lossy encoding quality in `[0, 1]`
    pub capture_quality: f32,
    /// How long to wait for the video source to become readable
    pub readiness_timeout_ms: u64,
    /// Render loop rate when driven by the built-in refresh loop
    pub refresh_rate_hz: u32,
    /// Filter selected at start
    pub filter: FilterType,
    /// Simulated exposure at start
    pub exposure_ev: f32,
    /// Optional LUT for the `lut` filter
    pub lut: Option<LutSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_facing: FacingMode::Environment,
            capture_format: EncodingFormat::Jpeg,
            capture_quality: DEFAULT_QUALITY,
            readiness_timeout_ms: DEFAULT_READINESS_TIMEOUT.as_millis() as u64,
            refresh_rate_hz: DEFAULT_REFRESH_RATE_HZ,
            filter: FilterType::Identity,
            exposure_ev: 0.0,
            lut: None,
        }
    }
}

impl Config {
    /// `<config dir>/camera-pipeline/config.json`
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    /// Read a config file; missing fields take their defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load the user config, falling back to defaults on any problem
    pub fn load_or_default() -> Self {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Using default config");
                return Self::default();
            }
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }
}
