// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_FRAME_INTERVAL, DEFAULT_MAX_DIMENSION,
};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Software detector settings
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Frames are downscaled so neither side exceeds this before detection
    pub max_dimension: u32,
    /// Retry detection on the inverted image when nothing was found
    ///
    /// Off by default: the extra pass doubles the cost of every empty frame
    /// and qram streams are rendered dark-on-light.
    pub attempt_inverted: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            attempt_inverted: false,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Pause between frame attempts in milliseconds
    pub frame_interval_ms: u64,
    /// Software detector settings
    pub detector: DetectorConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: DEFAULT_FRAME_INTERVAL.as_millis() as u64,
            detector: DetectorConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, the user config file is
    /// read if present, otherwise defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::from_file(&path)?;
        info!(path = %path.display(), "Loaded scanner config");
        Ok(config)
    }

    /// Read and validate a JSON config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/qram-scanner/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "frame_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.detector.max_dimension == 0 {
            return Err(ConfigError::Invalid(
                "detector.max_dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
