use std::fs;
use std::path::{Path, PathBuf};

use irtrack_core::{TargetRect, TargetRectError};
use irtrack_protocol::{parse_target, TransportError};
use serde::{Deserialize, Serialize};

/// Upper bound of the sensor exposure setting.
pub const MAX_EXPOSURE: u32 = 7500;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Address(#[from] TransportError),
    #[error(transparent)]
    Target(#[from] TargetRectError),
    #[error("exposure {0} is above the maximum of {MAX_EXPOSURE}")]
    Exposure(u32),
}

/// Operator settings of one tracking session.
///
/// Missing JSON fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Destination IPv4 address for coordinate packets.
    pub ip: String,
    pub port: u16,
    /// Width of the rectified target space in pixels.
    pub target_width: u32,
    /// Height of the rectified target space in pixels.
    pub target_height: u32,
    /// Sensor exposure, `0..=7500`.
    pub exposure: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 7777,
            target_width: 1024,
            target_height: 768,
            exposure: MAX_EXPOSURE,
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check address, port, target size and exposure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_target(&self.ip, self.port)?;
        self.target_rect()?;
        if self.exposure > MAX_EXPOSURE {
            return Err(ConfigError::Exposure(self.exposure));
        }
        Ok(())
    }

    /// Copy with the exposure clamped into range.
    pub fn sanitized(mut self) -> Self {
        self.exposure = self.exposure.min(MAX_EXPOSURE);
        self
    }

    pub fn target_rect(&self) -> Result<TargetRect, TargetRectError> {
        TargetRect::new(self.target_width, self.target_height)
    }
}
