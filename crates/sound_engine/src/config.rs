//! Audio settings loaded from configuration files
//!
//! Settings are plain serde structs readable from `.toml` or `.ron`, so a
//! game can ship one audio config next to its other data files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Audio engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Directory scanned for bank files by bulk loading
    pub bank_directory: PathBuf,

    /// File extension identifying bank files (without the dot)
    pub bank_extension: String,

    /// Load bank sample data synchronously; `false` defers loading to
    /// update-time polling
    pub load_samples_immediately: bool,

    /// Initial master volume (0.0 to 1.0)
    pub master_volume: f32,

    /// Rate at which the middleware is pumped by the director, in Hz
    pub update_rate_hz: f32,

    /// Output sample rate hint for the backend
    pub sample_rate: u32,

    /// Output channel count hint for the backend (1=mono, 2=stereo)
    pub channels: u16,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            bank_directory: PathBuf::from("resources/banks"),
            bank_extension: "bank".to_string(),
            load_samples_immediately: true,
            master_volume: 1.0,
            update_rate_hz: 60.0,
            sample_rate: 44100,
            channels: 2,
        }
    }
}

impl AudioSettings {
    /// Load settings from a `.toml` or `.ron` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();

        // Reject unknown formats before touching the filesystem
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                let contents = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
                toml::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
            }
            Some("ron") => {
                let contents = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
                ron::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))
            }
            _ => Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }

    /// Save settings to a `.toml` or `.ron` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| SettingsError::Serialize(e.to_string()))?,
            _ => {
                return Err(SettingsError::UnsupportedFormat(
                    path.display().to_string(),
                ))
            }
        };

        std::fs::write(path, contents).map_err(SettingsError::Io)
    }
}

/// Settings loading/saving errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("unsupported settings format: {0}")]
    UnsupportedFormat(String),
}
