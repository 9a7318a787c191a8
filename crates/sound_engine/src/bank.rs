//! Sound bank manifests
//!
//! A bank groups event definitions produced by authoring tooling. The facade
//! treats a bank as an opaque resource; only the backend reads its contents.
//! The on-disk representation is a RON manifest mapping logical event paths
//! (`event:/Category/Name`) to sample files and authoring defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::AudioError;
use crate::mixer::VolumeGroup;

/// How bank sample data is brought into memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Read all referenced sample files before `load_bank` returns
    Immediate,
    /// Return immediately; sample files are read incrementally during
    /// `update` and the bank is observable via its load state
    Deferred,
}

/// Observable load state of a bank
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankState {
    /// Sample data is still being read
    Pending,
    /// All events in the bank are resolvable
    Ready,
    /// Loading failed; events in this bank will never resolve
    Failed(String),
}

/// One event definition inside a bank manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Logical path, e.g. `event:/SFX/Explosion`
    pub path: String,

    /// Sample file, relative to the bank file's directory
    pub file: PathBuf,

    /// Whether playback loops until explicitly stopped
    #[serde(default)]
    pub looping: bool,

    /// Whether the event is positioned in 3D space
    #[serde(default)]
    pub spatial: bool,

    /// Authoring-time base volume (0.0 to 1.0)
    #[serde(default = "default_unit")]
    pub volume: f32,

    /// Authoring-time base pitch multiplier
    #[serde(default = "default_unit")]
    pub pitch: f32,

    /// Mixer group the event routes through
    #[serde(default)]
    pub group: VolumeGroup,

    /// Default values for named parameters
    #[serde(default)]
    pub parameters: HashMap<String, f32>,
}

fn default_unit() -> f32 {
    1.0
}

/// Parsed bank manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankManifest {
    /// Human-readable bank name
    pub name: String,

    /// Events defined by this bank
    pub events: Vec<EventDefinition>,
}

impl BankManifest {
    /// Parse a manifest from RON text
    pub fn from_str(text: &str) -> Result<Self, AudioError> {
        ron::from_str(text).map_err(|e| AudioError::InvalidData(e.to_string()))
    }

    /// Read and parse a bank manifest file
    pub fn from_file(path: &Path) -> Result<Self, AudioError> {
        let text = std::fs::read_to_string(path).map_err(|e| AudioError::BankLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_str(&text).map_err(|e| AudioError::BankLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Find an event definition by its logical path
    pub fn find_event(&self, event_path: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|e| e.path == event_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
        (
            name: "sfx",
            events: [
                (
                    path: "event:/SFX/Explosion",
                    file: "explosion.ogg",
                    volume: 0.8,
                    parameters: { "Size": 1.0 },
                ),
                (
                    path: "event:/Music/Theme",
                    file: "theme.ogg",
                    looping: true,
                    group: Music,
                ),
            ],
        )
    "#;

    #[test]
    fn test_manifest_parses() {
        let manifest = BankManifest::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.name, "sfx");
        assert_eq!(manifest.events.len(), 2);
    }

    #[test]
    fn test_event_defaults() {
        let manifest = BankManifest::from_str(MANIFEST).unwrap();
        let explosion = manifest.find_event("event:/SFX/Explosion").unwrap();
        assert!(!explosion.looping);
        assert_eq!(explosion.volume, 0.8);
        assert_eq!(explosion.pitch, 1.0);
        assert_eq!(explosion.group, VolumeGroup::Sfx);
        assert_eq!(explosion.parameters.get("Size"), Some(&1.0));
    }

    #[test]
    fn test_find_event_by_path() {
        let manifest = BankManifest::from_str(MANIFEST).unwrap();
        let theme = manifest.find_event("event:/Music/Theme").unwrap();
        assert!(theme.looping);
        assert_eq!(theme.group, VolumeGroup::Music);
        assert!(manifest.find_event("event:/Missing").is_none());
    }

    #[test]
    fn test_malformed_manifest_rejected() {
        assert!(matches!(
            BankManifest::from_str("not a manifest"),
            Err(AudioError::InvalidData(_))
        ));
    }
}
