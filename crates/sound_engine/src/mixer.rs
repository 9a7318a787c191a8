//! Mixer groups
//!
//! Named volume groups providing independent volume control for categories
//! of sounds, plus the master level everything scales through. This is the
//! facade-side analog of the middleware's bus/VCA hierarchy.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Volume group categories for independent volume control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VolumeGroup {
    /// Master volume (affects all sounds)
    Master,
    /// Background music
    Music,
    /// Sound effects
    #[default]
    Sfx,
    /// Ambient environmental sounds
    Ambience,
}

impl VolumeGroup {
    /// Resolve a middleware-style bus path (`bus:/Music`) to a group
    pub fn from_bus_path(path: &str) -> Option<Self> {
        Self::from_name(path.strip_prefix("bus:/")?)
    }

    /// Resolve a middleware-style VCA path (`vca:/Music`) to a group; the
    /// facade models VCAs and buses as the same volume groups
    pub fn from_vca_path(path: &str) -> Option<Self> {
        Self::from_name(path.strip_prefix("vca:/")?)
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "" | "Master" => Some(Self::Master),
            "Music" => Some(Self::Music),
            "SFX" | "Sfx" => Some(Self::Sfx),
            "Ambience" => Some(Self::Ambience),
            _ => None,
        }
    }
}

/// Mixer managing per-group volume and mute state
pub struct Mixer {
    group_volumes: HashMap<VolumeGroup, f32>,
    group_muted: HashMap<VolumeGroup, bool>,
}

impl Mixer {
    /// Create a mixer with all groups at full volume
    pub fn new() -> Self {
        let mut group_volumes = HashMap::new();
        group_volumes.insert(VolumeGroup::Master, 1.0);
        group_volumes.insert(VolumeGroup::Music, 1.0);
        group_volumes.insert(VolumeGroup::Sfx, 1.0);
        group_volumes.insert(VolumeGroup::Ambience, 1.0);

        Self {
            group_volumes,
            group_muted: HashMap::new(),
        }
    }

    /// Set volume for a group (clamped to 0.0..=1.0)
    pub fn set_volume(&mut self, group: VolumeGroup, volume: f32) {
        self.group_volumes.insert(group, volume.clamp(0.0, 1.0));
    }

    /// Get the configured volume for a group
    pub fn volume(&self, group: VolumeGroup) -> f32 {
        *self.group_volumes.get(&group).unwrap_or(&1.0)
    }

    /// Get the effective volume for a group: group level scaled by master,
    /// zero when either is muted
    pub fn effective_volume(&self, group: VolumeGroup) -> f32 {
        if self.is_muted(group) || self.is_muted(VolumeGroup::Master) {
            return 0.0;
        }
        if group == VolumeGroup::Master {
            return self.volume(VolumeGroup::Master);
        }
        self.volume(group) * self.volume(VolumeGroup::Master)
    }

    /// Mute a group
    pub fn mute(&mut self, group: VolumeGroup) {
        self.group_muted.insert(group, true);
    }

    /// Unmute a group
    pub fn unmute(&mut self, group: VolumeGroup) {
        self.group_muted.insert(group, false);
    }

    /// Check whether a group is muted
    pub fn is_muted(&self, group: VolumeGroup) -> bool {
        *self.group_muted.get(&group).unwrap_or(&false)
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}
