//! High-level audio direction
//!
//! Game-facing layer over [`AudioEngine`]: named lookup of playing events,
//! music exclusivity with fade-in, fire-and-forget one-shots, bulk bank
//! loading, and periodic cleanup of finished instances. Games that want
//! direct control can skip this and talk to the engine themselves.

use std::collections::HashMap;

use crate::backend::{PlaybackState, StopMode};
use crate::config::AudioSettings;
use crate::engine::{AudioEngine, EventHandle};
use crate::error::AudioError;
use crate::foundation::math::Vec3;
use crate::foundation::time::FixedStep;
use crate::mixer::VolumeGroup;

/// Categories the director files named events under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCategory {
    /// Background music; at most one plays at a time
    Music,
    /// Short gameplay effects
    Sfx,
    /// Looping environmental beds
    Ambience,
}

impl SoundCategory {
    /// Mixer group this category routes through
    pub fn volume_group(self) -> VolumeGroup {
        match self {
            Self::Music => VolumeGroup::Music,
            Self::Sfx => VolumeGroup::Sfx,
            Self::Ambience => VolumeGroup::Ambience,
        }
    }
}

/// In-progress music fade-in, driven through the `Fade` event parameter
struct MusicFade {
    handle: EventHandle,
    elapsed: f32,
    duration: f32,
}

/// High-level audio director
pub struct AudioDirector {
    settings: AudioSettings,
    music: HashMap<String, EventHandle>,
    sfx: HashMap<String, EventHandle>,
    ambience: HashMap<String, EventHandle>,
    snapshots: HashMap<String, EventHandle>,
    one_shots: Vec<EventHandle>,
    current_music: Option<String>,
    music_fade: Option<MusicFade>,
    cleanup: FixedStep,
}

impl AudioDirector {
    /// Create a director using the given settings for bank discovery and
    /// pump rate
    pub fn new(settings: AudioSettings) -> Self {
        let cleanup = FixedStep::from_hz(settings.update_rate_hz);
        Self {
            settings,
            music: HashMap::new(),
            sfx: HashMap::new(),
            ambience: HashMap::new(),
            snapshots: HashMap::new(),
            one_shots: Vec::new(),
            current_music: None,
            music_fade: None,
            cleanup,
        }
    }

    /// Load every bank file found in the configured bank directory.
    /// Individual bank failures are logged and skipped; returns the number
    /// of banks loaded.
    pub fn load_banks(&mut self, engine: &mut AudioEngine) -> Result<usize, AudioError> {
        let mode = if self.settings.load_samples_immediately {
            crate::bank::LoadMode::Immediate
        } else {
            crate::bank::LoadMode::Deferred
        };

        let mut loaded = 0;
        for entry in std::fs::read_dir(&self.settings.bank_directory)? {
            let path = entry?.path();
            let is_bank = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.settings.bank_extension);
            if !is_bank {
                continue;
            }
            match engine.load_bank(&path, mode) {
                Ok(()) => loaded += 1,
                Err(e) => log::error!("Failed to load bank {}: {e}", path.display()),
            }
        }
        log::info!(
            "Loaded {loaded} bank(s) from {}",
            self.settings.bank_directory.display()
        );
        Ok(loaded)
    }

    /// Start a music event, replacing whatever is currently playing. With a
    /// fade duration the new track ramps its `Fade` parameter from silence
    /// to full over that many seconds.
    pub fn play_music(
        &mut self,
        engine: &mut AudioEngine,
        event_path: &str,
        fade_in: Option<f32>,
    ) -> Result<EventHandle, AudioError> {
        self.stop_music(engine, true);

        let handle = engine.create_event_instance(event_path)?;
        if let Some(duration) = fade_in.filter(|d| *d > 0.0) {
            engine.set_event_parameter(handle, "Fade", 0.0)?;
            self.music_fade = Some(MusicFade {
                handle,
                elapsed: 0.0,
                duration,
            });
        }
        engine.play_event(handle)?;

        self.music.insert(event_path.to_string(), handle);
        self.current_music = Some(event_path.to_string());
        log::info!("Playing music: {event_path}");
        Ok(handle)
    }

    /// Stop the current music, if any
    pub fn stop_music(&mut self, engine: &mut AudioEngine, allow_fade_out: bool) {
        self.music_fade = None;
        if let Some(name) = self.current_music.take() {
            if let Some(handle) = self.music.remove(&name) {
                let mode = if allow_fade_out {
                    StopMode::AllowFadeOut
                } else {
                    StopMode::Immediate
                };
                let _ = engine.stop_event(handle, mode);
            }
        }
    }

    /// Event path of the music currently playing
    pub fn current_music(&self) -> Option<&str> {
        self.current_music.as_deref()
    }

    /// Play a sound effect by event path, reusing the live instance for
    /// that path if one exists
    pub fn play_sfx(
        &mut self,
        engine: &mut AudioEngine,
        event_path: &str,
    ) -> Result<EventHandle, AudioError> {
        Self::play_categorized(&mut self.sfx, engine, event_path)
    }

    /// Play an ambience event by path; ambience events are typically
    /// authored as loops and keep playing until stopped or pruned
    pub fn play_ambience(
        &mut self,
        engine: &mut AudioEngine,
        event_path: &str,
    ) -> Result<EventHandle, AudioError> {
        Self::play_categorized(&mut self.ambience, engine, event_path)
    }

    fn play_categorized(
        map: &mut HashMap<String, EventHandle>,
        engine: &mut AudioEngine,
        event_path: &str,
    ) -> Result<EventHandle, AudioError> {
        if let Some(&handle) = map.get(event_path) {
            // Reuse only while the voice is actually live; a finished voice
            // is dead in the backend and replaying it would be silent
            let live = matches!(
                engine.event_playback_state(handle),
                Ok(PlaybackState::Playing | PlaybackState::Paused)
            );
            if live {
                engine.play_event(handle)?;
                return Ok(handle);
            }
            engine.release_event(handle);
        }
        let handle = engine.create_event_instance(event_path)?;
        engine.play_event(handle)?;
        map.insert(event_path.to_string(), handle);
        Ok(handle)
    }

    /// Start a mix snapshot by its authored path (`snapshot:/Underwater`),
    /// reusing a live instance for the same path
    pub fn start_snapshot(
        &mut self,
        engine: &mut AudioEngine,
        snapshot_path: &str,
    ) -> Result<EventHandle, AudioError> {
        Self::play_categorized(&mut self.snapshots, engine, snapshot_path)
    }

    /// Stop a running snapshot; stopping one that is not running is a no-op
    pub fn stop_snapshot(&mut self, engine: &mut AudioEngine, snapshot_path: &str) {
        if let Some(handle) = self.snapshots.remove(snapshot_path) {
            let _ = engine.stop_event(handle, StopMode::AllowFadeOut);
        }
    }

    /// Fire-and-forget playback: the director tracks the instance only to
    /// release it once it finishes
    pub fn play_one_shot(
        &mut self,
        engine: &mut AudioEngine,
        event_path: &str,
        position: Option<Vec3>,
    ) -> Result<(), AudioError> {
        let handle = engine.create_event_instance(event_path)?;
        if let Some(position) = position {
            engine.set_event_position(handle, position)?;
        }
        engine.play_event(handle)?;
        self.one_shots.push(handle);
        Ok(())
    }

    /// Advance the director: progress any music fade every frame, and at
    /// the configured fixed rate pump the engine and release instances that
    /// have finished playing.
    pub fn update(&mut self, engine: &mut AudioEngine, delta_time: f32) {
        if let Some(fade) = &mut self.music_fade {
            fade.elapsed += delta_time;
            let level = (fade.elapsed / fade.duration).min(1.0);
            let done = engine
                .set_event_parameter(fade.handle, "Fade", level)
                .is_err()
                || level >= 1.0;
            if done {
                self.music_fade = None;
            }
        }

        if self.cleanup.tick(delta_time) {
            engine.update();
            self.prune_finished(engine);
        }
    }

    fn prune_finished(&mut self, engine: &mut AudioEngine) {
        for map in [
            &mut self.music,
            &mut self.sfx,
            &mut self.ambience,
            &mut self.snapshots,
        ] {
            map.retain(|path, &mut handle| {
                let live = engine.has_event(handle) && engine.event_is_playing(handle);
                if !live {
                    log::trace!("Releasing finished event: {path}");
                    engine.release_event(handle);
                }
                live
            });
        }
        self.one_shots.retain(|&handle| {
            let live = engine.has_event(handle) && engine.event_is_playing(handle);
            if !live {
                engine.release_event(handle);
            }
            live
        });

        if let Some(name) = &self.current_music {
            if !self.music.contains_key(name) {
                self.current_music = None;
            }
        }
    }

    /// Set the volume of a category's mixer group
    pub fn set_category_volume(
        &mut self,
        engine: &mut AudioEngine,
        category: SoundCategory,
        volume: f32,
    ) {
        engine.set_group_volume(category.volume_group(), volume);
    }

    /// Set a group volume by middleware-style bus path (`bus:/Music`)
    pub fn set_bus_volume(
        &mut self,
        engine: &mut AudioEngine,
        bus_path: &str,
        volume: f32,
    ) -> Result<(), AudioError> {
        let group = VolumeGroup::from_bus_path(bus_path)
            .ok_or_else(|| AudioError::ResourceNotFound(bus_path.to_string()))?;
        engine.set_group_volume(group, volume);
        Ok(())
    }

    /// Set a group volume by middleware-style VCA path (`vca:/Music`)
    pub fn set_vca_volume(
        &mut self,
        engine: &mut AudioEngine,
        vca_path: &str,
        volume: f32,
    ) -> Result<(), AudioError> {
        let group = VolumeGroup::from_vca_path(vca_path)
            .ok_or_else(|| AudioError::ResourceNotFound(vca_path.to_string()))?;
        engine.set_group_volume(group, volume);
        Ok(())
    }

    /// Number of event instances the director is tracking
    pub fn tracked_event_count(&self) -> usize {
        self.music.len()
            + self.sfx.len()
            + self.ambience.len()
            + self.snapshots.len()
            + self.one_shots.len()
    }
}
