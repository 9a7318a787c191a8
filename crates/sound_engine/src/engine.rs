//! Audio engine facade
//!
//! Owns the backend, the loaded banks, and all live event and sound
//! instances. Every instance is addressed through a generational handle, so
//! a handle held past its instance's release simply stops resolving instead
//! of touching a recycled slot.
//!
//! The facade is an explicit object: construct one, initialize it, pass it
//! where it is needed. Nothing here is global.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use slotmap::SlotMap;

use crate::asset::AudioAsset;
use crate::backend::{
    create_backend, AudioBackend, BackendConfig, BankId, PlaybackState, StopMode, VoiceId,
    VoiceParams,
};
use crate::bank::{BankState, LoadMode};
use crate::config::AudioSettings;
use crate::error::AudioError;
use crate::foundation::math::Vec3;
use crate::mixer::{Mixer, VolumeGroup};
use crate::spatial::ListenerPose;

slotmap::new_key_type! {
    /// Generational handle to a live event instance
    pub struct EventHandle;

    /// Generational handle to a loaded raw sound
    pub struct SoundHandle;
}

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed but not yet initialized; operations fail cleanly
    Uninitialized,
    /// Ready for use
    Initialized,
    /// Tearing down; transient, observable only mid-shutdown
    ShuttingDown,
}

/// A live instance of a bank-authored event
struct EventInstance {
    path: String,
    voice: VoiceId,
    group: VolumeGroup,
    base_volume: f32,
    spatial: bool,
    is_playing: bool,
    position: Vec3,
    parameters: HashMap<String, f32>,
}

/// A raw sound loaded directly from a sample file
struct SoundInstance {
    asset: AudioAsset,
    looping: bool,
    spatial: bool,
    volume: f32,
    pitch: f32,
    pan: f32,
    position: Option<Vec3>,
    voice: Option<VoiceId>,
}

/// The audio engine facade
pub struct AudioEngine {
    state: LifecycleState,
    backend: Box<dyn AudioBackend>,
    banks: HashMap<PathBuf, BankId>,
    events: SlotMap<EventHandle, EventInstance>,
    sounds: SlotMap<SoundHandle, SoundInstance>,
    mixer: Mixer,
    listener: ListenerPose,
    global_parameters: HashMap<String, f32>,
    all_paused: bool,
    live_update_connected: bool,
}

impl AudioEngine {
    /// Create an engine over the platform's default backend
    pub fn new() -> Self {
        Self::with_backend(create_backend())
    }

    /// Create an engine over a caller-supplied backend
    pub fn with_backend(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            backend,
            banks: HashMap::new(),
            events: SlotMap::with_key(),
            sounds: SlotMap::with_key(),
            mixer: Mixer::new(),
            listener: ListenerPose::default(),
            global_parameters: HashMap::new(),
            all_paused: false,
            live_update_connected: false,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Initialize the engine; calling again while initialized is a no-op
    pub fn initialize(&mut self, settings: &AudioSettings) -> Result<(), AudioError> {
        if self.state == LifecycleState::Initialized {
            log::warn!("Audio engine already initialized");
            return Ok(());
        }

        let config = BackendConfig {
            sample_rate: settings.sample_rate,
            channels: settings.channels,
            ..Default::default()
        };
        self.backend.initialize(&config)?;
        self.mixer
            .set_volume(VolumeGroup::Master, settings.master_volume);
        self.state = LifecycleState::Initialized;
        log::info!(
            "Audio engine initialized ({} Hz, {} channels)",
            settings.sample_rate,
            settings.channels
        );
        Ok(())
    }

    /// Tear everything down: stop voices, release instances, unload banks.
    /// Safe to call repeatedly or before initialization.
    pub fn shutdown(&mut self) {
        if self.state != LifecycleState::Initialized {
            return;
        }
        self.state = LifecycleState::ShuttingDown;

        for (_, event) in self.events.drain() {
            let _ = self.backend.stop(event.voice, StopMode::Immediate);
        }
        for (_, sound) in self.sounds.drain() {
            if let Some(voice) = sound.voice {
                let _ = self.backend.stop(voice, StopMode::Immediate);
            }
        }
        self.backend.stop_all();
        for (_, bank) in self.banks.drain() {
            let _ = self.backend.unload_bank(bank);
        }
        self.backend.shutdown();

        self.global_parameters.clear();
        self.all_paused = false;
        self.live_update_connected = false;
        self.state = LifecycleState::Uninitialized;
        log::info!("Audio engine shut down");
    }

    /// Pump the backend and refresh instance playback state. Call once per
    /// frame (or let a director drive it at a fixed rate).
    pub fn update(&mut self) {
        if self.state != LifecycleState::Initialized {
            return;
        }
        self.backend.update();
        for event in self.events.values_mut() {
            event.is_playing = self.backend.playback_state(event.voice) != PlaybackState::Stopped;
        }
    }

    fn ensure_initialized(&self) -> Result<(), AudioError> {
        if self.state == LifecycleState::Initialized {
            Ok(())
        } else {
            Err(AudioError::NotInitialized)
        }
    }

    // --- Banks ---

    /// Load a bank file. Reloading an already-loaded path is a no-op.
    pub fn load_bank<P: AsRef<Path>>(&mut self, path: P, mode: LoadMode) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        if self.banks.contains_key(path) {
            log::debug!("Bank already loaded: {}", path.display());
            return Ok(());
        }
        let id = self.backend.load_bank(path, mode)?;
        self.banks.insert(path.to_path_buf(), id);
        log::info!("Loaded bank: {} ({:?})", path.display(), mode);
        Ok(())
    }

    /// Query the load state of a bank, `None` if the path was never loaded
    pub fn bank_state<P: AsRef<Path>>(&self, path: P) -> Option<BankState> {
        let id = self.banks.get(path.as_ref())?;
        self.backend.bank_state(*id).ok()
    }

    /// Unload a bank; unloading a path that is not loaded is a no-op
    pub fn unload_bank<P: AsRef<Path>>(&mut self, path: P) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let path = path.as_ref();
        if let Some(id) = self.banks.remove(path) {
            self.backend.unload_bank(id)?;
            log::info!("Unloaded bank: {}", path.display());
        }
        Ok(())
    }

    /// Number of loaded banks
    pub fn loaded_bank_count(&self) -> usize {
        self.banks.len()
    }

    // --- Events ---

    /// Instantiate a bank-authored event. The instance starts silent; call
    /// [`play_event`](Self::play_event) to start it.
    pub fn create_event_instance(&mut self, event_path: &str) -> Result<EventHandle, AudioError> {
        self.ensure_initialized()?;
        let created = self.backend.create_event(event_path)?;
        let handle = self.events.insert(EventInstance {
            path: event_path.to_string(),
            voice: created.voice,
            group: created.group,
            base_volume: created.base_volume,
            spatial: created.spatial,
            is_playing: false,
            position: Vec3::zeros(),
            parameters: created.parameters,
        });
        // Route through the mixer before anything is audible
        let volume = self.effective_event_volume(handle);
        let _ = self.backend.set_volume(created.voice, volume);
        Ok(handle)
    }

    /// Start an event instance
    pub fn play_event(&mut self, handle: EventHandle) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let event = self.events.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        self.backend.start(event.voice)?;
        event.is_playing = true;
        Ok(())
    }

    /// Stop an event instance and release it. The handle is dead afterwards;
    /// create a new instance to play the event again.
    pub fn stop_event(&mut self, handle: EventHandle, mode: StopMode) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let event = self.events.remove(handle).ok_or(AudioError::InvalidHandle)?;
        self.backend.stop(event.voice, mode)?;
        log::debug!("Stopped event: {}", event.path);
        Ok(())
    }

    /// Release an event instance without error, stopping its voice if it is
    /// still live. Releasing a stale handle is a no-op.
    pub fn release_event(&mut self, handle: EventHandle) {
        if let Some(event) = self.events.remove(handle) {
            let _ = self.backend.stop(event.voice, StopMode::Immediate);
        }
    }

    /// Whether a handle still refers to a live instance
    pub fn has_event(&self, handle: EventHandle) -> bool {
        self.events.contains_key(handle)
    }

    /// Whether an event instance is currently playing, per the last `update`
    pub fn event_is_playing(&self, handle: EventHandle) -> bool {
        self.events.get(handle).is_some_and(|e| e.is_playing)
    }

    /// Live playback state of an event's voice, straight from the backend
    /// (unlike [`event_is_playing`](Self::event_is_playing), which reads the
    /// cache refreshed by `update`)
    pub fn event_playback_state(
        &self,
        handle: EventHandle,
    ) -> Result<PlaybackState, AudioError> {
        let event = self.events.get(handle).ok_or(AudioError::InvalidHandle)?;
        Ok(self.backend.playback_state(event.voice))
    }

    /// Set a named event parameter. Names the engine maps to voice controls
    /// (`Volume`, `Fade`, `Pitch`, `Pan`) take effect immediately; anything
    /// else is cached for readback, matching middleware behavior of
    /// accepting unvalidated parameter names.
    pub fn set_event_parameter(
        &mut self,
        handle: EventHandle,
        name: &str,
        value: f32,
    ) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let event = self.events.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        event.parameters.insert(name.to_string(), value);
        let voice = event.voice;
        match name {
            "Volume" | "Fade" => {
                let volume = mixed_event_volume(&self.mixer, event);
                self.backend.set_volume(voice, volume)?;
            }
            "Pitch" => self.backend.set_pitch(voice, value)?,
            "Pan" => {
                if !event.spatial {
                    self.backend.set_pan(voice, value)?;
                }
            }
            _ => log::trace!("Cached unmapped event parameter: {name} = {value}"),
        }
        Ok(())
    }

    /// Read back a parameter value; unset names read as 0.0
    pub fn get_event_parameter(&self, handle: EventHandle, name: &str) -> Result<f32, AudioError> {
        self.ensure_initialized()?;
        let event = self.events.get(handle).ok_or(AudioError::InvalidHandle)?;
        Ok(event.parameters.get(name).copied().unwrap_or(0.0))
    }

    /// Move a spatial event instance in world space
    pub fn set_event_position(
        &mut self,
        handle: EventHandle,
        position: Vec3,
    ) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let event = self.events.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        event.position = position;
        if event.spatial {
            self.backend.set_position(event.voice, position)?;
        } else {
            log::debug!("Position set on non-spatial event: {}", event.path);
        }
        Ok(())
    }

    /// Number of live event instances
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of event instances playing as of the last `update`
    pub fn playing_event_count(&self) -> usize {
        self.events.values().filter(|e| e.is_playing).count()
    }

    // --- Raw sounds ---

    /// Load a sample file into memory for direct playback, outside any bank
    pub fn load_sound<P: AsRef<Path>>(
        &mut self,
        path: P,
        looping: bool,
        spatial: bool,
    ) -> Result<SoundHandle, AudioError> {
        self.ensure_initialized()?;
        let asset = AudioAsset::from_file(path.as_ref())?;
        Ok(self.sounds.insert(SoundInstance {
            asset,
            looping,
            spatial,
            volume: 1.0,
            pitch: 1.0,
            pan: 0.0,
            position: None,
            voice: None,
        }))
    }

    /// Play a loaded sound, restarting it from the beginning if it is
    /// already playing. Raw sounds route through the SFX group.
    pub fn play_sound(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        if let Some(voice) = sound.voice.take() {
            let _ = self.backend.stop(voice, StopMode::Immediate);
        }
        let params = VoiceParams {
            looping: sound.looping,
            spatial: sound.spatial,
            volume: self.mixer.effective_volume(VolumeGroup::Sfx) * sound.volume,
            pitch: sound.pitch,
            pan: sound.pan,
            position: sound.position,
        };
        let voice = self.backend.play_sample(sound.asset.data(), &params)?;
        sound.voice = Some(voice);
        Ok(())
    }

    /// Stop a playing sound; the sound stays loaded and can be replayed
    pub fn stop_sound(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        if let Some(voice) = sound.voice.take() {
            self.backend.stop(voice, StopMode::Immediate)?;
        }
        Ok(())
    }

    /// Set per-sound volume (scaled by the SFX and master groups)
    pub fn set_sound_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        sound.volume = volume.clamp(0.0, 1.0);
        if let Some(voice) = sound.voice {
            let effective = self.mixer.effective_volume(VolumeGroup::Sfx) * sound.volume;
            self.backend.set_volume(voice, effective)?;
        }
        Ok(())
    }

    /// Set per-sound pitch multiplier
    pub fn set_sound_pitch(&mut self, handle: SoundHandle, pitch: f32) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        sound.pitch = pitch;
        if let Some(voice) = sound.voice {
            self.backend.set_pitch(voice, pitch)?;
        }
        Ok(())
    }

    /// Set stereo pan; only audible for non-spatial sounds, but always
    /// cached so the value survives a replay
    pub fn set_sound_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        sound.pan = pan.clamp(-1.0, 1.0);
        if !sound.spatial {
            if let Some(voice) = sound.voice {
                self.backend.set_pan(voice, sound.pan)?;
            }
        }
        Ok(())
    }

    /// Move a spatial sound in world space
    pub fn set_sound_position(
        &mut self,
        handle: SoundHandle,
        position: Vec3,
    ) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.get_mut(handle).ok_or(AudioError::InvalidHandle)?;
        sound.position = Some(position);
        if let Some(voice) = sound.voice {
            if sound.spatial {
                self.backend.set_position(voice, position)?;
            }
        }
        Ok(())
    }

    /// Unload a sound, stopping it if it is playing
    pub fn unload_sound(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        let sound = self.sounds.remove(handle).ok_or(AudioError::InvalidHandle)?;
        if let Some(voice) = sound.voice {
            let _ = self.backend.stop(voice, StopMode::Immediate);
        }
        Ok(())
    }

    /// Number of loaded sounds
    pub fn loaded_sound_count(&self) -> usize {
        self.sounds.len()
    }

    // --- Mixer ---

    /// Set the master volume (0.0 to 1.0)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.mixer.set_volume(VolumeGroup::Master, volume);
        self.refresh_voice_volumes();
    }

    /// Get the master volume
    pub fn master_volume(&self) -> f32 {
        self.mixer.volume(VolumeGroup::Master)
    }

    /// Set the volume of a mixer group
    pub fn set_group_volume(&mut self, group: VolumeGroup, volume: f32) {
        self.mixer.set_volume(group, volume);
        self.refresh_voice_volumes();
    }

    /// Get the configured volume of a mixer group
    pub fn group_volume(&self, group: VolumeGroup) -> f32 {
        self.mixer.volume(group)
    }

    /// Mute a mixer group
    pub fn mute_group(&mut self, group: VolumeGroup) {
        self.mixer.mute(group);
        self.refresh_voice_volumes();
    }

    /// Unmute a mixer group
    pub fn unmute_group(&mut self, group: VolumeGroup) {
        self.mixer.unmute(group);
        self.refresh_voice_volumes();
    }

    /// Whether a mixer group is muted
    pub fn is_group_muted(&self, group: VolumeGroup) -> bool {
        self.mixer.is_muted(group)
    }

    /// Pause or resume everything at once (for app focus loss or a pause
    /// menu). Playback positions are preserved.
    pub fn set_all_paused(&mut self, paused: bool) {
        if self.state != LifecycleState::Initialized {
            return;
        }
        self.all_paused = paused;
        self.backend.set_all_paused(paused);
    }

    /// Whether global pause is active
    pub fn is_all_paused(&self) -> bool {
        self.all_paused
    }

    fn effective_event_volume(&self, handle: EventHandle) -> f32 {
        self.events
            .get(handle)
            .map_or(0.0, |e| mixed_event_volume(&self.mixer, e))
    }

    fn refresh_voice_volumes(&mut self) {
        // Stale voices answer with InvalidHandle; nothing to do about it here
        for event in self.events.values() {
            let volume = mixed_event_volume(&self.mixer, event);
            let _ = self.backend.set_volume(event.voice, volume);
        }
        for sound in self.sounds.values() {
            if let Some(voice) = sound.voice {
                let effective = self.mixer.effective_volume(VolumeGroup::Sfx) * sound.volume;
                let _ = self.backend.set_volume(voice, effective);
            }
        }
    }

    // --- Listener ---

    /// Update the global 3D listener pose
    pub fn set_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        if self.state != LifecycleState::Initialized {
            return;
        }
        self.listener = ListenerPose::new(position, forward, up);
        self.backend.set_listener(&self.listener);
    }

    /// Current listener pose
    pub fn listener(&self) -> &ListenerPose {
        &self.listener
    }

    // --- Global parameters ---

    /// Set a named parameter that is not tied to any instance. Names are
    /// forwarded unvalidated, like event parameters; the engine caches them
    /// for readback.
    pub fn set_global_parameter(&mut self, name: &str, value: f32) -> Result<(), AudioError> {
        self.ensure_initialized()?;
        self.global_parameters.insert(name.to_string(), value);
        log::trace!("Global parameter: {name} = {value}");
        Ok(())
    }

    /// Read back a global parameter; unset names read as 0.0
    pub fn global_parameter(&self, name: &str) -> f32 {
        self.global_parameters.get(name).copied().unwrap_or(0.0)
    }

    // --- Live update ---

    /// Attempt to connect an authoring-tool live-update session. The rodio
    /// backend has no authoring protocol, so this always reports failure.
    pub fn connect_live_update(&mut self, host: &str, port: u16) -> bool {
        log::warn!("Live update not supported by this backend ({host}:{port})");
        self.live_update_connected = false;
        false
    }

    /// Drop the live-update session, if one was ever established
    pub fn disconnect_live_update(&mut self) {
        if self.live_update_connected {
            log::info!("Live update disconnected");
        }
        self.live_update_connected = false;
    }

    /// Whether a live-update session is connected
    pub fn is_live_update_connected(&self) -> bool {
        self.live_update_connected
    }

    // --- Diagnostics ---

    /// Number of voices the backend reports as playing
    pub fn playing_voice_count(&self) -> usize {
        self.backend.playing_count()
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn mixed_event_volume(mixer: &Mixer, event: &EventInstance) -> f32 {
    let volume = event.parameters.get("Volume").copied().unwrap_or(1.0);
    let fade = event.parameters.get("Fade").copied().unwrap_or(1.0);
    mixer.effective_volume(event.group) * event.base_volume * volume * fade
}
