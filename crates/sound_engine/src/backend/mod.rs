//! Audio backend implementations
//!
//! Platform-independent abstraction over the playback middleware. Everything
//! below this trait — decoding, mixing, attenuation, device output — belongs
//! to the middleware and is out of scope for the facade.
//!
//! # Threading
//! Not `Send + Sync`: the facade is single-threaded and all calls execute on
//! the caller's thread. The middleware may run its own output thread
//! internally; that is not observable here.

pub mod rodio_backend;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;
use std::path::Path;

use crate::bank::{BankState, LoadMode};
use crate::error::AudioError;
use crate::foundation::math::Vec3;
use crate::mixer::VolumeGroup;
use crate::spatial::ListenerPose;

/// Raw identifier for a bank loaded into the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BankId(pub(crate) u32);

/// Raw identifier for an active backend voice
///
/// Voice ids are backend-internal; the facade wraps them in generational
/// handles so stale references are detectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub(crate) u32);

/// How a voice is stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Cut playback instantly
    Immediate,
    /// Let the middleware ramp the voice out briefly before releasing it
    AllowFadeOut,
}

/// Playback state reported for a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// The voice is audible (started and not finished)
    Playing,
    /// The voice is paused
    Paused,
    /// The voice finished, was stopped, or never started
    Stopped,
}

/// Initial parameters for a raw sample voice
#[derive(Debug, Clone)]
pub struct VoiceParams {
    /// Loop until explicitly stopped
    pub looping: bool,
    /// Position the voice in 3D space relative to the listener
    pub spatial: bool,
    /// Initial volume (0.0 to 1.0)
    pub volume: f32,
    /// Initial pitch multiplier
    pub pitch: f32,
    /// Initial stereo pan (-1.0 left to 1.0 right), ignored for spatial voices
    pub pan: f32,
    /// Initial world position for spatial voices
    pub position: Option<Vec3>,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            looping: false,
            spatial: false,
            volume: 1.0,
            pitch: 1.0,
            pan: 0.0,
            position: None,
        }
    }
}

/// Result of instantiating an event: the voice plus the authoring metadata
/// the facade needs for routing and parameter readback
#[derive(Debug, Clone)]
pub struct CreatedEvent {
    /// Backend voice driving the instance
    pub voice: VoiceId,
    /// Mixer group the event routes through
    pub group: VolumeGroup,
    /// Authoring-time base volume
    pub base_volume: f32,
    /// Whether the event is positioned in 3D
    pub spatial: bool,
    /// Authoring-time parameter defaults
    pub parameters: HashMap<String, f32>,
}

/// Configuration for an audio backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Sample rate hint (e.g. 44100, 48000)
    pub sample_rate: u32,
    /// Output channel count hint (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size hint for audio processing
    pub buffer_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
        }
    }
}

/// Audio backend trait: the middleware boundary
pub trait AudioBackend {
    /// Initialize the backend; idempotent
    fn initialize(&mut self, config: &BackendConfig) -> Result<(), AudioError>;

    /// Shut the backend down, stopping all voices and unloading all banks
    fn shutdown(&mut self);

    /// Check if the backend is initialized
    fn is_initialized(&self) -> bool;

    /// Pump the middleware once: advance deferred bank loads, progress
    /// fade-outs, reap finished voices
    fn update(&mut self);

    /// Load a bank file; `Deferred` banks report [`BankState::Pending`]
    /// until `update` finishes reading their sample data
    fn load_bank(&mut self, path: &Path, mode: LoadMode) -> Result<BankId, AudioError>;

    /// Query the load state of a bank
    fn bank_state(&self, bank: BankId) -> Result<BankState, AudioError>;

    /// Unload a bank; its events become unresolvable
    fn unload_bank(&mut self, bank: BankId) -> Result<(), AudioError>;

    /// Resolve a logical event path and create a paused voice for it
    fn create_event(&mut self, event_path: &str) -> Result<CreatedEvent, AudioError>;

    /// Start a voice playing encoded sample data
    fn play_sample(&mut self, data: &[u8], params: &VoiceParams) -> Result<VoiceId, AudioError>;

    /// Start (or restart after creation) a paused voice
    fn start(&mut self, voice: VoiceId) -> Result<(), AudioError>;

    /// Stop a voice and release it; idempotent for already-released voices
    fn stop(&mut self, voice: VoiceId, mode: StopMode) -> Result<(), AudioError>;

    /// Set voice volume (0.0 to 1.0)
    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> Result<(), AudioError>;

    /// Set voice pitch multiplier
    fn set_pitch(&mut self, voice: VoiceId, pitch: f32) -> Result<(), AudioError>;

    /// Set stereo pan (-1.0 to 1.0) on a non-spatial voice
    fn set_pan(&mut self, voice: VoiceId, pan: f32) -> Result<(), AudioError>;

    /// Move a spatial voice in world space
    fn set_position(&mut self, voice: VoiceId, position: Vec3) -> Result<(), AudioError>;

    /// Report the playback state of a voice; unknown voices are `Stopped`
    fn playback_state(&self, voice: VoiceId) -> PlaybackState;

    /// Push the global listener pose
    fn set_listener(&mut self, pose: &ListenerPose);

    /// Pause or resume every started voice (master channel-group pause)
    fn set_all_paused(&mut self, paused: bool);

    /// Stop and release every voice
    fn stop_all(&mut self);

    /// Number of voices currently playing
    fn playing_count(&self) -> usize;
}

/// Create the default audio backend for the platform, not yet initialized
pub fn create_backend() -> Box<dyn AudioBackend> {
    Box::new(rodio_backend::RodioBackend::new())
}
