//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback. Rodio is pure
//! Rust and supports WAV, OGG Vorbis, MP3, and FLAC formats; it owns the
//! output stream, the mixer, and decoding — this file only forwards into it.
//!
//! Bank files are RON manifests (see [`crate::bank`]) whose sample files are
//! read into memory either synchronously (`LoadMode::Immediate`) or a few
//! files per `update` call (`LoadMode::Deferred`).
//!
//! Every voice is a [`rodio::SpatialSink`]. Non-spatial voices keep a fixed
//! pair of virtual ears and place their emitter on a unit arc in front of
//! them, which turns stereo pan into a pure left/right balance. Spatial
//! voices use the listener's world-space ears, so distance attenuation comes
//! from the middleware.

use super::{
    AudioBackend, BackendConfig, BankId, CreatedEvent, PlaybackState, StopMode, VoiceId,
    VoiceParams,
};
use crate::bank::{BankManifest, BankState, LoadMode};
use crate::error::AudioError;
use crate::foundation::math::Vec3;
use crate::spatial::{ListenerPose, EAR_SPACING};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Source, SpatialSink};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Duration of the ramp applied by `StopMode::AllowFadeOut`
const FADE_OUT_DURATION: Duration = Duration::from_millis(250);

/// Sample files read per `update` call while a deferred bank is pending
const DEFERRED_READS_PER_UPDATE: usize = 4;

/// Where a voice sits relative to the listener
enum Placement {
    /// Screen-space voice; pan maps to left/right balance
    Flat {
        /// Stereo pan, -1.0 (left) to 1.0 (right)
        pan: f32,
    },
    /// World-space voice attenuated by the middleware
    Positioned {
        /// Emitter position in world space
        position: Vec3,
    },
}

/// Fade-out in progress for a stopping voice
struct FadeOut {
    started_at: Instant,
    initial_volume: f32,
}

struct Voice {
    sink: SpatialSink,
    placement: Placement,
    /// Volume requested by the facade, before any fade ramp
    volume: f32,
    /// Set once `start` has been called; unstarted voices report `Stopped`
    started: bool,
    fade: Option<FadeOut>,
}

struct LoadedBank {
    path: PathBuf,
    base_dir: PathBuf,
    manifest: BankManifest,
    /// Sample bytes keyed by the manifest-relative file path
    samples: HashMap<PathBuf, Arc<[u8]>>,
    /// Files still to read (deferred loads only)
    pending: Vec<PathBuf>,
    state: BankState,
}

impl LoadedBank {
    /// Read up to `budget` pending sample files; returns the number read.
    /// A read failure moves the bank to `Failed` and abandons the rest.
    fn poll(&mut self, budget: usize) -> usize {
        let mut read = 0;
        while read < budget {
            let Some(file) = self.pending.pop() else { break };
            let full_path = self.base_dir.join(&file);
            match std::fs::read(&full_path) {
                Ok(bytes) => {
                    self.samples.insert(file, Arc::from(bytes.into_boxed_slice()));
                    read += 1;
                }
                Err(e) => {
                    let reason = format!("{}: {}", full_path.display(), e);
                    log::error!("bank {} failed to load: {}", self.path.display(), reason);
                    self.state = BankState::Failed(reason);
                    self.pending.clear();
                    return read;
                }
            }
        }
        if self.pending.is_empty() && self.state == BankState::Pending {
            self.state = BankState::Ready;
            log::info!("bank ready: {}", self.path.display());
        }
        read
    }
}

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    voices: HashMap<VoiceId, Voice>,
    banks: HashMap<BankId, LoadedBank>,
    listener: ListenerPose,
    next_voice_id: u32,
    next_bank_id: u32,
    initialized: bool,
    all_paused: bool,
}

/// Emitter position for a flat voice: a point on the unit arc in front of
/// the fixed ears, so pan never collapses onto an ear
fn flat_emitter(pan: f32) -> [f32; 3] {
    let p = pan.clamp(-1.0, 1.0);
    [p, 0.0, -(1.0 - p * p).sqrt()]
}

/// Fixed ear positions used by flat voices
fn flat_ears() -> ([f32; 3], [f32; 3]) {
    let half = EAR_SPACING * 0.5;
    ([-half, 0.0, 0.0], [half, 0.0, 0.0])
}

impl RodioBackend {
    /// Create a new Rodio backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            voices: HashMap::new(),
            banks: HashMap::new(),
            listener: ListenerPose::default(),
            next_voice_id: 0,
            next_bank_id: 0,
            initialized: false,
            all_paused: false,
        }
    }

    fn next_voice_id(&mut self) -> VoiceId {
        let id = self.next_voice_id;
        self.next_voice_id = self.next_voice_id.wrapping_add(1);
        VoiceId(id)
    }

    fn next_bank_id(&mut self) -> BankId {
        let id = self.next_bank_id;
        self.next_bank_id = self.next_bank_id.wrapping_add(1);
        BankId(id)
    }

    fn stream_handle(&self) -> Result<&OutputStreamHandle, AudioError> {
        self.stream_handle
            .as_ref()
            .ok_or(AudioError::NotInitialized)
    }

    /// Create a paused sink for the given placement
    fn new_sink(&self, placement: &Placement) -> Result<SpatialSink, AudioError> {
        let handle = self.stream_handle()?;
        let (emitter, left, right) = match placement {
            Placement::Flat { pan } => {
                let (l, r) = flat_ears();
                (flat_emitter(*pan), l, r)
            }
            Placement::Positioned { position } => {
                let (l, r) = self.listener.ear_positions();
                ((*position).into(), l.into(), r.into())
            }
        };
        let sink = SpatialSink::try_new(handle, emitter, left, right)
            .map_err(|e| AudioError::Backend(format!("failed to create sink: {}", e)))?;
        sink.pause();
        Ok(sink)
    }

    /// Decode sample bytes and append them to a sink
    fn append_source(
        sink: &SpatialSink,
        bytes: Arc<[u8]>,
        looping: bool,
    ) -> Result<(), AudioError> {
        let source = Decoder::new(Cursor::new(bytes))
            .map_err(|e| AudioError::InvalidData(format!("failed to decode audio: {}", e)))?;
        if looping {
            sink.append(source.repeat_infinite());
        } else {
            sink.append(source);
        }
        Ok(())
    }

    fn spawn_voice(&mut self, voice: Voice) -> VoiceId {
        let id = self.next_voice_id();
        self.voices.insert(id, voice);
        id
    }

    /// Log which events actually exist, as an aid when a lookup fails
    fn log_known_events(&self) {
        if log::log_enabled!(log::Level::Debug) {
            for bank in self.banks.values() {
                log::debug!(
                    "bank {:?} ({}) state {:?}:",
                    bank.manifest.name,
                    bank.path.display(),
                    bank.state
                );
                for event in &bank.manifest.events {
                    log::debug!("  {}", event.path);
                }
            }
        }
    }
}

impl AudioBackend for RodioBackend {
    fn initialize(&mut self, _config: &BackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::Backend(format!("failed to open audio output: {}", e)))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.initialized = true;

        log::info!("rodio audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.stop_all();
        self.banks.clear();
        self.stream_handle = None;
        self._output_stream = None;
        self.all_paused = false;
        self.initialized = false;

        log::info!("rodio audio backend shut down");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {
        // Advance deferred bank loads within a per-update read budget
        let mut budget = DEFERRED_READS_PER_UPDATE;
        for bank in self.banks.values_mut() {
            if budget == 0 {
                break;
            }
            if bank.state == BankState::Pending {
                budget = budget.saturating_sub(bank.poll(budget).max(1));
            }
        }

        // Progress fade-outs
        let now = Instant::now();
        let mut faded_out = Vec::new();
        for (id, voice) in &mut self.voices {
            if let Some(fade) = &voice.fade {
                let t = now.duration_since(fade.started_at).as_secs_f32()
                    / FADE_OUT_DURATION.as_secs_f32();
                if t >= 1.0 {
                    voice.sink.stop();
                    faded_out.push(*id);
                } else {
                    voice.sink.set_volume(fade.initial_volume * (1.0 - t));
                }
            }
        }
        for id in faded_out {
            self.voices.remove(&id);
        }

        // Reap voices whose sources ran dry
        self.voices
            .retain(|_, voice| !voice.started || !voice.sink.empty());
    }

    fn load_bank(&mut self, path: &Path, mode: LoadMode) -> Result<BankId, AudioError> {
        if !self.initialized {
            return Err(AudioError::NotInitialized);
        }

        let manifest = BankManifest::from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

        let mut files: Vec<PathBuf> = manifest.events.iter().map(|e| e.file.clone()).collect();
        files.sort();
        files.dedup();

        let mut bank = LoadedBank {
            path: path.to_path_buf(),
            base_dir,
            manifest,
            samples: HashMap::new(),
            pending: files,
            state: BankState::Pending,
        };

        match mode {
            LoadMode::Immediate => {
                bank.poll(usize::MAX);
                if let BankState::Failed(reason) = &bank.state {
                    return Err(AudioError::BankLoad {
                        path: path.display().to_string(),
                        reason: reason.clone(),
                    });
                }
            }
            LoadMode::Deferred => {
                if bank.pending.is_empty() {
                    bank.state = BankState::Ready;
                } else {
                    log::info!("bank loading samples asynchronously: {}", path.display());
                }
            }
        }

        let id = self.next_bank_id();
        self.banks.insert(id, bank);
        Ok(id)
    }

    fn bank_state(&self, bank: BankId) -> Result<BankState, AudioError> {
        self.banks
            .get(&bank)
            .map(|b| b.state.clone())
            .ok_or(AudioError::InvalidHandle)
    }

    fn unload_bank(&mut self, bank: BankId) -> Result<(), AudioError> {
        if let Some(bank) = self.banks.remove(&bank) {
            log::info!("unloaded bank: {}", bank.path.display());
        }
        Ok(())
    }

    fn create_event(&mut self, event_path: &str) -> Result<CreatedEvent, AudioError> {
        if !self.initialized {
            return Err(AudioError::NotInitialized);
        }

        // Events are only resolvable once their bank finished loading
        let found = self.banks.values().find_map(|bank| {
            if bank.state != BankState::Ready {
                return None;
            }
            bank.manifest.find_event(event_path).and_then(|def| {
                let bytes = bank.samples.get(&def.file)?;
                Some((def.clone(), Arc::clone(bytes)))
            })
        });

        let Some((def, bytes)) = found else {
            log::warn!("event not found in any loaded bank: {}", event_path);
            self.log_known_events();
            return Err(AudioError::ResourceNotFound(event_path.to_string()));
        };

        let placement = if def.spatial {
            Placement::Positioned {
                position: Vec3::zeros(),
            }
        } else {
            Placement::Flat { pan: 0.0 }
        };

        let sink = self.new_sink(&placement)?;
        Self::append_source(&sink, bytes, def.looping)?;
        sink.set_volume(def.volume);
        sink.set_speed(def.pitch);

        let voice = self.spawn_voice(Voice {
            sink,
            placement,
            volume: def.volume,
            started: false,
            fade: None,
        });

        Ok(CreatedEvent {
            voice,
            group: def.group,
            base_volume: def.volume,
            spatial: def.spatial,
            parameters: def.parameters,
        })
    }

    fn play_sample(&mut self, data: &[u8], params: &VoiceParams) -> Result<VoiceId, AudioError> {
        if !self.initialized {
            return Err(AudioError::NotInitialized);
        }

        let placement = if params.spatial {
            Placement::Positioned {
                position: params.position.unwrap_or_else(Vec3::zeros),
            }
        } else {
            Placement::Flat { pan: params.pan }
        };

        let sink = self.new_sink(&placement)?;
        Self::append_source(&sink, Arc::from(data.to_vec().into_boxed_slice()), params.looping)?;
        sink.set_volume(params.volume);
        sink.set_speed(params.pitch);
        if !self.all_paused {
            sink.play();
        }

        Ok(self.spawn_voice(Voice {
            sink,
            placement,
            volume: params.volume,
            started: true,
            fade: None,
        }))
    }

    fn start(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let voice = self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        voice.started = true;
        if !self.all_paused {
            voice.sink.play();
        }
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId, mode: StopMode) -> Result<(), AudioError> {
        match mode {
            StopMode::Immediate => {
                if let Some(voice) = self.voices.remove(&voice) {
                    voice.sink.stop();
                }
            }
            StopMode::AllowFadeOut => {
                if let Some(entry) = self.voices.get_mut(&voice) {
                    if entry.started && entry.fade.is_none() {
                        entry.fade = Some(FadeOut {
                            started_at: Instant::now(),
                            initial_volume: entry.volume,
                        });
                    } else if !entry.started {
                        // Nothing audible to ramp; release immediately
                        self.voices.remove(&voice);
                    }
                }
            }
        }
        Ok(())
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> Result<(), AudioError> {
        let voice = self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        voice.volume = volume;
        if voice.fade.is_none() {
            voice.sink.set_volume(volume);
        }
        Ok(())
    }

    fn set_pitch(&mut self, voice: VoiceId, pitch: f32) -> Result<(), AudioError> {
        let voice = self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        voice.sink.set_speed(pitch);
        Ok(())
    }

    fn set_pan(&mut self, voice: VoiceId, pan: f32) -> Result<(), AudioError> {
        let voice = self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        match &mut voice.placement {
            Placement::Flat { pan: stored } => {
                *stored = pan;
                voice.sink.set_emitter_position(flat_emitter(pan));
                Ok(())
            }
            Placement::Positioned { .. } => Err(AudioError::Backend(
                "pan does not apply to a world-positioned voice".to_string(),
            )),
        }
    }

    fn set_position(&mut self, voice: VoiceId, position: Vec3) -> Result<(), AudioError> {
        let voice = self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        match &mut voice.placement {
            Placement::Positioned { position: stored } => {
                *stored = position;
                voice.sink.set_emitter_position(position.into());
                Ok(())
            }
            Placement::Flat { .. } => Err(AudioError::Backend(
                "voice is not spatial".to_string(),
            )),
        }
    }

    fn playback_state(&self, voice: VoiceId) -> PlaybackState {
        match self.voices.get(&voice) {
            Some(v) if !v.started => PlaybackState::Stopped,
            Some(v) if v.sink.empty() => PlaybackState::Stopped,
            Some(v) if v.sink.is_paused() => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
            None => PlaybackState::Stopped,
        }
    }

    fn set_listener(&mut self, pose: &ListenerPose) {
        self.listener = *pose;
        let (left, right) = pose.ear_positions();
        for voice in self.voices.values() {
            if let Placement::Positioned { .. } = voice.placement {
                voice.sink.set_left_ear_position(left.into());
                voice.sink.set_right_ear_position(right.into());
            }
        }
    }

    fn set_all_paused(&mut self, paused: bool) {
        self.all_paused = paused;
        for voice in self.voices.values() {
            if paused {
                voice.sink.pause();
            } else if voice.started {
                voice.sink.play();
            }
        }
    }

    fn stop_all(&mut self) {
        for (_id, voice) in self.voices.drain() {
            voice.sink.stop();
        }
    }

    fn playing_count(&self) -> usize {
        self.voices
            .values()
            .filter(|v| v.started && !v.sink.empty() && !v.sink.is_paused())
            .count()
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_emitter_stays_on_unit_arc() {
        for pan in [-1.0, -0.5, 0.0, 0.5, 1.0] {
            let [x, y, z] = flat_emitter(pan);
            let dist = (x * x + y * y + z * z).sqrt();
            assert!((dist - 1.0).abs() < 1e-6, "pan {} left the arc", pan);
        }
    }

    #[test]
    fn test_flat_emitter_clamps_pan() {
        assert_eq!(flat_emitter(5.0), flat_emitter(1.0));
        assert_eq!(flat_emitter(-5.0), flat_emitter(-1.0));
    }

    #[test]
    fn test_operations_require_initialization() {
        let mut backend = RodioBackend::new();
        assert!(!backend.is_initialized());
        assert!(matches!(
            backend.load_bank(Path::new("missing.bank"), LoadMode::Immediate),
            Err(AudioError::NotInitialized)
        ));
        assert!(matches!(
            backend.create_event("event:/SFX/Explosion"),
            Err(AudioError::NotInitialized)
        ));
        assert!(matches!(
            backend.play_sample(&[0u8; 4], &VoiceParams::default()),
            Err(AudioError::NotInitialized)
        ));
    }

    #[test]
    fn test_backend_initialization() {
        let mut backend = RodioBackend::new();
        let config = BackendConfig::default();

        // May fail in CI/test environments without an audio device
        if backend.initialize(&config).is_ok() {
            assert!(backend.is_initialized());
            // Second initialization is a no-op
            assert!(backend.initialize(&config).is_ok());
            backend.shutdown();
            assert!(!backend.is_initialized());
        }
    }

    #[test]
    fn test_unknown_event_reports_not_found() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&BackendConfig::default()).is_ok() {
            let result = backend.create_event("event:/Nope");
            assert!(matches!(result, Err(AudioError::ResourceNotFound(_))));
            backend.shutdown();
        }
    }

    #[test]
    fn test_unknown_voice_is_stopped_and_stop_is_idempotent() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&BackendConfig::default()).is_ok() {
            let ghost = VoiceId(999);
            assert_eq!(backend.playback_state(ghost), PlaybackState::Stopped);
            assert!(backend.stop(ghost, StopMode::Immediate).is_ok());
            assert!(matches!(
                backend.set_volume(ghost, 0.5),
                Err(AudioError::InvalidHandle)
            ));
            backend.shutdown();
        }
    }

    #[test]
    fn test_deferred_bank_with_missing_sample_fails_on_poll() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&BackendConfig::default()).is_ok() {
            let dir = std::env::temp_dir().join("sound_engine_bank_test");
            std::fs::create_dir_all(&dir).unwrap();
            let bank_path = dir.join("broken.bank");
            std::fs::write(
                &bank_path,
                r#"(name: "broken", events: [(path: "event:/X", file: "missing.ogg")])"#,
            )
            .unwrap();

            let bank = backend
                .load_bank(&bank_path, LoadMode::Deferred)
                .expect("manifest itself parses");
            assert_eq!(backend.bank_state(bank).unwrap(), BankState::Pending);

            backend.update();
            assert!(matches!(
                backend.bank_state(bank).unwrap(),
                BankState::Failed(_)
            ));

            std::fs::remove_file(&bank_path).ok();
            backend.shutdown();
        }
    }

    #[test]
    fn test_empty_bank_is_ready_immediately() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&BackendConfig::default()).is_ok() {
            let dir = std::env::temp_dir().join("sound_engine_bank_test");
            std::fs::create_dir_all(&dir).unwrap();
            let bank_path = dir.join("empty.bank");
            std::fs::write(&bank_path, r#"(name: "empty", events: [])"#).unwrap();

            let bank = backend.load_bank(&bank_path, LoadMode::Deferred).unwrap();
            assert_eq!(backend.bank_state(bank).unwrap(), BankState::Ready);

            std::fs::remove_file(&bank_path).ok();
            backend.shutdown();
        }
    }
}
