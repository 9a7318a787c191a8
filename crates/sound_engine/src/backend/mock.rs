//! In-memory backend for exercising the facade without an audio device
//!
//! Records every call so tests can assert on what reached the middleware.
//! Shared state is handed out as `Rc<RefCell<_>>` because the facade takes
//! ownership of the backend box.

use super::{
    AudioBackend, BackendConfig, BankId, CreatedEvent, PlaybackState, StopMode, VoiceId,
    VoiceParams,
};
use crate::bank::{BankState, LoadMode};
use crate::error::AudioError;
use crate::foundation::math::Vec3;
use crate::mixer::VolumeGroup;
use crate::spatial::ListenerPose;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Template describing an event the mock "bank" can resolve
#[derive(Clone)]
pub struct EventTemplate {
    pub group: VolumeGroup,
    pub base_volume: f32,
    pub spatial: bool,
    pub parameters: HashMap<String, f32>,
}

impl Default for EventTemplate {
    fn default() -> Self {
        Self {
            group: VolumeGroup::Sfx,
            base_volume: 1.0,
            spatial: false,
            parameters: HashMap::new(),
        }
    }
}

/// Recorded state of one mock voice
pub struct MockVoice {
    pub started: bool,
    pub stopped: bool,
    pub finished: bool,
    pub volume: f32,
    pub pitch: f32,
    pub pan: f32,
    pub position: Option<Vec3>,
    pub stop_mode: Option<StopMode>,
    pub spatial: bool,
}

/// Observable state shared between the mock backend and the test
#[derive(Default)]
pub struct MockState {
    pub initialized: bool,
    pub init_calls: usize,
    pub update_calls: usize,
    pub bank_loads: Vec<(PathBuf, LoadMode)>,
    pub bank_states: HashMap<BankId, BankState>,
    pub events: HashMap<String, EventTemplate>,
    pub voices: HashMap<VoiceId, MockVoice>,
    pub listener: Option<ListenerPose>,
    pub all_paused: bool,
    next_voice: u32,
    next_bank: u32,
}

impl MockState {
    /// Register an event the mock can resolve
    pub fn define_event(&mut self, path: &str, template: EventTemplate) {
        self.events.insert(path.to_string(), template);
    }

    /// Mark a voice's source as having run dry
    pub fn finish_voice(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.finished = true;
        }
    }

    /// Voices that are neither stopped nor finished and have been started
    pub fn live_voice_count(&self) -> usize {
        self.voices
            .values()
            .filter(|v| v.started && !v.stopped && !v.finished)
            .count()
    }
}

/// Scriptable audio backend
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    /// Create a mock backend plus a shared view of its state
    pub fn new() -> (Self, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState::default()));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }

    fn spawn_voice(&self, spatial: bool, started: bool, params: Option<&VoiceParams>) -> VoiceId {
        let mut state = self.state.borrow_mut();
        let id = VoiceId(state.next_voice);
        state.next_voice += 1;
        state.voices.insert(
            id,
            MockVoice {
                started,
                stopped: false,
                finished: false,
                volume: params.map_or(1.0, |p| p.volume),
                pitch: params.map_or(1.0, |p| p.pitch),
                pan: params.map_or(0.0, |p| p.pan),
                position: params.and_then(|p| p.position),
                stop_mode: None,
                spatial,
            },
        );
        id
    }
}

impl AudioBackend for MockBackend {
    fn initialize(&mut self, _config: &BackendConfig) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        state.init_calls += 1;
        state.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        let mut state = self.state.borrow_mut();
        state.initialized = false;
        state.voices.clear();
        state.bank_states.clear();
    }

    fn is_initialized(&self) -> bool {
        self.state.borrow().initialized
    }

    fn update(&mut self) {
        self.state.borrow_mut().update_calls += 1;
    }

    fn load_bank(&mut self, path: &Path, mode: LoadMode) -> Result<BankId, AudioError> {
        let mut state = self.state.borrow_mut();
        if !state.initialized {
            return Err(AudioError::NotInitialized);
        }
        let id = BankId(state.next_bank);
        state.next_bank += 1;
        state.bank_loads.push((path.to_path_buf(), mode));
        state.bank_states.insert(id, BankState::Ready);
        Ok(id)
    }

    fn bank_state(&self, bank: BankId) -> Result<BankState, AudioError> {
        self.state
            .borrow()
            .bank_states
            .get(&bank)
            .cloned()
            .ok_or(AudioError::InvalidHandle)
    }

    fn unload_bank(&mut self, bank: BankId) -> Result<(), AudioError> {
        self.state.borrow_mut().bank_states.remove(&bank);
        Ok(())
    }

    fn create_event(&mut self, event_path: &str) -> Result<CreatedEvent, AudioError> {
        if !self.state.borrow().initialized {
            return Err(AudioError::NotInitialized);
        }
        let template = self
            .state
            .borrow()
            .events
            .get(event_path)
            .cloned()
            .ok_or_else(|| AudioError::ResourceNotFound(event_path.to_string()))?;

        let voice = self.spawn_voice(template.spatial, false, None);
        if let Some(v) = self.state.borrow_mut().voices.get_mut(&voice) {
            v.volume = template.base_volume;
        }
        Ok(CreatedEvent {
            voice,
            group: template.group,
            base_volume: template.base_volume,
            spatial: template.spatial,
            parameters: template.parameters,
        })
    }

    fn play_sample(&mut self, _data: &[u8], params: &VoiceParams) -> Result<VoiceId, AudioError> {
        if !self.state.borrow().initialized {
            return Err(AudioError::NotInitialized);
        }
        Ok(self.spawn_voice(params.spatial, true, Some(params)))
    }

    fn start(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        let v = state.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        v.started = true;
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId, mode: StopMode) -> Result<(), AudioError> {
        // Idempotent: stopping an unknown or stopped voice succeeds
        if let Some(v) = self.state.borrow_mut().voices.get_mut(&voice) {
            v.stopped = true;
            v.stop_mode = Some(mode);
        }
        Ok(())
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        let v = state.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        v.volume = volume;
        Ok(())
    }

    fn set_pitch(&mut self, voice: VoiceId, pitch: f32) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        let v = state.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        v.pitch = pitch;
        Ok(())
    }

    fn set_pan(&mut self, voice: VoiceId, pan: f32) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        let v = state.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        v.pan = pan;
        Ok(())
    }

    fn set_position(&mut self, voice: VoiceId, position: Vec3) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        let v = state.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        v.position = Some(position);
        Ok(())
    }

    fn playback_state(&self, voice: VoiceId) -> PlaybackState {
        let state = self.state.borrow();
        match state.voices.get(&voice) {
            Some(v) if !v.started || v.stopped || v.finished => PlaybackState::Stopped,
            Some(_) if state.all_paused => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
            None => PlaybackState::Stopped,
        }
    }

    fn set_listener(&mut self, pose: &ListenerPose) {
        self.state.borrow_mut().listener = Some(*pose);
    }

    fn set_all_paused(&mut self, paused: bool) {
        self.state.borrow_mut().all_paused = paused;
    }

    fn stop_all(&mut self) {
        for v in self.state.borrow_mut().voices.values_mut() {
            v.stopped = true;
        }
    }

    fn playing_count(&self) -> usize {
        let state = self.state.borrow();
        if state.all_paused {
            return 0;
        }
        state.live_voice_count()
    }
}
