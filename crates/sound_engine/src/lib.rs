//! # Sound Engine
//!
//! A game audio facade over the rodio playback middleware.
//!
//! ## Features
//!
//! - **Banks**: Load authored event banks immediately or deferred
//! - **Events**: Named event instances with parameters and 3D positioning
//! - **Raw Sounds**: Direct playback of WAV/OGG/MP3/FLAC sample files
//! - **Mixer Groups**: Independent music/SFX/ambience volume and mute
//! - **Direction Layer**: Music exclusivity, fade-in, one-shots, cleanup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sound_engine::prelude::*;
//!
//! fn main() -> Result<(), AudioError> {
//!     let settings = AudioSettings::default();
//!     let mut engine = AudioEngine::new();
//!     engine.initialize(&settings)?;
//!
//!     let mut director = AudioDirector::new(settings);
//!     director.load_banks(&mut engine)?;
//!     director.play_music(&mut engine, "event:/Music/TitleTheme", Some(2.0))?;
//!
//!     loop {
//!         // per frame:
//!         director.update(&mut engine, 1.0 / 60.0);
//!         # break;
//!     }
//!
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::missing_errors_doc)]

pub mod asset;
pub mod backend;
pub mod bank;
pub mod config;
pub mod director;
pub mod engine;
pub mod error;
pub mod foundation;
pub mod mixer;
pub mod spatial;

pub use director::{AudioDirector, SoundCategory};
pub use engine::{AudioEngine, EventHandle, LifecycleState, SoundHandle};
pub use error::AudioError;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        backend::StopMode,
        bank::{BankState, LoadMode},
        config::AudioSettings,
        foundation::math::Vec3,
        mixer::VolumeGroup,
        spatial::ListenerPose,
        AudioDirector, AudioEngine, AudioError, EventHandle, LifecycleState, SoundCategory,
        SoundHandle,
    };
}
