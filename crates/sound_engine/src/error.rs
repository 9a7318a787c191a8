//! Unified error type for the audio facade
//!
//! All fallible operations return [`AudioError`] so that callers can apply a
//! uniform recovery policy instead of juggling sentinels and booleans.

use thiserror::Error;

/// Errors reported by the audio engine and its backend
#[derive(Error, Debug)]
pub enum AudioError {
    /// The engine (or backend) has not been initialized yet
    #[error("audio system is not initialized")]
    NotInitialized,

    /// A logical path (event, bank, or parameter target) could not be resolved
    #[error("audio resource not found: {0}")]
    ResourceNotFound(String),

    /// A handle refers to an instance that was released or never existed
    #[error("stale or invalid audio handle")]
    InvalidHandle,

    /// Bank loading failed
    #[error("failed to load bank {path}: {reason}")]
    BankLoad {
        /// Path of the bank file that failed to load
        path: String,
        /// Backend-reported failure reason
        reason: String,
    },

    /// Audio data was present but malformed or of an unsupported format
    #[error("invalid audio data: {0}")]
    InvalidData(String),

    /// Failure inside the playback middleware
    #[error("audio backend failure: {0}")]
    Backend(String),

    /// Filesystem error while reading banks or sample data
    #[error("audio IO error: {0}")]
    Io(#[from] std::io::Error),
}
