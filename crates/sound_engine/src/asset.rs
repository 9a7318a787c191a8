//! Audio asset loading
//!
//! Stores raw audio file bytes that the backend decodes on demand during
//! playback. Supports WAV, OGG Vorbis, MP3, and FLAC.

use crate::error::AudioError;
use std::path::Path;

/// Audio asset containing encoded audio data
#[derive(Clone)]
pub struct AudioAsset {
    /// Raw audio file data (encoded format)
    data: Vec<u8>,
    format: AudioFormat,
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV uncompressed
    Wav,
    /// OGG Vorbis compressed
    Ogg,
    /// MP3 compressed
    Mp3,
    /// FLAC lossless
    Flac,
    /// Unknown format
    Unknown,
}

impl AudioAsset {
    /// Create an asset from raw bytes, validating the container format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AudioError> {
        if bytes.is_empty() {
            return Err(AudioError::InvalidData("empty audio file".to_string()));
        }

        let format = Self::detect_format(bytes);
        if format == AudioFormat::Unknown {
            return Err(AudioError::InvalidData(
                "unknown audio format".to_string(),
            ));
        }

        // Keep the encoded bytes; full validation happens when the backend
        // decodes them at playback time.
        Ok(Self {
            data: bytes.to_vec(),
            format,
        })
    }

    /// Read and validate an audio file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AudioError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Get the raw audio data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the detected container format
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Detect audio format from magic bytes
    fn detect_format(bytes: &[u8]) -> AudioFormat {
        if bytes.len() < 4 {
            return AudioFormat::Unknown;
        }

        match &bytes[0..4] {
            b"RIFF" => AudioFormat::Wav,
            b"OggS" => AudioFormat::Ogg,
            b"fLaC" => AudioFormat::Flac,
            // MP3 can start with an ID3 tag or a frame sync
            [0xFF, 0xFB, _, _] | [0xFF, 0xFA, _, _] => AudioFormat::Mp3,
            [b'I', b'D', b'3', _] => AudioFormat::Mp3,
            _ => AudioFormat::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(AudioAsset::detect_format(b"RIFF....WAVE"), AudioFormat::Wav);
        assert_eq!(AudioAsset::detect_format(b"OggS...."), AudioFormat::Ogg);
        assert_eq!(AudioAsset::detect_format(b"fLaC...."), AudioFormat::Flac);
        assert_eq!(AudioAsset::detect_format(b"ID3\x04...."), AudioFormat::Mp3);
        assert_eq!(AudioAsset::detect_format(b"ABCD"), AudioFormat::Unknown);
    }

    #[test]
    fn test_empty_data_fails() {
        assert!(matches!(
            AudioAsset::from_bytes(&[]),
            Err(AudioError::InvalidData(_))
        ));
    }

    #[test]
    fn test_unknown_format_fails() {
        assert!(AudioAsset::from_bytes(b"not audio at all").is_err());
    }

    #[test]
    fn test_valid_header_accepted() {
        let asset = AudioAsset::from_bytes(b"RIFF\x00\x00\x00\x00WAVEfmt ").unwrap();
        assert_eq!(asset.format(), AudioFormat::Wav);
        assert!(!asset.data().is_empty());
    }
}
