//! # qwen-tts-bridge
//!
//! A Rust library brokering access to Qwen3-TTS text-to-speech models.
//!
//! ## Features
//!
//! - **Three synthesis modes**: voice design, preset-speaker custom voice and
//!   reference-based voice clone
//! - **Model fallback**: candidate models are tried in order, optionally
//!   across modes, and only one model is kept active at a time
//! - **WAV output**: whatever shape the model returns is normalized to mono
//!   16-bit PCM WAV bytes
//! - **Graceful degradation**: with fallback enabled, failures produce a
//!   short silence clip tagged with the reason
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! qwen-tts-bridge = "2026.2"
//! ```
//!
//! ```ignore
//! use qwen_tts_bridge::config::BridgeConfig;
//! use qwen_tts_bridge::engines::qwen::{QwenEngine, VoiceDesignRequest};
//!
//! let engine = QwenEngine::new(my_runtime_loader, BridgeConfig::from_env());
//! let request = VoiceDesignRequest::builder()
//!     .text("Hello, world!")
//!     .instruct("a warm storyteller")
//!     .build()?;
//!
//! let result = engine.synthesize_voice_design(&request)?;
//! result.write_wav(std::path::Path::new("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audio;
pub mod config;
pub mod engines;
mod error;

pub use error::BridgeError;

use std::path::Path;

use engines::qwen::Candidate;

/// Why a synthesis call returned silence instead of model audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No candidate model could be loaded.
    ModelUnavailable,
    /// A model was loaded but produced no usable audio.
    NoAudio,
}

/// Where the audio of a [`SynthesizedAudio`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOrigin {
    /// Generated by the given model, which may differ from the one
    /// requested when a fallback candidate was used.
    Model(Candidate),
    Silence(FallbackReason),
}

/// The result of a synthesis operation: encoded WAV bytes and their origin.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub wav: Vec<u8>,
    pub origin: AudioOrigin,
}

impl SynthesizedAudio {
    pub fn from_model(wav: Vec<u8>, candidate: Candidate) -> Self {
        Self {
            wav,
            origin: AudioOrigin::Model(candidate),
        }
    }

    /// A fallback clip of [`audio::SILENCE_SECONDS`] at `sample_rate`.
    pub fn silence(sample_rate: u32, reason: FallbackReason) -> Result<Self, BridgeError> {
        Ok(Self {
            wav: audio::silent_wav(sample_rate, audio::SILENCE_SECONDS)?,
            origin: AudioOrigin::Silence(reason),
        })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, AudioOrigin::Silence(_))
    }

    /// Sample rate from the WAV header, if the bytes parse as WAV.
    pub fn sample_rate(&self) -> Option<u32> {
        audio::wav_sample_rate(&self.wav)
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> Option<f64> {
        audio::wav_duration_secs(&self.wav)
    }

    /// Write the WAV bytes to a file.
    pub fn write_wav(&self, path: &Path) -> Result<(), BridgeError> {
        std::fs::write(path, &self.wav)?;
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.wav
    }
}

/// Common interface for text-to-speech synthesis engines.
///
/// Engines manage their own model lifecycle, so every operation takes
/// `&self` and an engine can be shared between threads.
pub trait SynthesisEngine {
    /// Request type accepted by [`SynthesisEngine::synthesize`].
    type Request;

    /// Release the active model. Always succeeds, even when nothing is loaded.
    fn unload_model(&self) -> bool;

    fn is_model_loaded(&self) -> bool;

    /// Synthesize speech for the given request.
    fn synthesize(&self, request: &Self::Request) -> Result<SynthesizedAudio, BridgeError>;

    /// Synthesize speech and write it to a WAV file.
    ///
    /// Default implementation calls `synthesize()` then `SynthesizedAudio::write_wav()`.
    fn synthesize_to_file(
        &self,
        request: &Self::Request,
        wav_path: &Path,
    ) -> Result<(), BridgeError> {
        self.synthesize(request)?.write_wav(wav_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::qwen::Mode;

    #[test]
    fn silence_reports_its_shape() {
        let audio = SynthesizedAudio::silence(24_000, FallbackReason::NoAudio).unwrap();
        assert!(audio.is_fallback());
        assert_eq!(audio.sample_rate(), Some(24_000));
        assert!((audio.duration_secs().unwrap() - 0.35).abs() < 1e-6);
    }

    #[test]
    fn model_audio_is_not_fallback() {
        let wav = audio::to_wav(&[0.0, 0.5], 16_000).unwrap();
        let audio = SynthesizedAudio::from_model(wav.clone(), Candidate::new(Mode::VoiceDesign, "m"));
        assert!(!audio.is_fallback());
        assert_eq!(audio.sample_rate(), Some(16_000));
        assert_eq!(audio.into_bytes(), wav);
    }

    #[test]
    fn write_wav_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        let audio = SynthesizedAudio::silence(8_000, FallbackReason::ModelUnavailable).unwrap();
        audio.write_wav(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), audio.wav);
    }

    #[test]
    fn undecodable_bytes_have_no_rate() {
        let audio = SynthesizedAudio::from_model(
            b"not a wav".to_vec(),
            Candidate::new(Mode::CustomVoice, "m"),
        );
        assert_eq!(audio.sample_rate(), None);
        assert_eq!(audio.duration_secs(), None);
    }
}
