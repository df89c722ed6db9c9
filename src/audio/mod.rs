//! Audio normalization and WAV encoding.
//!
//! Model runtimes hand back audio in several shapes: already-encoded WAV
//! bytes, nested numeric lists, tensors, `(payload, sample_rate)` pairs or
//! mappings with named fields. [`into_payload`] is the single boundary that
//! turns any of those into an [`AudioPayload`], which then encodes to mono
//! 16-bit PCM WAV bytes.

pub mod output;
pub mod wav;

pub use output::{extract, into_payload, AudioPayload, ModelOutput, SampleTree, TensorLike};
pub use wav::{normalize, silent_wav, to_wav, wav_duration_secs, wav_sample_rate};

/// Sample rate assumed when a model does not report one.
pub const DEFAULT_MODEL_SAMPLE_RATE: u32 = 24_000;

/// Length of the silence clip returned by fallback synthesis.
pub const SILENCE_SECONDS: f64 = 0.35;

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Malformed audio payload: {0}")]
    Malformed(String),
    #[error("Tensor conversion failed: {0}")]
    Tensor(String),
}
