use crate::audio::AudioError;
use crate::engines::qwen::Mode;

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Qwen3-TTS runtime unavailable: failed to load any of {attempts} candidate model(s)")]
    RuntimeUnavailable { attempts: usize },
    #[error("Qwen3-TTS {mode} synthesis failed")]
    SynthesisFailed { mode: Mode },
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
