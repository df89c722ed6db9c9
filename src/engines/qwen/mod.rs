//! Qwen3-TTS synthesis bridge.
//!
//! This module brokers access to an externally supplied Qwen3-TTS runtime.
//! The runtime is reached through two traits: a [`ModelLoader`] that
//! creates models from an identifier, and the [`TtsModel`] it returns,
//! whose generation methods are all optional.
//!
//! # Modes and Models
//!
//! | Mode | Default model | Fallbacks |
//! |---|---|---|
//! | `voice_design` | `Qwen/Qwen3-TTS-12Hz-1.7B-VoiceDesign` | - |
//! | `custom_voice` | `Qwen/Qwen3-TTS-12Hz-0.6B-CustomVoice` | `Qwen/Qwen3-TTS-12Hz-1.7B-CustomVoice` |
//! | `voice_clone` | `Qwen/Qwen3-TTS-12Hz-0.6B-Base` | `Qwen/Qwen3-TTS-12Hz-1.7B-Base` |
//!
//! A load request tries the requested model, then the other models of its
//! mode, then (unless strict, and when cross-mode fallback is enabled) the
//! models of every other mode. Only one model is active at a time; asking
//! for the pair that is already active is free.
//!
//! # Fallback
//!
//! With `allow_fallback` set, a request whose model cannot be loaded or
//! whose model produces no audio returns 0.35 s of silence instead of an
//! error. [`crate::SynthesizedAudio::origin`] tells the two apart.
//!
//! # Examples
//!
//! ```rust,no_run
//! use qwen_tts_bridge::config::BridgeConfig;
//! use qwen_tts_bridge::engines::qwen::{CustomVoiceRequest, QwenEngine};
//! # use qwen_tts_bridge::engines::qwen::{ModelError, TtsModel};
//! # fn runtime_loader(_: &str, _: &qwen_tts_bridge::config::LoadOptions)
//! #     -> Result<Box<dyn TtsModel>, ModelError> { unimplemented!() }
//!
//! let engine = QwenEngine::new(runtime_loader, BridgeConfig::default());
//! println!("speakers: {}", engine.supported_speakers_csv(Some("custom_voice"), None));
//!
//! let request = CustomVoiceRequest::builder()
//!     .text("Good morning!")
//!     .speaker("serena")
//!     .build()?;
//! let audio = engine.synthesize_custom_voice(&request)?;
//! if audio.is_fallback() {
//!     eprintln!("no model available, got silence");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod candidates;
pub mod engine;
mod generate;
pub mod lifecycle;
pub mod model;
pub mod pinned;
pub mod registry;

#[cfg(test)]
pub(crate) mod fake;

pub use candidates::{build_candidates, Candidate};
pub use engine::{
    CustomVoiceRequest, QwenEngine, SynthesisRequest, VoiceCloneRequest, VoiceDesignRequest,
};
pub use generate::resolve_speaker;
pub use lifecycle::{LoadStatus, ModelLifecycle};
pub use model::{
    Capabilities, CustomVoiceArgs, LoadedModel, ModelError, ModelLoader, ReferenceArg,
    TtsModel, VoiceCloneArgs, VoiceDesignArgs,
};
pub use pinned::{PinnedEngine, PinnedRequest};
pub use registry::{Mode, Registry, UnknownMode};
