use derive_builder::Builder;

use crate::audio::DEFAULT_MODEL_SAMPLE_RATE;
use crate::config::BridgeConfig;
use crate::{BridgeError, SynthesisEngine, SynthesizedAudio};

use super::candidates::Candidate;
use super::engine::{audio_or_fallback, validate_text};
use super::generate;
use super::lifecycle::{LoadStatus, ModelLifecycle};
use super::model::ModelLoader;
use super::registry::{Mode, Registry};

#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct PinnedRequest {
    pub text: String,
    /// Style instruction for voice design, speaker name for custom voice.
    #[builder(default)]
    pub voice: String,
    #[builder(default = "DEFAULT_MODEL_SAMPLE_RATE")]
    pub sample_rate: u32,
}

impl PinnedRequest {
    pub fn builder() -> PinnedRequestBuilder {
        PinnedRequestBuilder::default()
    }
}

/// Engine bound to a single model.
///
/// Unlike [`super::QwenEngine`] it never tries other candidates: the
/// pinned model loads or the engine is unavailable (or degraded, with
/// fallback enabled).
pub struct PinnedEngine {
    lifecycle: ModelLifecycle,
    candidate: Candidate,
}

impl PinnedEngine {
    /// Only `voice_design` and `custom_voice` models can be pinned.
    pub fn new(
        loader: impl ModelLoader + 'static,
        config: BridgeConfig,
        mode: Mode,
        model_id: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        if mode == Mode::VoiceClone {
            return Err(BridgeError::Config(
                "voice_clone models cannot be pinned".into(),
            ));
        }
        let model_id = model_id.into();
        if model_id.trim().is_empty() {
            return Err(BridgeError::Config("pinned model id is empty".into()));
        }

        Ok(Self {
            lifecycle: ModelLifecycle::new(Registry::default(), Box::new(loader), config),
            candidate: Candidate::new(mode, model_id),
        })
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn load_model(&self) -> Result<LoadStatus, BridgeError> {
        self.lifecycle.load_exact(&self.candidate)
    }
}

impl SynthesisEngine for PinnedEngine {
    type Request = PinnedRequest;

    fn unload_model(&self) -> bool {
        self.lifecycle.unload()
    }

    fn is_model_loaded(&self) -> bool {
        self.lifecycle.is_loaded()
    }

    fn synthesize(&self, request: &PinnedRequest) -> Result<SynthesizedAudio, BridgeError> {
        validate_text(&request.text)?;
        let config = self.lifecycle.config();
        let language = config.default_language.as_str();
        let mode = self.candidate.mode;

        let generated = self.lifecycle.with_exact_model(&self.candidate, |model| match mode {
            Mode::VoiceDesign => {
                generate::voice_design(model, &request.text, language, &request.voice)
            }
            _ => {
                let speaker = if request.voice.trim().is_empty() {
                    config.default_speaker.as_str()
                } else {
                    request.voice.as_str()
                };
                generate::custom_voice(model, &request.text, language, speaker, None)
            }
        })?;
        audio_or_fallback(generated, mode, config.allow_fallback, request.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::engines::qwen::fake::{FakeLoader, ModelScript};
    use crate::{AudioOrigin, FallbackReason};

    fn request(text: &str, voice: &str) -> PinnedRequest {
        PinnedRequest::builder().text(text).voice(voice).build().unwrap()
    }

    #[test]
    fn voice_clone_cannot_be_pinned() {
        let loader = FakeLoader::new(ModelScript::default());
        assert!(matches!(
            PinnedEngine::new(loader, BridgeConfig::default(), Mode::VoiceClone, "m"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn custom_voice_treats_voice_as_speaker() {
        let loader = FakeLoader::new(ModelScript::default());
        let engine = PinnedEngine::new(
            loader.clone(),
            BridgeConfig::default(),
            Mode::CustomVoice,
            "local/custom",
        )
        .unwrap();

        let audio = engine.synthesize(&request("Hi", "Serena")).unwrap();
        assert_eq!(
            audio.origin,
            AudioOrigin::Model(Candidate::new(Mode::CustomVoice, "local/custom"))
        );
        engine.synthesize(&request("Hi", "")).unwrap();
        assert_eq!(
            loader.calls(),
            vec![
                "custom_voice speaker=serena language=English instruct=-",
                "custom_voice speaker=ryan language=English instruct=-",
            ]
        );
        assert_eq!(loader.created(), vec!["local/custom".to_string()]);
    }

    #[test]
    fn voice_design_treats_voice_as_instruction() {
        let loader = FakeLoader::new(ModelScript::default());
        let engine = PinnedEngine::new(
            loader.clone(),
            BridgeConfig::default(),
            Mode::VoiceDesign,
            "local/design",
        )
        .unwrap();
        engine.synthesize(&request("Hi", "husky")).unwrap();
        assert_eq!(
            loader.calls(),
            vec!["voice_design text=Hi language=English instruct=husky"]
        );
    }

    #[test]
    fn never_falls_back_to_other_models() {
        let loader = FakeLoader::new(ModelScript::default());
        loader.fail("local/custom");
        let engine = PinnedEngine::new(
            loader.clone(),
            BridgeConfig::default(),
            Mode::CustomVoice,
            "local/custom",
        )
        .unwrap();

        assert!(matches!(
            engine.synthesize(&request("Hi", "ryan")),
            Err(BridgeError::RuntimeUnavailable { attempts: 1 })
        ));
        assert_eq!(loader.attempts(), vec!["local/custom".to_string()]);
        assert!(matches!(
            engine.synthesize(&request(" ", "ryan")),
            Err(BridgeError::InvalidInput(_))
        ));
    }

    #[test]
    fn degraded_pinned_engine_returns_silence() {
        let loader = FakeLoader::new(ModelScript::default());
        loader.fail_all();
        let engine = PinnedEngine::new(
            loader,
            BridgeConfig {
                allow_fallback: true,
                ..Default::default()
            },
            Mode::VoiceDesign,
            "local/design",
        )
        .unwrap();

        let audio = engine
            .synthesize(&PinnedRequest::builder().text("Hi").sample_rate(8_000u32).build().unwrap())
            .unwrap();
        assert_eq!(
            audio.origin,
            AudioOrigin::Silence(FallbackReason::ModelUnavailable)
        );
        let reader = hound::WavReader::new(Cursor::new(audio.wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.duration(), 2_800);
    }

    #[test]
    fn load_is_idempotent() {
        let loader = FakeLoader::new(ModelScript::default());
        let engine = PinnedEngine::new(
            loader.clone(),
            BridgeConfig::default(),
            Mode::VoiceDesign,
            "local/design",
        )
        .unwrap();
        assert!(engine.load_model().unwrap().is_loaded());
        assert!(engine.load_model().unwrap().is_loaded());
        assert_eq!(loader.created().len(), 1);
        assert!(engine.unload_model());
        assert!(!engine.is_model_loaded());
        assert!(loader.alive().is_empty());
    }
}
