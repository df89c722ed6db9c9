use derive_builder::Builder;

use crate::audio::DEFAULT_MODEL_SAMPLE_RATE;
use crate::config::BridgeConfig;
use crate::{BridgeError, FallbackReason, SynthesisEngine, SynthesizedAudio};

use super::candidates::Candidate;
use super::generate;
use super::lifecycle::{LoadStatus, ModelLifecycle};
use super::model::{LoadedModel, ModelLoader};
use super::registry::{Mode, Registry};

/// Voice design request: text spoken in a voice described by `instruct`.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct VoiceDesignRequest {
    pub text: String,
    /// Free-form style instruction, e.g. "a calm, low-pitched narrator".
    #[builder(default)]
    pub instruct: String,
    /// Overrides the configured default language.
    #[builder(default, setter(into, strip_option))]
    pub language: Option<String>,
    /// Sample rate of the silence clip returned on fallback.
    #[builder(default = "DEFAULT_MODEL_SAMPLE_RATE")]
    pub sample_rate: u32,
    /// Overrides the mode's default model.
    #[builder(default, setter(into, strip_option))]
    pub model_id: Option<String>,
}

impl VoiceDesignRequest {
    pub fn builder() -> VoiceDesignRequestBuilder {
        VoiceDesignRequestBuilder::default()
    }
}

/// Custom voice request: text spoken by one of the model's preset speakers.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct CustomVoiceRequest {
    pub text: String,
    /// Preset speaker name; matched case-insensitively.
    #[builder(default, setter(into, strip_option))]
    pub speaker: Option<String>,
    #[builder(default, setter(into, strip_option))]
    pub instruct: Option<String>,
    #[builder(default, setter(into, strip_option))]
    pub language: Option<String>,
    #[builder(default = "DEFAULT_MODEL_SAMPLE_RATE")]
    pub sample_rate: u32,
    #[builder(default, setter(into, strip_option))]
    pub model_id: Option<String>,
}

impl CustomVoiceRequest {
    pub fn builder() -> CustomVoiceRequestBuilder {
        CustomVoiceRequestBuilder::default()
    }
}

/// Voice clone request: text spoken in the voice of `reference_audio`.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct VoiceCloneRequest {
    pub text: String,
    /// Encoded reference clip (typically WAV bytes).
    pub reference_audio: Vec<u8>,
    #[builder(default, setter(into, strip_option))]
    pub language: Option<String>,
    #[builder(default = "DEFAULT_MODEL_SAMPLE_RATE")]
    pub sample_rate: u32,
    #[builder(default, setter(into, strip_option))]
    pub model_id: Option<String>,
}

impl VoiceCloneRequest {
    pub fn builder() -> VoiceCloneRequestBuilder {
        VoiceCloneRequestBuilder::default()
    }
}

#[derive(Debug, Clone)]
pub enum SynthesisRequest {
    VoiceDesign(VoiceDesignRequest),
    CustomVoice(CustomVoiceRequest),
    VoiceClone(VoiceCloneRequest),
}

impl SynthesisRequest {
    pub fn mode(&self) -> Mode {
        match self {
            SynthesisRequest::VoiceDesign(_) => Mode::VoiceDesign,
            SynthesisRequest::CustomVoice(_) => Mode::CustomVoice,
            SynthesisRequest::VoiceClone(_) => Mode::VoiceClone,
        }
    }
}

impl From<VoiceDesignRequest> for SynthesisRequest {
    fn from(request: VoiceDesignRequest) -> Self {
        SynthesisRequest::VoiceDesign(request)
    }
}

impl From<CustomVoiceRequest> for SynthesisRequest {
    fn from(request: CustomVoiceRequest) -> Self {
        SynthesisRequest::CustomVoice(request)
    }
}

impl From<VoiceCloneRequest> for SynthesisRequest {
    fn from(request: VoiceCloneRequest) -> Self {
        SynthesisRequest::VoiceClone(request)
    }
}

/// Qwen3-TTS synthesis engine.
///
/// Owns the model lifecycle and exposes one entry point per mode. Each
/// entry point validates its input, makes sure a suitable model is active
/// (falling back across candidates), runs the mode's generation method and
/// encodes the result as WAV.
///
/// # Quick Start
///
/// ```rust,no_run
/// use qwen_tts_bridge::config::BridgeConfig;
/// use qwen_tts_bridge::engines::qwen::{QwenEngine, VoiceDesignRequest};
/// # use qwen_tts_bridge::engines::qwen::{ModelError, TtsModel};
/// # fn my_loader(_: &str, _: &qwen_tts_bridge::config::LoadOptions)
/// #     -> Result<Box<dyn TtsModel>, ModelError> { unimplemented!() }
///
/// let engine = QwenEngine::new(my_loader, BridgeConfig::from_env());
/// let request = VoiceDesignRequest::builder()
///     .text("Hello, world!")
///     .instruct("a bright, cheerful voice")
///     .build()?;
/// let audio = engine.synthesize_voice_design(&request)?;
/// audio.write_wav(std::path::Path::new("hello.wav"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct QwenEngine {
    lifecycle: ModelLifecycle,
}

impl QwenEngine {
    pub fn new(loader: impl ModelLoader + 'static, config: BridgeConfig) -> Self {
        Self::with_registry(loader, config, Registry::default())
    }

    pub fn with_registry(
        loader: impl ModelLoader + 'static,
        config: BridgeConfig,
        registry: Registry,
    ) -> Self {
        Self {
            lifecycle: ModelLifecycle::new(registry, Box::new(loader), config),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        self.lifecycle.config()
    }

    pub fn registry(&self) -> &Registry {
        self.lifecycle.registry()
    }

    /// Load a model for `mode` (default mode if absent or unknown).
    ///
    /// `strict` keeps fallback candidates within the requested mode.
    pub fn load_model(
        &self,
        mode: Option<&str>,
        model_id: Option<&str>,
        strict: bool,
    ) -> Result<LoadStatus, BridgeError> {
        let mode = self.resolve_mode(mode);
        let model_id = self.registry().resolve_model(mode, model_id);
        self.lifecycle.load(mode, &model_id, strict)
    }

    /// The (mode, model) currently active, if any.
    pub fn active_model(&self) -> Option<Candidate> {
        self.lifecycle.active()
    }

    pub fn synthesize_voice_design(
        &self,
        request: &VoiceDesignRequest,
    ) -> Result<SynthesizedAudio, BridgeError> {
        validate_text(&request.text)?;
        let language = self.language(request.language.as_deref());

        self.run(
            Mode::VoiceDesign,
            request.model_id.as_deref(),
            request.sample_rate,
            |model| generate::voice_design(model, &request.text, &language, &request.instruct),
        )
    }

    pub fn synthesize_custom_voice(
        &self,
        request: &CustomVoiceRequest,
    ) -> Result<SynthesizedAudio, BridgeError> {
        validate_text(&request.text)?;
        let language = self.language(request.language.as_deref());
        let speaker = request
            .speaker
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.config().default_speaker);

        self.run(
            Mode::CustomVoice,
            request.model_id.as_deref(),
            request.sample_rate,
            |model| {
                generate::custom_voice(
                    model,
                    &request.text,
                    &language,
                    speaker,
                    request.instruct.as_deref(),
                )
            },
        )
    }

    pub fn synthesize_voice_clone(
        &self,
        request: &VoiceCloneRequest,
    ) -> Result<SynthesizedAudio, BridgeError> {
        validate_text(&request.text)?;
        if request.reference_audio.is_empty() {
            return Err(BridgeError::InvalidInput(
                "reference_audio must not be empty".into(),
            ));
        }
        let language = self.language(request.language.as_deref());

        self.run(
            Mode::VoiceClone,
            request.model_id.as_deref(),
            request.sample_rate,
            |model| {
                generate::voice_clone(model, &request.text, &language, &request.reference_audio)
            },
        )
    }

    /// Preset speakers of the custom voice model. Empty for other modes or
    /// when the model cannot be loaded or enumerated.
    pub fn supported_speakers(&self, mode: Option<&str>, model_id: Option<&str>) -> Vec<String> {
        let mode = self.resolve_mode(mode);
        if mode != Mode::CustomVoice {
            return Vec::new();
        }
        let model_id = self.registry().resolve_model(mode, model_id);

        let speakers = match self.lifecycle.with_model(mode, &model_id, true, |model| {
            model.supported_speakers()
        }) {
            Ok(Some((_, speakers))) => speakers.unwrap_or_default(),
            Ok(None) => return Vec::new(),
            Err(err) => {
                log::warn!("Cannot list speakers: {err}");
                return Vec::new();
            }
        };
        speakers.into_iter().filter(|s| !s.is_empty()).collect()
    }

    pub fn supported_speakers_csv(&self, mode: Option<&str>, model_id: Option<&str>) -> String {
        self.supported_speakers(mode, model_id).join(",")
    }

    /// One-line `key=value | key=value` summary of the runtime setup.
    pub fn runtime_diagnostics(&self) -> String {
        let config = self.config();
        let mut details = vec![
            (
                "crate".to_string(),
                format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            ),
            ("os".to_string(), std::env::consts::OS.to_string()),
            ("arch".to_string(), std::env::consts::ARCH.to_string()),
            ("device_map".to_string(), config.load.device_map.clone()),
            ("dtype".to_string(), config.load.precision.as_str().to_string()),
            (
                "attn_implementation".to_string(),
                config
                    .load
                    .attn_implementation
                    .clone()
                    .unwrap_or_else(|| "default".to_string()),
            ),
            (
                "model_home".to_string(),
                config
                    .model_home
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            (
                "active".to_string(),
                self.active_model()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string()),
            ),
        ];
        details.extend(self.lifecycle.loader().diagnostics());

        details
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn resolve_mode(&self, mode: Option<&str>) -> Mode {
        self.registry().resolve_mode(mode, self.config().default_mode)
    }

    fn language(&self, requested: Option<&str>) -> String {
        requested
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.config().default_language)
            .to_string()
    }

    fn run<F>(
        &self,
        mode: Mode,
        model_override: Option<&str>,
        sample_rate: u32,
        generate: F,
    ) -> Result<SynthesizedAudio, BridgeError>
    where
        F: FnOnce(&mut LoadedModel) -> Option<Vec<u8>>,
    {
        let model_id = self.registry().resolve_model(mode, model_override);
        let generated = self.lifecycle.with_model(mode, &model_id, false, generate)?;
        audio_or_fallback(generated, mode, self.config().allow_fallback, sample_rate)
    }
}

impl SynthesisEngine for QwenEngine {
    type Request = SynthesisRequest;

    fn unload_model(&self) -> bool {
        self.lifecycle.unload()
    }

    fn is_model_loaded(&self) -> bool {
        self.lifecycle.is_loaded()
    }

    fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedAudio, BridgeError> {
        match request {
            SynthesisRequest::VoiceDesign(r) => self.synthesize_voice_design(r),
            SynthesisRequest::CustomVoice(r) => self.synthesize_custom_voice(r),
            SynthesisRequest::VoiceClone(r) => self.synthesize_voice_clone(r),
        }
    }
}

/// Wrap what the active model generated; when no audio resulted, return
/// silence if `allow_fallback`, else fail.
///
/// `generated` is `None` when no model could be loaded.
pub(crate) fn audio_or_fallback(
    generated: Option<(Candidate, Option<Vec<u8>>)>,
    mode: Mode,
    allow_fallback: bool,
    sample_rate: u32,
) -> Result<SynthesizedAudio, BridgeError> {
    let reason = match generated {
        Some((candidate, Some(wav))) => return Ok(SynthesizedAudio::from_model(wav, candidate)),
        Some((_, None)) => FallbackReason::NoAudio,
        None => FallbackReason::ModelUnavailable,
    };

    if allow_fallback {
        log::warn!("{mode} synthesis produced no audio ({reason:?}), returning silence");
        return SynthesizedAudio::silence(sample_rate, reason);
    }
    Err(BridgeError::SynthesisFailed { mode })
}

pub(crate) fn validate_text(text: &str) -> Result<(), BridgeError> {
    if text.trim().is_empty() {
        return Err(BridgeError::InvalidInput("text must not be empty".into()));
    }
    Ok(())
}
