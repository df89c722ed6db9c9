use std::path::Path;

use crate::audio::ModelOutput;
use crate::config::LoadOptions;

use super::registry::Mode;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("Model does not provide {0}")]
    Unsupported(&'static str),
    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),
    #[error("Model runtime unavailable: {0}")]
    Unavailable(String),
    #[error("Generation failed: {0}")]
    Failed(String),
}

/// Optional methods a loaded model provides. Queried once, right after the
/// model is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub voice_design: bool,
    pub custom_voice: bool,
    pub voice_clone: bool,
    /// Base-model generation with a prompt audio clip.
    pub base: bool,
    pub speaker_list: bool,
}

impl Capabilities {
    pub fn supports(&self, mode: Mode) -> bool {
        match mode {
            Mode::VoiceDesign => self.voice_design,
            Mode::CustomVoice => self.custom_voice,
            Mode::VoiceClone => self.voice_clone || self.base,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VoiceDesignArgs<'a> {
    pub text: &'a str,
    pub language: &'a str,
    pub instruct: &'a str,
}

#[derive(Debug, Clone, Copy)]
pub struct CustomVoiceArgs<'a> {
    pub text: &'a str,
    pub language: &'a str,
    pub speaker: &'a str,
    pub instruct: Option<&'a str>,
}

/// Reference clip for voice cloning, under the argument name the model
/// is asked to accept it as.
#[derive(Debug, Clone, Copy)]
pub enum ReferenceArg<'a> {
    ReferenceAudio(&'a Path),
    PromptAudio(&'a Path),
}

impl<'a> ReferenceArg<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceArg::ReferenceAudio(_) => "reference_audio",
            ReferenceArg::PromptAudio(_) => "prompt_audio",
        }
    }

    pub fn path(&self) -> &'a Path {
        match self {
            ReferenceArg::ReferenceAudio(path) | ReferenceArg::PromptAudio(path) => path,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VoiceCloneArgs<'a> {
    pub text: &'a str,
    pub language: &'a str,
    pub reference: ReferenceArg<'a>,
}

/// A loaded text-to-speech model.
///
/// Every generation method is optional; [`TtsModel::capabilities`]
/// declares which ones are implemented. A method that cannot accept one
/// of its arguments returns [`ModelError::UnexpectedArgument`] so callers
/// can retry with a different argument set.
pub trait TtsModel: Send {
    fn capabilities(&self) -> Capabilities;

    fn generate_voice_design(
        &mut self,
        _args: &VoiceDesignArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        Err(ModelError::Unsupported("generate_voice_design"))
    }

    fn generate_custom_voice(
        &mut self,
        _args: &CustomVoiceArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        Err(ModelError::Unsupported("generate_custom_voice"))
    }

    fn generate_voice_clone(
        &mut self,
        _args: &VoiceCloneArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        Err(ModelError::Unsupported("generate_voice_clone"))
    }

    fn generate_base(&mut self, _args: &VoiceCloneArgs<'_>) -> Result<ModelOutput, ModelError> {
        Err(ModelError::Unsupported("generate_base"))
    }

    fn supported_speakers(&mut self) -> Result<Vec<String>, ModelError> {
        Err(ModelError::Unsupported("supported_speakers"))
    }
}

/// Creates models from an identifier or local path.
///
/// Creation may block for a long time (downloads, device allocation).
pub trait ModelLoader: Send + Sync {
    fn create(&self, source: &str, options: &LoadOptions)
        -> Result<Box<dyn TtsModel>, ModelError>;

    /// Extra `key=value` pairs for runtime diagnostics.
    fn diagnostics(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

impl<F> ModelLoader for F
where
    F: Fn(&str, &LoadOptions) -> Result<Box<dyn TtsModel>, ModelError> + Send + Sync,
{
    fn create(
        &self,
        source: &str,
        options: &LoadOptions,
    ) -> Result<Box<dyn TtsModel>, ModelError> {
        self(source, options)
    }
}

/// A created model together with the capabilities it declared at load.
pub struct LoadedModel {
    model: Box<dyn TtsModel>,
    capabilities: Capabilities,
}

impl LoadedModel {
    pub fn new(model: Box<dyn TtsModel>) -> Self {
        let capabilities = model.capabilities();
        Self {
            model,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn model_mut(&mut self) -> &mut dyn TtsModel {
        self.model.as_mut()
    }

    /// Speakers the model reports, or `None` when it cannot enumerate them.
    pub fn supported_speakers(&mut self) -> Option<Vec<String>> {
        if !self.capabilities.speaker_list {
            return None;
        }
        match self.model.supported_speakers() {
            Ok(speakers) => Some(speakers),
            Err(err) => {
                log::warn!("Speaker query failed: {err}");
                None
            }
        }
    }
}
