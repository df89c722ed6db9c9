//! Scripted model and loader used by the engine tests.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::audio::{ModelOutput, SampleTree};
use crate::config::LoadOptions;

use super::model::{
    Capabilities, CustomVoiceArgs, ModelError, ModelLoader, TtsModel, VoiceCloneArgs,
    VoiceDesignArgs,
};

#[derive(Debug, Clone)]
pub enum Reply {
    Samples(Vec<f32>, Option<u32>),
    Bytes(Vec<u8>),
    Nothing,
    Fail,
}

impl Reply {
    fn render(&self) -> Result<ModelOutput, ModelError> {
        match self {
            Reply::Samples(samples, None) => Ok(ModelOutput::Samples(SampleTree::List(vec![
                SampleTree::from_samples(samples),
            ]))),
            Reply::Samples(samples, Some(rate)) => Ok(ModelOutput::mapping([
                ("wav", ModelOutput::from(samples.clone())),
                ("sampling_rate", ModelOutput::Samples(SampleTree::Scalar(*rate as f64))),
            ])),
            Reply::Bytes(bytes) => Ok(ModelOutput::Bytes(bytes.clone())),
            Reply::Nothing => Ok(ModelOutput::None),
            Reply::Fail => Err(ModelError::Failed("scripted failure".into())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelScript {
    pub capabilities: Capabilities,
    pub speakers: Vec<String>,
    pub reply: Reply,
    /// Reject calls that carry a style instruction.
    pub reject_instruct: bool,
    /// Argument name `generate_voice_clone` accepts; anything else is
    /// rejected as unexpected.
    pub clone_argument: &'static str,
}

impl Default for ModelScript {
    fn default() -> Self {
        Self {
            capabilities: Capabilities {
                voice_design: true,
                custom_voice: true,
                voice_clone: true,
                base: true,
                speaker_list: true,
            },
            speakers: vec!["ryan".to_string(), "serena".to_string()],
            reply: Reply::Samples(vec![0.25, -0.5, 1.5], None),
            reject_instruct: false,
            clone_argument: "reference_audio",
        }
    }
}

#[derive(Default)]
struct Recorder {
    failing: HashSet<String>,
    fail_all: bool,
    attempts: Vec<String>,
    created: Vec<String>,
    last_options: Option<LoadOptions>,
    calls: Vec<String>,
    reference_paths: Vec<PathBuf>,
    load_delay: Option<Duration>,
    alive: Vec<String>,
    peak_alive: usize,
}

#[derive(Clone)]
pub struct FakeLoader {
    script: Arc<Mutex<ModelScript>>,
    recorder: Arc<Mutex<Recorder>>,
}

impl FakeLoader {
    pub fn new(script: ModelScript) -> Self {
        Self {
            script: Arc::new(Mutex::new(script)),
            recorder: Arc::default(),
        }
    }

    pub fn fail(&self, source: &str) {
        self.recorder.lock().failing.insert(source.to_string());
    }

    pub fn fail_all(&self) {
        self.recorder.lock().fail_all = true;
    }

    pub fn attempts(&self) -> Vec<String> {
        self.recorder.lock().attempts.clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.recorder.lock().created.clone()
    }

    pub fn last_options(&self) -> Option<LoadOptions> {
        self.recorder.lock().last_options.clone()
    }

    /// Generation calls seen by every model this loader created.
    pub fn calls(&self) -> Vec<String> {
        self.recorder.lock().calls.clone()
    }

    /// Reference clip paths handed to voice-clone generation.
    pub fn reference_paths(&self) -> Vec<PathBuf> {
        self.recorder.lock().reference_paths.clone()
    }

    /// Make every `create` call block for `delay` first.
    pub fn slow(&self, delay: Duration) {
        self.recorder.lock().load_delay = Some(delay);
    }

    /// Sources of the model instances that have not been dropped yet.
    pub fn alive(&self) -> Vec<String> {
        self.recorder.lock().alive.clone()
    }

    /// Largest number of instances that were ever alive at once.
    pub fn peak_alive(&self) -> usize {
        self.recorder.lock().peak_alive
    }
}

impl ModelLoader for FakeLoader {
    fn create(
        &self,
        source: &str,
        options: &LoadOptions,
    ) -> Result<Box<dyn TtsModel>, ModelError> {
        let delay = self.recorder.lock().load_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        let mut recorder = self.recorder.lock();
        recorder.attempts.push(source.to_string());
        recorder.last_options = Some(options.clone());
        if recorder.fail_all || recorder.failing.contains(source) {
            return Err(ModelError::Unavailable(format!("cannot load {source}")));
        }
        recorder.created.push(source.to_string());
        recorder.alive.push(source.to_string());
        recorder.peak_alive = recorder.peak_alive.max(recorder.alive.len());
        Ok(Box::new(FakeModel {
            source: source.to_string(),
            script: self.script.lock().clone(),
            recorder: self.recorder.clone(),
        }))
    }

    fn diagnostics(&self) -> Vec<(String, String)> {
        vec![("runtime".to_string(), "fake".to_string())]
    }
}

struct FakeModel {
    source: String,
    script: ModelScript,
    recorder: Arc<Mutex<Recorder>>,
}

impl Drop for FakeModel {
    fn drop(&mut self) {
        let mut recorder = self.recorder.lock();
        if let Some(index) = recorder.alive.iter().position(|s| *s == self.source) {
            recorder.alive.remove(index);
        }
    }
}

impl FakeModel {
    fn record(&self, call: String) {
        self.recorder.lock().calls.push(call);
    }
}

impl TtsModel for FakeModel {
    fn capabilities(&self) -> Capabilities {
        self.script.capabilities
    }

    fn generate_voice_design(
        &mut self,
        args: &VoiceDesignArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        self.record(format!(
            "voice_design text={} language={} instruct={}",
            args.text, args.language, args.instruct
        ));
        self.script.reply.render()
    }

    fn generate_custom_voice(
        &mut self,
        args: &CustomVoiceArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        self.record(format!(
            "custom_voice speaker={} language={} instruct={}",
            args.speaker,
            args.language,
            args.instruct.unwrap_or("-")
        ));
        if self.script.reject_instruct && args.instruct.is_some() {
            return Err(ModelError::UnexpectedArgument("instruct".into()));
        }
        self.script.reply.render()
    }

    fn generate_voice_clone(
        &mut self,
        args: &VoiceCloneArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        let reference = std::fs::read(args.reference.path()).unwrap_or_default();
        self.recorder
            .lock()
            .reference_paths
            .push(args.reference.path().to_path_buf());
        self.record(format!(
            "voice_clone {}={} bytes",
            args.reference.name(),
            reference.len()
        ));
        if args.reference.name() != self.script.clone_argument {
            return Err(ModelError::UnexpectedArgument(args.reference.name().into()));
        }
        self.script.reply.render()
    }

    fn generate_base(&mut self, args: &VoiceCloneArgs<'_>) -> Result<ModelOutput, ModelError> {
        self.record(format!("base {}", args.reference.name()));
        self.script.reply.render()
    }

    fn supported_speakers(&mut self) -> Result<Vec<String>, ModelError> {
        Ok(self.script.speakers.clone())
    }
}
