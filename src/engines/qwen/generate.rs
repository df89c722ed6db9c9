use std::io::Write;

use crate::audio::{into_payload, ModelOutput, DEFAULT_MODEL_SAMPLE_RATE};

use super::model::{
    CustomVoiceArgs, LoadedModel, ModelError, ReferenceArg, VoiceCloneArgs, VoiceDesignArgs,
};

#[derive(Debug, Clone, Copy)]
enum CloneMethod {
    VoiceClone,
    Base,
}

impl CloneMethod {
    fn name(&self) -> &'static str {
        match self {
            CloneMethod::VoiceClone => "generate_voice_clone",
            CloneMethod::Base => "generate_base",
        }
    }
}

/// Keep `requested` if the model supports it (or cannot say), otherwise
/// use the model's first supported speaker.
pub fn resolve_speaker(requested: &str, supported: &[String]) -> String {
    match supported.first() {
        Some(first) if !supported.iter().any(|s| s == requested) => {
            log::info!("Speaker {requested:?} not supported, using {first:?}");
            first.clone()
        }
        _ => requested.to_string(),
    }
}

pub(crate) fn voice_design(
    model: &mut LoadedModel,
    text: &str,
    language: &str,
    instruct: &str,
) -> Option<Vec<u8>> {
    if !model.capabilities().voice_design {
        log::warn!("Active model cannot run voice design");
        return None;
    }
    let args = VoiceDesignArgs {
        text,
        language,
        instruct,
    };
    render(model.model_mut().generate_voice_design(&args), "voice design")
}

pub(crate) fn custom_voice(
    model: &mut LoadedModel,
    text: &str,
    language: &str,
    speaker: &str,
    instruct: Option<&str>,
) -> Option<Vec<u8>> {
    if !model.capabilities().custom_voice {
        log::warn!("Active model cannot run custom voice");
        return None;
    }

    let requested = speaker.to_lowercase();
    let speaker = match model.supported_speakers() {
        Some(supported) => resolve_speaker(&requested, &supported),
        None => requested,
    };

    let mut args = CustomVoiceArgs {
        text,
        language,
        speaker: &speaker,
        instruct: instruct.filter(|i| !i.is_empty()),
    };
    let mut output = model.model_mut().generate_custom_voice(&args);
    let rejected = matches!(&output, Err(ModelError::UnexpectedArgument(_)));
    if rejected && args.instruct.is_some() {
        log::debug!("Model rejected custom voice arguments, retrying without instruct");
        args.instruct = None;
        output = model.model_mut().generate_custom_voice(&args);
    }
    render(output, "custom voice")
}

/// The reference clip is written to a temporary file that is removed when
/// this returns.
pub(crate) fn voice_clone(
    model: &mut LoadedModel,
    text: &str,
    language: &str,
    reference_audio: &[u8],
) -> Option<Vec<u8>> {
    let reference_file = match write_reference(reference_audio) {
        Ok(file) => file,
        Err(err) => {
            log::warn!("Could not persist reference audio: {err}");
            return None;
        }
    };
    let path = reference_file.path();

    let attempts = [
        (CloneMethod::VoiceClone, ReferenceArg::ReferenceAudio(path)),
        (CloneMethod::VoiceClone, ReferenceArg::PromptAudio(path)),
        (CloneMethod::Base, ReferenceArg::PromptAudio(path)),
    ];

    let capabilities = model.capabilities();
    for (method, reference) in attempts {
        let available = match method {
            CloneMethod::VoiceClone => capabilities.voice_clone,
            CloneMethod::Base => capabilities.base,
        };
        if !available {
            continue;
        }

        let args = VoiceCloneArgs {
            text,
            language,
            reference,
        };
        let output = match method {
            CloneMethod::VoiceClone => model.model_mut().generate_voice_clone(&args),
            CloneMethod::Base => model.model_mut().generate_base(&args),
        };
        if let Err(ModelError::UnexpectedArgument(name)) = &output {
            log::debug!(
                "{}({}) rejected argument {name:?}",
                method.name(),
                reference.name()
            );
            continue;
        }
        if let Some(wav) = render(output, method.name()) {
            return Some(wav);
        }
    }

    None
}

fn write_reference(audio: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("qwen-tts-reference-")
        .suffix(".wav")
        .tempfile()?;
    file.write_all(audio)?;
    file.flush()?;
    Ok(file)
}

/// Turn a generation result into WAV bytes. Failures are logged and
/// reported as no audio.
fn render(output: Result<ModelOutput, ModelError>, what: &str) -> Option<Vec<u8>> {
    let output = match output {
        Ok(output) => output,
        Err(err) => {
            log::warn!("{what} generation failed: {err}");
            return None;
        }
    };

    match into_payload(output, DEFAULT_MODEL_SAMPLE_RATE).and_then(|payload| {
        payload.map(|payload| payload.into_wav()).transpose()
    }) {
        Ok(Some(wav)) => Some(wav),
        Ok(None) => {
            log::warn!("{what} generation returned no audio");
            None
        }
        Err(err) => {
            log::warn!("{what} output could not be encoded: {err}");
            None
        }
    }
}
