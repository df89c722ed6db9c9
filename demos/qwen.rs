use std::path::PathBuf;
use std::time::Instant;

use qwen_tts_bridge::{
    audio::ModelOutput,
    config::{BridgeConfig, LoadOptions},
    engines::qwen::{
        Capabilities, CustomVoiceArgs, CustomVoiceRequest, ModelError, QwenEngine,
        SynthesisRequest, TtsModel, VoiceDesignArgs, VoiceDesignRequest,
    },
    AudioOrigin, SynthesisEngine,
};

/// Stand-in runtime that hums a sine tone, one short note per word.
struct ToneModel {
    sample_rate: u32,
}

impl ToneModel {
    fn hum(&self, text: &str, pitch: f32) -> ModelOutput {
        let note = self.sample_rate as usize / 8;
        let samples = (0..text.split_whitespace().count() * note)
            .map(|i| {
                let t = i as f32 / self.sample_rate as f32;
                0.3 * (2.0 * std::f32::consts::PI * pitch * t).sin()
            })
            .collect::<Vec<f32>>();
        ModelOutput::with_rate(ModelOutput::from(samples), self.sample_rate)
    }
}

impl TtsModel for ToneModel {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            voice_design: true,
            custom_voice: true,
            speaker_list: true,
            ..Default::default()
        }
    }

    fn generate_voice_design(
        &mut self,
        args: &VoiceDesignArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        let pitch = if args.instruct.contains("low") { 140.0 } else { 260.0 };
        Ok(self.hum(args.text, pitch))
    }

    fn generate_custom_voice(
        &mut self,
        args: &CustomVoiceArgs<'_>,
    ) -> Result<ModelOutput, ModelError> {
        let pitch = if args.speaker == "serena" { 330.0 } else { 180.0 };
        Ok(self.hum(args.text, pitch))
    }

    fn supported_speakers(&mut self) -> Result<Vec<String>, ModelError> {
        Ok(vec!["ryan".to_string(), "serena".to_string()])
    }
}

fn load_tone_model(source: &str, options: &LoadOptions) -> Result<Box<dyn TtsModel>, ModelError> {
    log::info!("Creating tone model for {source} on {}", options.device_map);
    Ok(Box::new(ToneModel {
        sample_rate: 24_000,
    }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let engine = QwenEngine::new(load_tone_model, BridgeConfig::from_env());
    println!("Runtime: {}", engine.runtime_diagnostics());
    println!(
        "Speakers: {}",
        engine.supported_speakers_csv(Some("custom_voice"), None)
    );

    let text = "Hello! This is a Qwen3-TTS bridge demo speaking through a stand-in model.";

    let design = VoiceDesignRequest::builder()
        .text(text)
        .instruct("a calm, low-pitched narrator")
        .build()?;
    let synth_start = Instant::now();
    let result = engine.synthesize_voice_design(&design)?;
    let synth_dur = synth_start.elapsed();
    let audio_duration = result.duration_secs().unwrap_or_default();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:?})",
        audio_duration, synth_dur, result.origin
    );

    let custom = CustomVoiceRequest::builder()
        .text(text)
        .speaker("Serena")
        .build()?;
    let result = engine.synthesize(&SynthesisRequest::from(custom.clone()))?;
    match &result.origin {
        AudioOrigin::Model(candidate) => println!("Custom voice from {candidate}"),
        AudioOrigin::Silence(reason) => println!("Custom voice fell back to silence: {reason:?}"),
    }

    engine.synthesize_to_file(&custom.into(), &PathBuf::from("output.wav"))?;
    println!("Saved to output.wav");

    engine.unload_model();
    Ok(())
}
