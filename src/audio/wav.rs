use std::io::Cursor;

use super::output::SampleTree;
use super::AudioError;

/// Flatten nested samples into one continuous mono stream.
///
/// A single-item batch `[[...]]` is unwrapped; a multi-item batch has its
/// inner sequences concatenated in order.
pub fn normalize(tree: SampleTree) -> Vec<f32> {
    let unbatched = match tree {
        SampleTree::List(mut items) if matches!(items.first(), Some(SampleTree::List(_))) => {
            if items.len() == 1 {
                items.pop().unwrap_or(SampleTree::List(Vec::new()))
            } else {
                let mut joined = Vec::new();
                for item in items {
                    match item {
                        SampleTree::List(inner) => joined.extend(inner),
                        scalar => joined.push(scalar),
                    }
                }
                SampleTree::List(joined)
            }
        }
        other => other,
    };

    let mut samples = Vec::new();
    flatten_into(unbatched, &mut samples);
    samples
}

fn flatten_into(tree: SampleTree, out: &mut Vec<f32>) {
    match tree {
        SampleTree::Scalar(value) => out.push(value as f32),
        SampleTree::List(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
    }
}

/// Encode samples as a mono 16-bit PCM WAV container.
///
/// Samples are clipped to [-1.0, 1.0] and scaled with
/// `round(sample * 32767)`.
pub fn to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buffer = Vec::with_capacity(44 + samples.len() * 2);
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec)?;
        for &sample in samples {
            let clipped = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
            writer.write_sample((clipped * i16::MAX as f32).round() as i16)?;
        }
        writer.finalize()?;
    }
    Ok(buffer)
}

/// A zero-valued clip of `seconds` length (at least one frame).
pub fn silent_wav(sample_rate: u32, seconds: f64) -> Result<Vec<u8>, AudioError> {
    let frames = ((sample_rate as f64 * seconds).round() as usize).max(1);
    to_wav(&vec![0.0; frames], sample_rate)
}

/// Sample rate from a WAV header, if the bytes parse as WAV.
pub fn wav_sample_rate(bytes: &[u8]) -> Option<u32> {
    hound::WavReader::new(Cursor::new(bytes))
        .ok()
        .map(|reader| reader.spec().sample_rate)
}

pub fn wav_duration_secs(bytes: &[u8]) -> Option<f64> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as f64 / sample_rate as f64)
}
