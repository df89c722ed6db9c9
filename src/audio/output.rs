use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::wav::{normalize, to_wav};
use super::AudioError;

/// Arbitrarily nested numeric samples, e.g. `[[0.1, -0.2]]` for a
/// single-item batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleTree {
    Scalar(f64),
    List(Vec<SampleTree>),
}

impl SampleTree {
    pub fn from_samples(samples: &[f32]) -> Self {
        SampleTree::List(
            samples
                .iter()
                .map(|&s| SampleTree::Scalar(s as f64))
                .collect(),
        )
    }
}

/// Device-resident or framework-owned arrays that can be copied into a
/// plain nested numeric structure on the host.
pub trait TensorLike: fmt::Debug + Send {
    fn to_host_array(&self) -> Result<SampleTree, AudioError>;
}

#[cfg(feature = "ndarray")]
impl TensorLike for ndarray::ArrayD<f32> {
    fn to_host_array(&self) -> Result<SampleTree, AudioError> {
        Ok(view_to_tree(self.view()))
    }
}

#[cfg(feature = "ndarray")]
fn view_to_tree(view: ndarray::ArrayViewD<'_, f32>) -> SampleTree {
    if view.ndim() == 0 {
        let value = view.iter().next().copied().unwrap_or(0.0);
        return SampleTree::Scalar(value as f64);
    }
    SampleTree::List(view.outer_iter().map(view_to_tree).collect())
}

/// Raw value returned by a model's generation method.
#[derive(Debug)]
pub enum ModelOutput {
    None,
    /// Already-encoded audio container bytes.
    Bytes(Vec<u8>),
    Samples(SampleTree),
    Tensor(Box<dyn TensorLike>),
    /// Ordered tuple; `(payload, sample_rate)` when it has two elements and
    /// the second is numeric.
    Tuple(Vec<ModelOutput>),
    /// Named fields; audio under `wav`, rate under `sampling_rate` or
    /// `sample_rate`.
    Mapping(HashMap<String, ModelOutput>),
}

impl ModelOutput {
    /// A `(payload, sample_rate)` pair.
    pub fn with_rate(payload: ModelOutput, sample_rate: u32) -> Self {
        ModelOutput::Tuple(vec![
            payload,
            ModelOutput::Samples(SampleTree::Scalar(sample_rate as f64)),
        ])
    }

    pub fn mapping<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ModelOutput)>,
    {
        ModelOutput::Mapping(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            ModelOutput::Samples(SampleTree::Scalar(value)) => Some(*value),
            _ => None,
        }
    }
}

impl From<Vec<f32>> for ModelOutput {
    fn from(samples: Vec<f32>) -> Self {
        ModelOutput::Samples(SampleTree::from_samples(&samples))
    }
}

impl From<SampleTree> for ModelOutput {
    fn from(tree: SampleTree) -> Self {
        ModelOutput::Samples(tree)
    }
}

impl From<Vec<u8>> for ModelOutput {
    fn from(bytes: Vec<u8>) -> Self {
        ModelOutput::Bytes(bytes)
    }
}

/// Canonical audio produced by [`into_payload`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioPayload {
    /// Passed through untouched; assumed to already be a valid container.
    Encoded(Vec<u8>),
    Samples { samples: Vec<f32>, sample_rate: u32 },
}

impl AudioPayload {
    pub fn into_wav(self) -> Result<Vec<u8>, AudioError> {
        match self {
            AudioPayload::Encoded(bytes) => Ok(bytes),
            AudioPayload::Samples {
                samples,
                sample_rate,
            } => to_wav(&samples, sample_rate),
        }
    }
}

/// Split a model's return value into its audio payload and effective
/// sample rate.
pub fn extract(output: ModelOutput, default_sample_rate: u32) -> (ModelOutput, u32) {
    match output {
        ModelOutput::Mapping(mut fields) => {
            let sample_rate = fields
                .get("sampling_rate")
                .or_else(|| fields.get("sample_rate"))
                .and_then(ModelOutput::as_number)
                .and_then(rate_from_number)
                .unwrap_or(default_sample_rate);
            let payload = fields.remove("wav").unwrap_or(ModelOutput::None);
            (payload, sample_rate)
        }
        ModelOutput::Tuple(mut items) if items.len() == 2 && items[1].as_number().is_some() => {
            let sample_rate = items[1]
                .as_number()
                .and_then(rate_from_number)
                .unwrap_or(default_sample_rate);
            items.truncate(1);
            let payload = items.pop().unwrap_or(ModelOutput::None);
            (payload, sample_rate)
        }
        other => (other, default_sample_rate),
    }
}

/// Extract and normalize a model output. `Ok(None)` means the model
/// returned no audio at all.
pub fn into_payload(
    output: ModelOutput,
    default_sample_rate: u32,
) -> Result<Option<AudioPayload>, AudioError> {
    let (payload, sample_rate) = extract(output, default_sample_rate);
    match payload {
        ModelOutput::None => Ok(None),
        ModelOutput::Bytes(bytes) => Ok(Some(AudioPayload::Encoded(bytes))),
        other => {
            let tree = to_tree(other)?;
            Ok(Some(AudioPayload::Samples {
                samples: normalize(tree),
                sample_rate,
            }))
        }
    }
}

fn to_tree(output: ModelOutput) -> Result<SampleTree, AudioError> {
    match output {
        ModelOutput::Samples(tree) => Ok(tree),
        ModelOutput::Tensor(tensor) => tensor.to_host_array(),
        ModelOutput::Tuple(items) => Ok(SampleTree::List(
            items.into_iter().map(to_tree).collect::<Result<_, _>>()?,
        )),
        ModelOutput::None => Err(AudioError::Malformed("missing value inside samples".into())),
        ModelOutput::Bytes(_) => Err(AudioError::Malformed(
            "encoded bytes nested inside samples".into(),
        )),
        ModelOutput::Mapping(_) => Err(AudioError::Malformed(
            "mapping nested inside samples".into(),
        )),
    }
}

fn rate_from_number(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 1.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}
