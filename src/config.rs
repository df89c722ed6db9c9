//! Bridge configuration.
//!
//! A [`BridgeConfig`] can be built in code, read from the process
//! environment with [`BridgeConfig::from_env`], or loaded from a JSON file
//! with [`BridgeConfig::from_json_file`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engines::qwen::Mode;
use crate::BridgeError;

/// Numeric precision hint passed to the model runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    #[default]
    Float32,
    Float16,
    BFloat16,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Float32 => "float32",
            Precision::Float16 => "float16",
            Precision::BFloat16 => "bfloat16",
        }
    }
}

impl FromStr for Precision {
    type Err = std::convert::Infallible;

    /// Unknown names degrade to `float32`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "float16" => Precision::Float16,
            "bfloat16" => Precision::BFloat16,
            _ => Precision::Float32,
        })
    }
}

/// Options handed to the model-creation capability for every candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Device placement hint (e.g. `"cpu"`, `"mps"`, `"cuda:0"`).
    pub device_map: String,
    pub precision: Precision,
    /// Optional attention implementation hint (e.g. `"sdpa"`).
    pub attn_implementation: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            device_map: "cpu".to_string(),
            precision: Precision::default(),
            attn_implementation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Mode used when a request names none or an unknown one.
    pub default_mode: Mode,
    pub default_language: String,
    pub default_speaker: String,
    /// Return a short silence clip instead of failing when no model loads
    /// or a model yields no audio.
    pub allow_fallback: bool,
    /// Try models registered under other modes once the requested mode's
    /// models are exhausted.
    pub allow_cross_mode_fallback: bool,
    pub load: LoadOptions,
    /// Load every model from this path instead of its identifier.
    pub local_model_path: Option<PathBuf>,
    /// Directory holding a `models/` folder of locally cached models.
    pub model_home: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::VoiceDesign,
            default_language: "English".to_string(),
            default_speaker: "ryan".to_string(),
            allow_fallback: false,
            allow_cross_mode_fallback: true,
            load: LoadOptions::default(),
            local_model_path: None,
            model_home: None,
        }
    }
}

impl BridgeConfig {
    /// Read configuration from `QWEN_TTS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, using the same
    /// keys as [`BridgeConfig::from_env`]. Unset or empty keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(mode) = get("QWEN_TTS_MODE") {
            match mode.parse() {
                Ok(parsed) => config.default_mode = parsed,
                Err(_) => log::warn!(
                    "Unknown QWEN_TTS_MODE {mode:?}, keeping {}",
                    config.default_mode
                ),
            }
        }
        if let Some(language) = get("QWEN_TTS_LANGUAGE") {
            config.default_language = language;
        }
        if let Some(speaker) = get("QWEN_TTS_SPEAKER") {
            config.default_speaker = speaker;
        }
        if let Some(flag) = get("QWEN_TTS_ALLOW_FALLBACK") {
            config.allow_fallback = flag.trim() == "1";
        }
        if let Some(flag) = get("QWEN_TTS_ALLOW_CROSS_MODE_FALLBACK") {
            config.allow_cross_mode_fallback = flag.trim() == "1";
        }
        if let Some(device_map) = get("QWEN_TTS_DEVICE_MAP") {
            config.load.device_map = device_map;
        }
        if let Some(dtype) = get("QWEN_TTS_DTYPE") {
            config.load.precision = dtype.parse().unwrap_or_default();
        }
        config.load.attn_implementation = get("QWEN_TTS_ATTN_IMPLEMENTATION");
        config.local_model_path = get("QWEN_TTS_LOCAL_MODEL_PATH").map(PathBuf::from);
        config.model_home = get("QWEN_TTS_MODEL_HOME").map(PathBuf::from);

        config
    }

    pub fn from_json_file(path: &Path) -> Result<Self, BridgeError> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", path.display())))
    }

    /// Resolve where a model identifier should be loaded from.
    ///
    /// An explicit `local_model_path` wins, then
    /// `<model_home>/models/<basename>` when that directory exists, else the
    /// identifier itself.
    pub fn model_source(&self, model_id: &str) -> String {
        if let Some(path) = &self.local_model_path {
            return path.display().to_string();
        }

        if let Some(home) = &self.model_home {
            let basename = model_id.rsplit('/').next().unwrap_or(model_id);
            let local = home.join("models").join(basename);
            if local.is_dir() {
                return local.display().to_string();
            }
        }

        model_id.to_string()
    }
}
