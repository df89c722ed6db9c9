use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BridgeError;

pub const DEFAULT_VOICE_DESIGN_MODEL: &str = "Qwen/Qwen3-TTS-12Hz-1.7B-VoiceDesign";
pub const DEFAULT_CUSTOM_VOICE_MODEL: &str = "Qwen/Qwen3-TTS-12Hz-0.6B-CustomVoice";
pub const DEFAULT_VOICE_CLONE_MODEL: &str = "Qwen/Qwen3-TTS-12Hz-0.6B-Base";

/// Synthesis mode. Selects the generation capability and the default model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Voice described by a free-form style instruction.
    VoiceDesign,
    /// One of the model's preset speakers.
    CustomVoice,
    /// Voice cloned from reference audio.
    VoiceClone,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::VoiceDesign, Mode::CustomVoice, Mode::VoiceClone];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::VoiceDesign => "voice_design",
            Mode::CustomVoice => "custom_voice",
            Mode::VoiceClone => "voice_clone",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("unknown synthesis mode {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Known model identifiers per mode. The first entry of each list is the
/// mode's default; list order is fallback order.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<(Mode, Vec<String>)>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            entries: vec![
                (Mode::VoiceDesign, vec![DEFAULT_VOICE_DESIGN_MODEL.to_string()]),
                (
                    Mode::CustomVoice,
                    vec![
                        DEFAULT_CUSTOM_VOICE_MODEL.to_string(),
                        "Qwen/Qwen3-TTS-12Hz-1.7B-CustomVoice".to_string(),
                    ],
                ),
                (
                    Mode::VoiceClone,
                    vec![
                        DEFAULT_VOICE_CLONE_MODEL.to_string(),
                        "Qwen/Qwen3-TTS-12Hz-1.7B-Base".to_string(),
                    ],
                ),
            ],
        }
    }
}

impl Registry {
    /// Build a custom registry. Every mode must appear exactly once with at
    /// least one non-blank identifier.
    pub fn new(entries: Vec<(Mode, Vec<String>)>) -> Result<Self, BridgeError> {
        for mode in Mode::ALL {
            match entries.iter().filter(|(m, _)| *m == mode).count() {
                1 => {}
                0 => return Err(BridgeError::Config(format!("registry has no {mode} entry"))),
                _ => {
                    return Err(BridgeError::Config(format!(
                        "registry lists {mode} more than once"
                    )))
                }
            }
        }
        for (mode, models) in &entries {
            if models.is_empty() || models.iter().any(|id| id.trim().is_empty()) {
                return Err(BridgeError::Config(format!(
                    "registry entry for {mode} must list non-blank model identifiers"
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn models(&self, mode: Mode) -> &[String] {
        self.entries
            .iter()
            .find(|(m, _)| *m == mode)
            .map(|(_, models)| models.as_slice())
            .unwrap_or(&[])
    }

    pub fn default_model(&self, mode: Mode) -> &str {
        self.models(mode)
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Entries in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (Mode, &[String])> {
        self.entries
            .iter()
            .map(|(mode, models)| (*mode, models.as_slice()))
    }

    /// Match a requested mode name case-insensitively. Absent or unknown
    /// names map to `default`.
    pub fn resolve_mode(&self, requested: Option<&str>, default: Mode) -> Mode {
        let Some(name) = requested.filter(|name| !name.trim().is_empty()) else {
            return default;
        };
        match name.parse::<Mode>() {
            Ok(mode) => mode,
            Err(err) => {
                log::warn!("{err}, using {default}");
                default
            }
        }
    }

    /// The requested identifier if non-blank, else the mode's default.
    pub fn resolve_model(&self, mode: Mode, requested: Option<&str>) -> String {
        match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self.default_model(mode).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_first_entry_for_every_mode() {
        let registry = Registry::default();
        for (mode, models) in registry.iter() {
            assert_eq!(registry.resolve_model(mode, Some("")), models[0]);
            assert_eq!(registry.resolve_model(mode, None), models[0]);
            assert_eq!(registry.resolve_model(mode, Some("   ")), models[0]);
        }
        assert_eq!(
            registry.default_model(Mode::CustomVoice),
            DEFAULT_CUSTOM_VOICE_MODEL
        );
    }

    #[test]
    fn explicit_model_wins() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve_model(Mode::VoiceClone, Some(" my/model ")),
            "my/model"
        );
    }

    #[test]
    fn mode_names_are_case_insensitive() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve_mode(Some("  Custom_VOICE "), Mode::VoiceDesign),
            Mode::CustomVoice
        );
        assert_eq!("voice_clone".parse::<Mode>(), Ok(Mode::VoiceClone));
    }

    #[test]
    fn unknown_or_absent_mode_uses_default() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve_mode(Some("karaoke"), Mode::CustomVoice),
            Mode::CustomVoice
        );
        assert_eq!(registry.resolve_mode(None, Mode::VoiceClone), Mode::VoiceClone);
        assert_eq!(registry.resolve_mode(Some(""), Mode::VoiceDesign), Mode::VoiceDesign);
    }

    #[test]
    fn custom_registry_is_validated() {
        let ok = Registry::new(vec![
            (Mode::VoiceClone, vec!["c".into()]),
            (Mode::VoiceDesign, vec!["d".into()]),
            (Mode::CustomVoice, vec!["v1".into(), "v2".into()]),
        ])
        .unwrap();
        assert_eq!(ok.default_model(Mode::CustomVoice), "v1");
        assert_eq!(ok.iter().next().map(|(mode, _)| mode), Some(Mode::VoiceClone));

        assert!(Registry::new(vec![(Mode::VoiceDesign, vec!["d".into()])]).is_err());
        assert!(Registry::new(vec![
            (Mode::VoiceDesign, vec!["d".into()]),
            (Mode::CustomVoice, vec![]),
            (Mode::VoiceClone, vec!["c".into()]),
        ])
        .is_err());
    }
}
