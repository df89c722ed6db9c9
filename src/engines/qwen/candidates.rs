use std::collections::HashSet;
use std::fmt;

use super::registry::{Mode, Registry};

/// One attempt to load a model: the mode it will serve and its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub mode: Mode,
    pub model_id: String,
}

impl Candidate {
    pub fn new(mode: Mode, model_id: impl Into<String>) -> Self {
        Self {
            mode,
            model_id: model_id.into(),
        }
    }

    pub fn matches(&self, mode: Mode, model_id: &str) -> bool {
        self.mode == mode && self.model_id == model_id
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.mode, self.model_id)
    }
}

/// Ordered, deduplicated load attempts for a request.
///
/// The requested model comes first, then the rest of `mode`'s registry
/// list. Unless `strict`, and only when `cross_mode` is enabled, models
/// from every other mode follow as last resorts.
pub fn build_candidates(
    registry: &Registry,
    mode: Mode,
    requested_model: &str,
    strict: bool,
    cross_mode: bool,
) -> Vec<Candidate> {
    let mut ordered = Vec::new();

    if !requested_model.is_empty() {
        ordered.push(Candidate::new(mode, requested_model));
    }

    for model_id in registry.models(mode) {
        if model_id != requested_model {
            ordered.push(Candidate::new(mode, model_id.as_str()));
        }
    }

    if !strict && cross_mode {
        for (other_mode, models) in registry.iter() {
            if other_mode == mode {
                continue;
            }
            for model_id in models {
                if ordered.iter().any(|c| &c.model_id == model_id) {
                    continue;
                }
                ordered.push(Candidate::new(other_mode, model_id.as_str()));
            }
        }
    }

    let mut seen = HashSet::new();
    ordered.retain(|candidate| seen.insert(candidate.clone()));
    ordered
}
