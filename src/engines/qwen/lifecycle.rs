use std::time::Instant;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::BridgeConfig;
use crate::BridgeError;

use super::candidates::{build_candidates, Candidate};
use super::model::{LoadedModel, ModelLoader};
use super::registry::{Mode, Registry};

/// Result of a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// The (mode, model) that was actually loaded.
    Loaded(Candidate),
    /// No candidate loaded, but fallback output is allowed.
    Degraded,
}

impl LoadStatus {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            LoadStatus::Loaded(candidate) => Some(candidate),
            LoadStatus::Degraded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded(_))
    }
}

struct ActiveModel {
    candidate: Candidate,
    model: Mutex<LoadedModel>,
}

type State = Option<ActiveModel>;

/// Owns the single active model and every transition of it.
///
/// The model never leaves this type. Generation runs under the read side
/// of the state lock and transitions take the write side, so a load or
/// unload waits for in-flight generation and the previous model is dropped
/// before the next one is created.
pub struct ModelLifecycle {
    registry: Registry,
    loader: Box<dyn ModelLoader>,
    config: BridgeConfig,
    state: RwLock<State>,
}

impl ModelLifecycle {
    pub fn new(registry: Registry, loader: Box<dyn ModelLoader>, config: BridgeConfig) -> Self {
        Self {
            registry,
            loader,
            config,
            state: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn loader(&self) -> &dyn ModelLoader {
        self.loader.as_ref()
    }

    /// Make `model_id` active for `mode`, falling back through the
    /// candidate list.
    ///
    /// An already-active identical pair returns immediately without
    /// reloading. The active pair afterwards is the candidate that loaded,
    /// which may differ from the request.
    pub fn load(&self, mode: Mode, model_id: &str, strict: bool) -> Result<LoadStatus, BridgeError> {
        let mut state = self.state.write();
        self.activate(&mut state, mode, model_id, strict)
    }

    /// Like [`ModelLifecycle::load`] in non-strict mode.
    pub fn ensure_loaded(&self, mode: Mode, model_id: &str) -> Result<LoadStatus, BridgeError> {
        self.load(mode, model_id, false)
    }

    /// Load exactly one model with no fallback candidates.
    pub fn load_exact(&self, candidate: &Candidate) -> Result<LoadStatus, BridgeError> {
        let mut state = self.state.write();
        self.activate_exact(&mut state, candidate)
    }

    /// Load as [`ModelLifecycle::load`] does, then run `f` on the model
    /// that loaded. No transition can happen between the two.
    ///
    /// Returns `None` when loading degraded.
    pub fn with_model<T, F>(
        &self,
        mode: Mode,
        model_id: &str,
        strict: bool,
        f: F,
    ) -> Result<Option<(Candidate, T)>, BridgeError>
    where
        F: FnOnce(&mut LoadedModel) -> T,
    {
        let mut state = self.state.write();
        self.activate(&mut state, mode, model_id, strict)?;
        Ok(run_on(RwLockWriteGuard::downgrade(state), f))
    }

    /// [`ModelLifecycle::with_model`] for a single pinned candidate.
    pub fn with_exact_model<T, F>(
        &self,
        candidate: &Candidate,
        f: F,
    ) -> Result<Option<(Candidate, T)>, BridgeError>
    where
        F: FnOnce(&mut LoadedModel) -> T,
    {
        let mut state = self.state.write();
        self.activate_exact(&mut state, candidate)?;
        Ok(run_on(RwLockWriteGuard::downgrade(state), f))
    }

    pub fn unload(&self) -> bool {
        let mut state = self.state.write();
        if let Some(active) = state.take() {
            log::info!("Unloading model {}", active.candidate);
        }
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn active(&self) -> Option<Candidate> {
        self.state
            .read()
            .as_ref()
            .map(|active| active.candidate.clone())
    }

    fn activate(
        &self,
        state: &mut State,
        mode: Mode,
        model_id: &str,
        strict: bool,
    ) -> Result<LoadStatus, BridgeError> {
        if let Some(status) = already_active(state, mode, model_id) {
            return Ok(status);
        }
        let candidates = build_candidates(
            &self.registry,
            mode,
            model_id,
            strict,
            self.config.allow_cross_mode_fallback,
        );
        self.load_first(state, &candidates)
    }

    fn activate_exact(
        &self,
        state: &mut State,
        candidate: &Candidate,
    ) -> Result<LoadStatus, BridgeError> {
        if let Some(status) = already_active(state, candidate.mode, &candidate.model_id) {
            return Ok(status);
        }
        self.load_first(state, std::slice::from_ref(candidate))
    }

    fn load_first(
        &self,
        state: &mut State,
        candidates: &[Candidate],
    ) -> Result<LoadStatus, BridgeError> {
        // Drop the previous model before instantiating the next one.
        *state = None;

        for candidate in candidates {
            let source = self.config.model_source(&candidate.model_id);
            let started = Instant::now();
            match self.loader.create(&source, &self.config.load) {
                Ok(model) => {
                    log::info!(
                        "Loaded model {candidate} from {source:?} in {:.2?}",
                        started.elapsed()
                    );
                    *state = Some(ActiveModel {
                        candidate: candidate.clone(),
                        model: Mutex::new(LoadedModel::new(model)),
                    });
                    return Ok(LoadStatus::Loaded(candidate.clone()));
                }
                Err(err) => {
                    log::warn!(
                        "Model load failed for {candidate} in {:.2?}: {err}",
                        started.elapsed()
                    );
                }
            }
        }

        if self.config.allow_fallback {
            log::warn!(
                "No model could be loaded from {} candidate(s); continuing with fallback output",
                candidates.len()
            );
            Ok(LoadStatus::Degraded)
        } else {
            Err(BridgeError::RuntimeUnavailable {
                attempts: candidates.len(),
            })
        }
    }
}

fn already_active(state: &State, mode: Mode, model_id: &str) -> Option<LoadStatus> {
    let active = state
        .as_ref()
        .filter(|active| active.candidate.matches(mode, model_id))?;
    log::debug!("Model already loaded: {}", active.candidate);
    Some(LoadStatus::Loaded(active.candidate.clone()))
}

fn run_on<T, F>(state: RwLockReadGuard<'_, State>, f: F) -> Option<(Candidate, T)>
where
    F: FnOnce(&mut LoadedModel) -> T,
{
    let active = state.as_ref()?;
    let mut model = active.model.lock();
    Some((active.candidate.clone(), f(&mut *model)))
}
