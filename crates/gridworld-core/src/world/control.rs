use super::{ActivationResult, Simulation, StateSnapshot};
use crate::model::{DecisionModel, UntrainedModel};

impl Simulation {
    /// Return every active session to the canonical start. Inactive sessions are untouched.
    pub fn reset(&mut self) -> StateSnapshot {
        for id in &self.active {
            if self.sessions.contains(id) {
                self.sessions.restart(id, &self.grid);
            }
        }
        self.snapshot()
    }

    /// Replace the active set with the resolvable subset of `ids`.
    ///
    /// Unknown ids are dropped, as are repeats of an id already accepted.
    /// Each survivor gets a model (loaded on first use, untrained if the
    /// artifact is unusable) and a fresh session. Never fails.
    pub fn activate<I, S>(&mut self, ids: I) -> ActivationResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut active: Vec<String> = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if active.iter().any(|a| a == id) {
                continue;
            }
            if !self.source.resolve(id) {
                tracing::debug!(model = id, "ignoring unknown model");
                continue;
            }
            self.ensure_model(id);
            self.sessions.restart(id, &self.grid);
            active.push(id.to_string());
        }
        self.active = active;

        ActivationResult {
            success: true,
            state: self.snapshot(),
        }
    }

    /// Identifiers the model source can offer.
    pub fn list_models(&self) -> Vec<String> {
        self.source.list()
    }

    fn ensure_model(&mut self, id: &str) {
        if self.models.contains_key(id) {
            return;
        }
        let shape = self.network_shape();
        let model: Box<dyn DecisionModel> = match self.source.load(id, shape) {
            Ok(model) => {
                tracing::info!(model = id, kind = model.name(), "loaded decision model");
                model
            }
            Err(err) => {
                tracing::warn!(model = id, error = %err, "falling back to untrained model");
                Box::new(UntrainedModel::for_id(id, shape, self.config.seed))
            }
        };
        self.models.insert(id.to_string(), model);
    }
}
