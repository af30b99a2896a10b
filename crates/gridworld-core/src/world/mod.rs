pub mod control;
pub mod snapshot;
pub mod step;

pub use snapshot::*;

use crate::config::SimConfig;
use crate::grid::Grid;
use crate::model::{DecisionModel, ModelSource, NetworkShape};
use crate::resource::{DataError, ResourceDataset};
use crate::session::{AgentSession, SessionStore};
use std::collections::HashMap;

/// Process-scoped simulation state: the static grid and dataset, every
/// session, the active model ids and the loaded-model cache.
///
/// All mutation goes through [`Simulation::step`], [`Simulation::reset`] and
/// [`Simulation::activate`]. Callers sharing one instance across threads must
/// serialize access to it.
pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) dataset: ResourceDataset,
    pub(crate) grid: Grid,
    pub(crate) sessions: SessionStore,
    pub(crate) active: Vec<String>,
    /// Loaded once per id and never reloaded.
    pub(crate) models: HashMap<String, Box<dyn DecisionModel>>,
    pub(crate) source: Box<dyn ModelSource>,
}

impl Simulation {
    pub fn try_new(
        dataset: ResourceDataset,
        config: SimConfig,
        source: Box<dyn ModelSource>,
    ) -> Result<Self, DataError> {
        let grid = Grid::from_dataset(&dataset, &config)?;
        Ok(Self {
            config,
            dataset,
            grid,
            sessions: SessionStore::default(),
            active: Vec::new(),
            models: HashMap::new(),
            source,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active_models(&self) -> &[String] {
        &self.active
    }

    pub fn session(&self, id: &str) -> Option<&AgentSession> {
        self.sessions.get(id)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn is_model_loaded(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    pub(crate) fn network_shape(&self) -> NetworkShape {
        NetworkShape {
            input: self.grid.cell_count(),
            hidden: self.config.hidden_size,
            actions: self.config.action_count,
        }
    }

    pub fn grid_snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            grid_size_x: self.grid.width(),
            grid_size_y: self.grid.height(),
            resources: self.grid.resources().to_vec(),
        }
    }

    /// Active ids plus every stored session, including deactivated ones.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            active_models: self.active.clone(),
            states: self
                .sessions
                .iter()
                .map(|(id, s)| (id.to_string(), s.clone()))
                .collect(),
        }
    }
}
