//! Grid-world agent simulation: resource normalization, per-model sessions,
//! the decision oracle and the single-step transition.

pub mod config;
pub mod grid;
pub mod model;
pub mod nn;
pub mod resource;
pub mod session;
pub mod world;

pub use config::{FallbackReward, SimConfig, SimConfigError};
pub use grid::{Cell, Grid};
pub use model::{
    Action, DecisionModel, ModelDirectory, ModelLoadError, ModelSource, NetworkShape,
    TrainedModel, UntrainedModel,
};
pub use resource::{DataError, RawResource, ResourceDataset};
pub use session::{AgentSession, SessionStore};
pub use world::{ActivationResult, GridSnapshot, Simulation, StateSnapshot};
