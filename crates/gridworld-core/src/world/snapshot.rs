use crate::grid::Cell;
use crate::session::AgentSession;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub grid_size_x: usize,
    pub grid_size_y: usize,
    pub resources: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct StateSnapshot {
    pub active_models: Vec<String>,
    pub states: BTreeMap<String, AgentSession>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivationResult {
    pub success: bool,
    #[serde(flatten)]
    pub state: StateSnapshot,
}
