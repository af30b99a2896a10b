use super::{Simulation, StateSnapshot};
use crate::config::{FallbackReward, SimConfig};
use crate::grid::{Cell, Grid};
use crate::model::{decide, Action, DecisionModel};
use crate::resource::{RawResource, ResourceDataset};
use crate::session::AgentSession;

impl Simulation {
    /// Advance every active session by one tick, in activation order.
    ///
    /// Sessions at their goal idle. Ids without a loaded model or a session
    /// are skipped.
    pub fn step(&mut self) -> StateSnapshot {
        let mut advanced = 0usize;
        for id in &self.active {
            let Some(model) = self.models.get(id) else {
                continue;
            };
            let Some(session) = self.sessions.get_mut(id) else {
                continue;
            };
            advance(
                session,
                model.as_ref(),
                &self.grid,
                &self.dataset,
                &self.config,
            );
            advanced += 1;
        }
        tracing::debug!(active = self.active.len(), advanced, "tick");
        self.snapshot()
    }
}

pub(crate) fn advance(
    session: &mut AgentSession,
    model: &dyn DecisionModel,
    grid: &Grid,
    dataset: &ResourceDataset,
    config: &SimConfig,
) {
    if session.at_goal() {
        return;
    }
    let action = decide(model, grid, session.position);
    let next = apply_action(grid, session.position, action);
    session.position = next;
    if session.visit(next) && grid.is_resource(next) {
        session.credit(pickup_reward(dataset, grid, config, next));
    }
}

/// Move one cell along the action's axis. A move past the far edge is a no-op.
pub fn apply_action(grid: &Grid, from: Cell, action: Action) -> Cell {
    match action {
        Action::AdvanceRow if from.row + 1 < grid.height() => Cell::new(from.col, from.row + 1),
        Action::AdvanceCol if from.col + 1 < grid.width() => Cell::new(from.col + 1, from.row),
        _ => from,
    }
}

/// Reward for landing on a resource cell for the first time.
///
/// Raw coordinates are rescaled by the current grid size and compared with
/// `cell`; the first match in dataset order is worth
/// `floor((x + y) * pickup_multiplier)` capped at `pickup_cap`. Without a
/// match the configured fallback applies. Never negative.
pub fn pickup_reward(
    dataset: &ResourceDataset,
    grid: &Grid,
    config: &SimConfig,
    cell: Cell,
) -> f64 {
    let width = grid.width() as f64;
    let height = grid.height() as f64;
    let col = cell.col as f64;
    let row = cell.row as f64;

    let mut last: Option<&RawResource> = None;
    for resource in dataset.resources() {
        last = Some(resource);
        if (resource.x * width).trunc() == col && (resource.y * height).trunc() == row {
            let value = ((resource.x + resource.y) * config.pickup_multiplier).floor();
            return value.min(config.pickup_cap).max(0.0);
        }
    }

    let basis = match config.fallback_reward {
        FallbackReward::AtPosition => grid
            .resources()
            .iter()
            .position(|&c| c == cell)
            .and_then(|i| dataset.resources().get(i)),
        FallbackReward::LastScanned => last,
        FallbackReward::Disabled => None,
    };
    basis.map_or(0.0, |r| {
        (r.x * config.fallback_x_weight + r.y * config.fallback_y_weight).max(0.0)
    })
}
