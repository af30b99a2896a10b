use crate::grid::{Cell, Grid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One model's independent walk across the grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSession {
    #[serde(rename = "agent_pos")]
    pub position: Cell,
    /// Distinct cells in visit order, starting at the origin.
    pub path: Vec<Cell>,
    #[serde(rename = "goal_pos")]
    pub goal: Cell,
    pub reward: f64,
}

impl AgentSession {
    /// Canonical start: origin, path `[origin]`, goal at the far corner, zero reward.
    pub fn start(grid: &Grid) -> Self {
        Self {
            position: Cell::ORIGIN,
            path: vec![Cell::ORIGIN],
            goal: grid.goal(),
            reward: 0.0,
        }
    }

    pub fn at_goal(&self) -> bool {
        self.position == self.goal
    }

    /// Append `cell` unless already visited. Returns whether the path grew.
    pub fn visit(&mut self, cell: Cell) -> bool {
        if self.path.contains(&cell) {
            return false;
        }
        self.path.push(cell);
        true
    }

    /// Add a non-negative increment; negative or NaN increments are ignored.
    pub fn credit(&mut self, amount: f64) {
        if amount > 0.0 {
            self.reward += amount;
        }
    }
}

/// Sessions keyed by model id. Entries outlive deactivation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionStore {
    sessions: BTreeMap<String, AgentSession>,
}

impl SessionStore {
    pub fn get(&self, id: &str) -> Option<&AgentSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut AgentSession> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Replace whatever was stored for `id` with a fresh start.
    pub fn restart(&mut self, id: &str, grid: &Grid) {
        self.sessions
            .insert(id.to_string(), AgentSession::start(grid));
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AgentSession)> {
        self.sessions.iter().map(|(id, s)| (id.as_str(), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::with_size(4, 3, Vec::new()).unwrap()
    }

    #[test]
    fn start_state() {
        let s = AgentSession::start(&grid());
        assert_eq!(s.position, Cell::ORIGIN);
        assert_eq!(s.path, vec![Cell::ORIGIN]);
        assert_eq!(s.goal, Cell::new(3, 2));
        assert_eq!(s.reward, 0.0);
        assert!(!s.at_goal());
    }

    #[test]
    fn visit_skips_duplicates() {
        let mut s = AgentSession::start(&grid());
        assert!(s.visit(Cell::new(1, 0)));
        assert!(!s.visit(Cell::new(1, 0)));
        assert!(!s.visit(Cell::ORIGIN));
        assert_eq!(s.path.len(), 2);
    }

    #[test]
    fn credit_never_decreases_reward() {
        let mut s = AgentSession::start(&grid());
        s.credit(2.5);
        s.credit(-4.0);
        s.credit(f64::NAN);
        assert_eq!(s.reward, 2.5);
    }

    #[test]
    fn serializes_with_wire_names() {
        let s = AgentSession::start(&Grid::with_size(2, 2, Vec::new()).unwrap());
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "agent_pos": [0, 0],
                "path": [[0, 0]],
                "goal_pos": [1, 1],
                "reward": 0.0,
            })
        );
    }

    #[test]
    fn restart_discards_previous_state() {
        let g = grid();
        let mut store = SessionStore::default();
        store.restart("m", &g);
        if let Some(s) = store.get_mut("m") {
            s.visit(Cell::new(0, 1));
            s.credit(3.0);
        }
        store.restart("m", &g);
        assert_eq!(store.get("m"), Some(&AgentSession::start(&g)));
        assert_eq!(store.len(), 1);
    }
}
