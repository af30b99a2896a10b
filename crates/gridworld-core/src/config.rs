use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// How a pickup without an exact rescaled dataset match is rewarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReward {
    /// Weight the raw coordinates of the resource lying on the agent's cell.
    #[default]
    AtPosition,
    /// Weight the raw coordinates of the last resource enumerated by the scan.
    LastScanned,
    /// No reward.
    #[serde(rename = "none")]
    Disabled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Multiplier applied to raw coordinates before truncating to cells.
    pub scale: f64,
    pub hidden_size: usize,
    pub action_count: usize,
    pub pickup_multiplier: f64,
    /// Upper bound on a single pickup's reward.
    pub pickup_cap: f64,
    pub fallback_x_weight: f64,
    pub fallback_y_weight: f64,
    pub fallback_reward: FallbackReward,
    /// Mixed with the model identifier to seed untrained networks.
    pub seed: u64,
    pub grid_width: Option<usize>,
    pub grid_height: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scale: 100.0,
            hidden_size: 128,
            action_count: 2,
            pickup_multiplier: 50.0,
            pickup_cap: 10.0,
            fallback_x_weight: 40.0,
            fallback_y_weight: 50.0,
            fallback_reward: FallbackReward::default(),
            seed: 0,
            grid_width: None,
            grid_height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidScale(f64),
    ZeroHiddenSize,
    TooFewActions(usize),
    InvalidPickupCap(f64),
    ZeroGridDimension,
    PartialGridOverride,
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidScale(v) => {
                write!(f, "scale must be finite and positive (got {v})")
            }
            SimConfigError::ZeroHiddenSize => write!(f, "hidden_size must be positive"),
            SimConfigError::TooFewActions(n) => {
                write!(f, "action_count must be at least 2 (got {n})")
            }
            SimConfigError::InvalidPickupCap(v) => {
                write!(f, "pickup_cap must be finite and positive (got {v})")
            }
            SimConfigError::ZeroGridDimension => {
                write!(f, "grid_width and grid_height must be positive")
            }
            SimConfigError::PartialGridOverride => {
                write!(f, "grid_width and grid_height must be set together")
            }
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimConfigError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SimConfigError::InvalidScale(self.scale));
        }
        if self.hidden_size == 0 {
            return Err(SimConfigError::ZeroHiddenSize);
        }
        if self.action_count < 2 {
            return Err(SimConfigError::TooFewActions(self.action_count));
        }
        if !self.pickup_cap.is_finite() || self.pickup_cap <= 0.0 {
            return Err(SimConfigError::InvalidPickupCap(self.pickup_cap));
        }
        match (self.grid_width, self.grid_height) {
            (Some(0), _) | (_, Some(0)) => Err(SimConfigError::ZeroGridDimension),
            (Some(_), None) | (None, Some(_)) => Err(SimConfigError::PartialGridOverride),
            _ => Ok(()),
        }
    }

    /// Explicit `(width, height)` when both overrides are present.
    pub fn grid_override(&self) -> Option<(usize, usize)> {
        self.grid_width.zip(self.grid_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let config = SimConfig {
            scale: 0.0,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(SimConfigError::InvalidScale(0.0)));
    }

    #[test]
    fn rejects_single_action() {
        let config = SimConfig {
            action_count: 1,
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(SimConfigError::TooFewActions(1)));
    }

    #[test]
    fn grid_override_requires_both_dimensions() {
        let config = SimConfig {
            grid_width: Some(3),
            ..SimConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SimConfigError::PartialGridOverride)
        );

        let config = SimConfig {
            grid_width: Some(3),
            grid_height: Some(0),
            ..SimConfig::default()
        };
        assert_eq!(config.validate(), Err(SimConfigError::ZeroGridDimension));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{"scale": 10.0, "fallback_reward": "last_scanned"}"#)
                .unwrap();
        assert_eq!(config.scale, 10.0);
        assert_eq!(config.hidden_size, 128);
        assert_eq!(config.fallback_reward, FallbackReward::LastScanned);
        assert_eq!(config.grid_override(), None);
    }
}
