//! Ranks nodes by the decimal value of their `energy-score` label, scaled by
//! a configured multiplier.
//!
//! A node without the label, or whose label is not a number, scores zero
//! instead of failing the cycle.

use serde::{Deserialize, Serialize};
use shared::models::Pod;

use crate::framework::{
    CycleState, FrameworkError, Handle, Plugin, PluginArgs, ScoreExtensions, ScorePlugin, Status,
};

pub const NAME: &str = "EnergyScore";

/// Node label holding the raw energy score.
pub const ENERGY_SCORE_LABEL: &str = "energy-score";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnergyScoreArgs {
    #[serde(default = "default_weight_multiplier")]
    pub weight_multiplier: f64,
}

fn default_weight_multiplier() -> f64 {
    1.0
}

impl Default for EnergyScoreArgs {
    fn default() -> Self {
        Self {
            weight_multiplier: default_weight_multiplier(),
        }
    }
}

pub struct EnergyScore {
    handle: Handle,
    weight_multiplier: f64,
}

impl EnergyScore {
    pub fn new(args: EnergyScoreArgs, handle: Handle) -> Self {
        tracing::debug!(plugin = NAME, weight_multiplier = args.weight_multiplier, "Created");
        Self {
            handle,
            weight_multiplier: args.weight_multiplier,
        }
    }

    /// Truncates toward zero. Labels outside the `f64` range, and the
    /// `inf`/`NaN` spellings, count as unparseable.
    fn compute(&self, node_name: &str, raw: Option<&str>) -> i64 {
        let Some(raw) = raw else {
            tracing::debug!(node=%node_name, "No energy score label, scoring zero");
            return 0;
        };
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => (value * self.weight_multiplier) as i64,
            Ok(value) => {
                tracing::debug!(node=%node_name, %raw, %value, "Energy score label out of range, scoring zero");
                0
            }
            Err(err) => {
                tracing::debug!(node=%node_name, %raw, error=%err, "Unparseable energy score label, scoring zero");
                0
            }
        }
    }
}

/// Builds the plugin from profile arguments.
pub fn factory(args: &PluginArgs, handle: Handle) -> Result<Box<dyn ScorePlugin>, FrameworkError> {
    let args = EnergyScoreArgs::deserialize(args).map_err(|err| FrameworkError::ArgsMismatch {
        plugin: NAME.to_string(),
        reason: err.to_string(),
    })?;
    Ok(Box::new(EnergyScore::new(args, handle)))
}

impl Plugin for EnergyScore {
    fn name(&self) -> &str {
        NAME
    }
}

impl ScorePlugin for EnergyScore {
    fn score(&self, _state: &CycleState, _pod: &Pod, node_name: &str) -> (i64, Status) {
        let info = match self.handle.snapshot_shared_lister().get(node_name) {
            Ok(info) => info,
            Err(err) => return (0, Status::error(err.to_string())),
        };
        let score = self.compute(node_name, info.node().label(ENERGY_SCORE_LABEL));
        (score, Status::success())
    }

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        None
    }
}
