//! Maps plugin names to constructors and builds the plugins a profile enables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{FrameworkError, Handle, ScorePlugin, WeightedPlugin};
use crate::plugins::energyscore;

/// Raw, not yet decoded plugin arguments as they appear in the profile.
pub type PluginArgs = Value;

/// Decodes `args` and builds the plugin, failing if they have the wrong shape.
pub type PluginFactory = fn(&PluginArgs, Handle) -> Result<Box<dyn ScorePlugin>, FrameworkError>;

/// Score plugins enabled for the scheduler, in evaluation order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    pub plugins: Vec<PluginConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PluginConfig {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
    #[serde(default = "empty_args")]
    pub args: PluginArgs,
}

fn default_weight() -> i64 {
    1
}

fn empty_args() -> PluginArgs {
    Value::Object(Map::new())
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            plugins: vec![PluginConfig {
                name: energyscore::NAME.to_string(),
                weight: default_weight(),
                args: empty_args(),
            }],
        }
    }
}

#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, PluginFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every plugin shipped in this crate.
    pub fn in_tree() -> Self {
        let mut factories: HashMap<String, PluginFactory> = HashMap::new();
        factories.insert(energyscore::NAME.to_string(), energyscore::factory);
        Self { factories }
    }

    pub fn register(&mut self, name: &str, factory: PluginFactory) -> Result<(), FrameworkError> {
        if self.factories.contains_key(name) {
            return Err(FrameworkError::DuplicatePlugin(name.to_string()));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    pub fn build(&self, profile: &Profile, handle: &Handle) -> Result<Vec<WeightedPlugin>, FrameworkError> {
        profile
            .plugins
            .iter()
            .map(|cfg| -> Result<WeightedPlugin, FrameworkError> {
                let factory = self
                    .factories
                    .get(&cfg.name)
                    .ok_or_else(|| FrameworkError::UnknownPlugin(cfg.name.clone()))?;
                let plugin = factory(&cfg.args, handle.clone())?;
                tracing::debug!(plugin=%cfg.name, weight=cfg.weight, "Enabled score plugin");
                Ok(WeightedPlugin {
                    plugin,
                    weight: cfg.weight,
                })
            })
            .collect()
    }
}
