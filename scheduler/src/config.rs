use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::framework::{FrameworkError, Profile};

const APISERVER_HOST: &str = "localhost";
const APISERVER_PORT: u16 = 7620;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
    #[error("failed to read profile {path}: {source}")]
    ProfileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse profile {path}: {source}")]
    ProfileParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid scheduler profile: {0}")]
    Profile(#[from] FrameworkError),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub apiserver: String,
    pub profile: Profile,
}

pub fn load_config() -> Result<Config, ConfigError> {
    Config::from_lookup(|var| env::var(var).ok())
}

impl Config {
    /// Builds the config from `lookup`, which resolves variable names the
    /// way the process environment would.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("SCHEDULER_APISERVER_HOST").unwrap_or_else(|| APISERVER_HOST.to_string());

        let port = match lookup("SCHEDULER_APISERVER_PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidVar {
                var: "SCHEDULER_APISERVER_PORT",
                value,
            })?,
            None => APISERVER_PORT,
        };

        let profile = match lookup("SCHEDULER_PROFILE") {
            Some(path) => load_profile(Path::new(&path))?,
            None => Profile::default(),
        };

        Ok(Config {
            apiserver: format!("http://{}:{}", host, port),
            profile,
        })
    }
}

/// Reads a JSON scheduler profile from disk.
pub fn load_profile(path: &Path) -> Result<Profile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ProfileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::ProfileParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use serde_json::json;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.apiserver, "http://localhost:7620");
        assert_eq!(config.profile, Profile::default());
    }

    #[test]
    fn test_bad_port() {
        let res = Config::from_lookup(lookup(&[("SCHEDULER_APISERVER_PORT", "http")]));
        assert!(matches!(res, Err(ConfigError::InvalidVar { var: "SCHEDULER_APISERVER_PORT", .. })));
    }

    #[test]
    fn test_profile_from_file() {
        let path = env::temp_dir().join(format!("energy-profile-{}.json", uuid::Uuid::new_v4()));
        let profile = json!({
            "plugins": [{ "name": "EnergyScore", "weight": 2, "args": { "weightMultiplier": 2.5 } }]
        });
        std::fs::write(&path, profile.to_string()).unwrap();

        let config = Config::from_lookup(lookup(&[
            ("SCHEDULER_APISERVER_HOST", "apiserver"),
            ("SCHEDULER_APISERVER_PORT", "8080"),
            ("SCHEDULER_PROFILE", path.to_str().unwrap()),
        ]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.apiserver, "http://apiserver:8080");
        assert_eq!(config.profile.plugins[0].weight, 2);
        assert_eq!(config.profile.plugins[0].args, json!({ "weightMultiplier": 2.5 }));
    }

    #[test]
    fn test_missing_profile_file() {
        let res = Config::from_lookup(lookup(&[("SCHEDULER_PROFILE", "/nonexistent/profile.json")]));
        assert!(matches!(res, Err(ConfigError::ProfileRead { .. })));
    }
}
