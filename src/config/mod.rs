//! Configuration for watchers and claim batching.
//!
//! Hierarchical loading with:
//! - Default values as code base
//! - Configuration file named by `DEAL_OBSERVER_CONFIG`
//! - Environment variable overrides (`DEAL_OBSERVER__SECTION__FIELD`)
mod claim;
mod watch;

pub use claim::*;
pub use watch::*;


use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Environment variable holding an optional TOML config path
pub const CONFIG_PATH_ENV: &str = "DEAL_OBSERVER_CONFIG";
/// Prefix of per-field environment overrides
pub const ENV_PREFIX: &str = "DEAL_OBSERVER";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ObserverConfig {
    /// Polling behaviour of task and deal watchers
    #[serde(default)]
    pub watch: WatchConfig,
    /// Per-item costs used to size claim batches
    #[serde(default)]
    pub claim: ClaimConfig,
}

impl ObserverConfig {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults
    /// 2. File named by `DEAL_OBSERVER_CONFIG` (if set)
    /// 3. Environment variables with `DEAL_OBSERVER__` prefix
    ///
    /// Callers should call [`validate`](Self::validate) once all overrides are applied.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(Self::environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers `path` over the current values, then re-applies environment overrides.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Self> {
        self.watch.validate()?;
        self.claim.validate()?;
        Ok(self)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .ignore_empty(true)
            .try_parsing(true)
    }
}
