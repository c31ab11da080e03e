//! Resolver configuration.
//!
//! Loaded from YAML with every field optional. Budget limits can be
//! overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `AUTOCRAFT_MAX_ITERATIONS` | `max_iterations` |
//! | `AUTOCRAFT_MAX_DURATION_MS` | `max_duration_ms` |

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::budget::RunBudget;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Limits applied to every resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ResolverConfig {
    /// Pattern attempts allowed per run (0 = none).
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,

    /// Wall-clock budget per run in milliseconds (0 = no deadline).
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,

    /// Deepest active path the resolver will craft through.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_duration_ms: default_max_duration_ms(),
            max_depth: default_max_depth(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. An empty document yields
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Override budget limits with environment variables when set.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(val) = env_u64("AUTOCRAFT_MAX_ITERATIONS") {
            self.max_iterations = val;
        }
        if let Some(val) = env_u64("AUTOCRAFT_MAX_DURATION_MS") {
            self.max_duration_ms = val;
        }
    }

    /// The per-run budget these limits describe.
    pub const fn budget(&self) -> RunBudget {
        let budget = RunBudget::iterations(self.max_iterations);
        if self.max_duration_ms == 0 {
            budget
        } else {
            budget.with_duration(Duration::from_millis(self.max_duration_ms))
        }
    }

    /// Stack, in bytes, a thread needs to resolve a chain `max_depth`
    /// patterns deep.
    pub const fn worker_stack_size(&self) -> usize {
        self.max_depth
            .saturating_mul(STACK_PER_LEVEL)
            .saturating_add(STACK_BASE)
    }
}

/// Stack reserved for a resolver thread regardless of depth.
const STACK_BASE: usize = 2_097_152;

/// Stack for one level of crafting recursion, with headroom for
/// unoptimised builds.
const STACK_PER_LEVEL: usize = 65_536;

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(val) => Some(val),
        Err(e) => {
            warn!(variable = name, value = %raw, error = %e, "Ignoring invalid override");
            None
        }
    }
}

const fn default_max_iterations() -> u64 {
    1_000_000
}

const fn default_max_duration_ms() -> u64 {
    1_000
}

const fn default_max_depth() -> usize {
    256
}
