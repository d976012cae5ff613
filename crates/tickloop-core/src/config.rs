//! Configuration loading and typed config structures for tickloop.
//!
//! The canonical configuration lives in `tickloop-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads, overrides, and validates it.
//!
//! Environment variables override YAML values:
//! - `TICKLOOP_MULTIPLIER` overrides `clock.multiplier`
//! - `TICKLOOP_SEED` overrides `clock.seed`
//! - `TICKLOOP_BUDGET_MS` overrides `run.budget_ms`

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::clock::{DEFAULT_BASE_STEP_MS, SimulatedClock};
use crate::jitter::RngJitter;

/// Environment variable overriding `clock.multiplier`.
pub const ENV_MULTIPLIER: &str = "TICKLOOP_MULTIPLIER";

/// Environment variable overriding `clock.seed`.
pub const ENV_SEED: &str = "TICKLOOP_SEED";

/// Environment variable overriding `run.budget_ms`.
pub const ENV_BUDGET_MS: &str = "TICKLOOP_BUDGET_MS";

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

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Clock tuning (multiplier, base step, seed).
    #[serde(default)]
    pub clock: ClockConfig,

    /// Loop bounds.
    #[serde(default)]
    pub run: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file, applying environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or value is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::deserialize_document(&contents)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides are
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is unusable.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config = Self::deserialize_document(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn deserialize_document(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a present value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MULTIPLIER) {
            self.clock.multiplier = parse_override(ENV_MULTIPLIER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            self.clock.seed = Some(parse_override(ENV_SEED, &raw)?);
        }
        if let Some(raw) = lookup(ENV_BUDGET_MS) {
            self.run.budget_ms = parse_override(ENV_BUDGET_MS, &raw)?;
        }
        Ok(())
    }

    /// Check values the clock cannot sanitize on its own.
    ///
    /// Multipliers below 1 are fine (the clock clamps them), but an
    /// infinite multiplier would saturate every step.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `clock.multiplier` is not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.clock.multiplier.is_finite() {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "clock.multiplier must be finite, got {}",
                    self.clock.multiplier
                ),
            });
        }
        Ok(())
    }
}

/// Clock configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClockConfig {
    /// Variance multiplier applied after construction (clamped to >= 1).
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Unscaled simulated milliseconds per step.
    #[serde(default = "default_base_step_ms")]
    pub base_step_ms: u64,

    /// Jitter seed. `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ClockConfig {
    /// Build a clock from this configuration.
    pub fn build(&self) -> SimulatedClock<RngJitter> {
        let jitter = self
            .seed
            .map_or_else(RngJitter::from_os_rng, RngJitter::seeded);
        let mut clock = SimulatedClock::new(jitter).with_base_step(self.base_step_ms);
        clock.set_multiplier(self.multiplier);
        clock
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            multiplier: default_multiplier(),
            base_step_ms: default_base_step_ms(),
            seed: None,
        }
    }
}

/// Loop bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Simulated-time budget in milliseconds. Zero or negative runs nothing.
    #[serde(default = "default_budget_ms")]
    pub budget_ms: i64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            budget_ms: default_budget_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn parse_override<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_err| ConfigError::Invalid {
        reason: format!("{key}={raw:?} does not parse"),
    })
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_multiplier() -> f64 {
    2.1
}

const fn default_base_step_ms() -> u64 {
    DEFAULT_BASE_STEP_MS
}

const fn default_budget_ms() -> i64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.clock.multiplier - 2.1).abs() < f64::EPSILON);
        assert_eq!(config.clock.base_step_ms, 5);
        assert_eq!(config.clock.seed, None);
        assert_eq!(config.run.budget_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
clock:
  multiplier: 3.5
  base_step_ms: 8
  seed: 2016

run:
  budget_ms: 250

logging:
  level: debug
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!((config.clock.multiplier - 3.5).abs() < f64::EPSILON);
        assert_eq!(config.clock.base_step_ms, 8);
        assert_eq!(config.clock.seed, Some(2016));
        assert_eq!(config.run.budget_ms, 250);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("run:\n  budget_ms: 23\n").unwrap();
        assert_eq!(config.run.budget_ms, 23);
        // Everything else uses defaults
        assert_eq!(config.clock, ClockConfig::default());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn sub_one_multiplier_is_accepted() {
        let config = SimulationConfig::parse("clock:\n  multiplier: 0\n").unwrap();
        let clock = config.clock.build();
        assert!((clock.multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn infinite_multiplier_is_rejected() {
        let mut config = SimulationConfig::default();
        config
            .apply_overrides(lookup_from(&[(ENV_MULTIPLIER, "inf")]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let result = SimulationConfig::parse("run: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn overrides_replace_yaml_values() {
        let mut config = SimulationConfig::default();
        config
            .apply_overrides(lookup_from(&[
                (ENV_MULTIPLIER, "4"),
                (ENV_SEED, " 77 "),
                (ENV_BUDGET_MS, "-5"),
            ]))
            .unwrap();
        assert!((config.clock.multiplier - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.clock.seed, Some(77));
        assert_eq!(config.run.budget_ms, -5);
    }

    #[test]
    fn missing_overrides_leave_config_alone() {
        let mut config = SimulationConfig::default();
        config.apply_overrides(lookup_from(&[])).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn unparsable_override_is_rejected() {
        let mut config = SimulationConfig::default();
        let result = config.apply_overrides(lookup_from(&[(ENV_SEED, "forty-two")]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn seeded_config_builds_reproducible_clocks() {
        let config = SimulationConfig::parse("clock:\n  seed: 9\n").unwrap();
        let mut a = config.clock.build();
        let mut b = config.clock.build();
        for _ in 0..32 {
            assert_eq!(a.tick(), b.tick());
        }
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("tickloop-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
