use crate::error::ConfigError;
use crate::escalation::tracker::DEFAULT_MAX_REQUESTS;
use crate::escalation::window::DEFAULT_WINDOW_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const ENV_WINDOW_CAPACITY: &str = "PLAN_ROUTER_WINDOW_CAPACITY";
pub const ENV_PERCENTILE_RANK: &str = "PLAN_ROUTER_PERCENTILE_RANK";
pub const ENV_MAX_DELEGATION_RATIO: &str = "PLAN_ROUTER_MAX_DELEGATION_RATIO";
pub const ENV_MAX_REQUESTS: &str = "PLAN_ROUTER_MAX_REQUESTS";

/// Escalation policy settings.
///
/// Loaded from defaults, then an optional TOML file, then `PLAN_ROUTER_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Number of recent small-generator confidence scores kept
    pub window_capacity: usize,
    /// Percentile of the window used as the escalation threshold
    pub percentile_rank: u8,
    /// Escalations stop while escalated/total is at or above this ratio
    pub max_delegation_ratio: f64,
    /// Counter value that resets both request counters
    pub max_requests_before_reset: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            percentile_rank: 20,
            max_delegation_ratio: 0.2,
            max_requests_before_reset: DEFAULT_MAX_REQUESTS,
        }
    }
}

impl RouterConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults with process environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `PLAN_ROUTER_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, ENV_WINDOW_CAPACITY)? {
            self.window_capacity = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_PERCENTILE_RANK)? {
            self.percentile_rank = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_DELEGATION_RATIO)? {
            self.max_delegation_ratio = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_MAX_REQUESTS)? {
            self.max_requests_before_reset = v;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        if self.percentile_rank > 100 {
            return Err(ConfigError::Invalid(format!(
                "percentile_rank ({}) must be between 0 and 100",
                self.percentile_rank
            )));
        }
        if !self.max_delegation_ratio.is_finite()
            || !(0.0..=1.0).contains(&self.max_delegation_ratio)
        {
            return Err(ConfigError::Invalid(format!(
                "max_delegation_ratio ({}) must be between 0.0 and 1.0",
                self.max_delegation_ratio
            )));
        }
        if self.max_requests_before_reset == 0 {
            return Err(ConfigError::Invalid(
                "max_requests_before_reset must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
