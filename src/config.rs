//! Fleet configuration.
//!
//! Values come from defaults, then `PRINTER_FLEET_*` environment variables,
//! then command-line flags (applied by the binary through the `with_*` setters).

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;
pub const DEFAULT_FAULT_PROBABILITY: f64 = 0.1;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

pub const ENV_API_URL: &str = "PRINTER_FLEET_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "PRINTER_FLEET_REQUEST_TIMEOUT_SECS";
pub const ENV_CHANNEL_CAPACITY: &str = "PRINTER_FLEET_CHANNEL_CAPACITY";
pub const ENV_FAULT_PROBABILITY: &str = "PRINTER_FLEET_FAULT_PROBABILITY";
pub const ENV_TICK_INTERVAL_MS: &str = "PRINTER_FLEET_TICK_INTERVAL_MS";
pub const ENV_RNG_SEED: &str = "PRINTER_FLEET_RNG_SEED";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}")]
    Parse { var: &'static str, value: String },
    #[error("fault probability must be within [0, 1], got {0}")]
    FaultProbability(f64),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Configuration for the fleet service, simulator and stores.
///
/// # Example
///
/// ```
/// use printer_fleet::config::FleetConfig;
///
/// let config = FleetConfig::new()
///     .with_api_url("http://printers.local:3000")
///     .with_fault_probability(0.25)
///     .with_rng_seed(Some(7));
/// assert_eq!(config.api_url(), "http://printers.local:3000");
/// assert_eq!(config.request_timeout_secs(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FleetConfig {
    /// Base URL of the REST store
    api_url: String,
    request_timeout_secs: u64,
    /// Buffer size of each collection actor's channel
    channel_capacity: usize,
    /// Chance that a simulator tick produces a printer fault
    fault_probability: f64,
    tick_interval_ms: u64,
    /// Fixed simulator seed; entropy when unset
    rng_seed: Option<u64>,
}

impl FleetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the `PRINTER_FLEET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            config.request_timeout_secs = parse(ENV_REQUEST_TIMEOUT_SECS, value)?;
        }
        if let Some(value) = lookup(ENV_CHANNEL_CAPACITY) {
            config.channel_capacity = parse(ENV_CHANNEL_CAPACITY, value)?;
        }
        if let Some(value) = lookup(ENV_FAULT_PROBABILITY) {
            config.fault_probability = parse(ENV_FAULT_PROBABILITY, value)?;
        }
        if let Some(value) = lookup(ENV_TICK_INTERVAL_MS) {
            config.tick_interval_ms = parse(ENV_TICK_INTERVAL_MS, value)?;
        }
        if let Some(value) = lookup(ENV_RNG_SEED) {
            config.rng_seed = Some(parse(ENV_RNG_SEED, value)?);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges the setters do not enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.fault_probability) {
            return Err(ConfigError::FaultProbability(self.fault_probability));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Zero("channel capacity"));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Zero("tick interval"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("request timeout"));
        }
        Ok(())
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the per-tick fault chance. Checked by [`validate`](Self::validate).
    pub fn with_fault_probability(mut self, probability: f64) -> Self {
        self.fault_probability = probability;
        self
    }

    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_rng_seed(mut self, seed: Option<u64>) -> Self {
        self.rng_seed = seed;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn fault_probability(&self) -> f64 {
        self.fault_probability
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            fault_probability: DEFAULT_FAULT_PROBABILITY,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            rng_seed: None,
        }
    }
}

fn parse<V: std::str::FromStr>(var: &'static str, value: String) -> Result<V, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Parse { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FleetConfig::default();
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.channel_capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(config.fault_probability(), 0.1);
        assert_eq!(config.tick_interval(), Duration::from_millis(1000));
        assert_eq!(config.rng_seed(), None);
        assert_eq!(config, FleetConfig::new());
    }

    #[test]
    fn test_setters_leave_other_fields() {
        let config = FleetConfig::new().with_tick_interval_ms(50);
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.api_url(), DEFAULT_API_URL); // Unchanged
    }

    #[test]
    fn test_environment_overrides() {
        let config = FleetConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://10.0.0.5:3000"),
            (ENV_FAULT_PROBABILITY, "0.5"),
            (ENV_RNG_SEED, " 42 "),
        ]))
        .unwrap();
        assert_eq!(config.api_url(), "http://10.0.0.5:3000");
        assert_eq!(config.fault_probability(), 0.5);
        assert_eq!(config.rng_seed(), Some(42));
        assert_eq!(config.channel_capacity(), DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_bad_environment_values() {
        let err = FleetConfig::from_lookup(lookup(&[(ENV_CHANNEL_CAPACITY, "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Parse {
                var: ENV_CHANNEL_CAPACITY,
                value: "lots".into()
            }
        );

        let err = FleetConfig::from_lookup(lookup(&[(ENV_FAULT_PROBABILITY, "1.5")])).unwrap_err();
        assert_eq!(err, ConfigError::FaultProbability(1.5));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = FleetConfig::new().with_tick_interval_ms(0);
        assert_eq!(config.validate(), Err(ConfigError::Zero("tick interval")));
    }
}
