//! Configuration APIs for sylva
//!
//! Every tunable of the background-driven structures lives in a small
//! serializable config type implementing [`Config`]:
//!
//! - [`QueueConfig`]: capacity of a [`crate::containers::BoundedOrderedQueue`]
//! - [`ExpiringSetConfig`]: TTL and idle wake-up of a [`crate::containers::ExpiringSet`]
//! - [`SessionConfig`]: session lifetime and store gc cadence
//!
//! # Environment Initialization
//!
//! ```rust
//! use sylva::config::{Config, QueueConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads SYLVA_QUEUE_CAPACITY, falling back to the default
//! let config = QueueConfig::from_env()?;
//!
//! // Same lookup under a custom prefix: MYAPP_QUEUE_CAPACITY
//! let config = QueueConfig::from_env_with_prefix("MYAPP_")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Presets
//!
//! ```rust
//! use sylva::config::{Config, ExpiringSetConfig};
//!
//! let config = ExpiringSetConfig::realtime_preset();
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Result, SylvaError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

pub mod expiring;
pub mod queue;
pub mod session;

#[cfg(test)]
mod tests;

pub use expiring::ExpiringSetConfig;
pub use queue::QueueConfig;
pub use session::SessionConfig;

/// Default environment variable prefix
pub const ENV_PREFIX: &str = "SYLVA_";

/// Common configuration trait providing validation, environment
/// initialization, presets and JSON persistence.
pub trait Config: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Validate the configuration for correctness and consistency.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, `Err(Configuration)` otherwise.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from environment variables.
    ///
    /// Variables use the format `SYLVA_{COMPONENT}_{FIELD}`, for example
    /// `SYLVA_EXPIRING_TTL_MS=5000`.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Initialize configuration from environment variables with a custom prefix.
    ///
    /// Unset or unparsable variables keep their default value; the result
    /// is validated before it is returned.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset favoring throughput over memory.
    fn performance_preset() -> Self;

    /// Preset favoring a small footprint.
    fn memory_preset() -> Self;

    /// Preset favoring prompt expiry and bounded latency.
    fn realtime_preset() -> Self;

    /// Balanced preset, the default configuration.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a file as pretty-printed JSON.
    ///
    /// # Arguments
    ///
    /// * `path` - The file path to save the configuration to
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)
            .map_err(|e| SylvaError::configuration(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load and validate a configuration saved by [`Config::save_to_file`].
    ///
    /// # Arguments
    ///
    /// * `path` - The file path to load the configuration from
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| SylvaError::configuration(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

/// Utility function to parse environment variable with fallback to default.
///
/// # Arguments
///
/// * `var_name` - The environment variable name
/// * `default` - The default value if the variable is unset or unparsable
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a millisecond count from the environment into a [`Duration`].
pub fn parse_env_millis(var_name: &str, default: Duration) -> Duration {
    let millis = parse_env_var(var_name, default.as_millis() as u64);
    Duration::from_millis(millis)
}

/// Deadline `ttl` from now; a configuration error when it falls outside
/// the monotonic clock's range
pub(crate) fn deadline_after(field: &str, ttl: Duration) -> Result<Instant> {
    Instant::now().checked_add(ttl).ok_or_else(|| {
        SylvaError::configuration(format!("{} of {:?} overflows the monotonic clock", field, ttl))
    })
}

/// Reject a zero duration for `field`
pub(crate) fn require_nonzero(field: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(SylvaError::configuration(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(())
}
