//! Session layer configuration.

use super::{deadline_after, parse_env_millis, require_nonzero, Config};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifetime and gc settings for sessions and [`crate::session::InMemorySessionStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long a saved session survives
    pub expiration: Duration,
    /// Store gc sleep when nothing is due
    pub gc_idle_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration: Duration::from_secs(24 * 60 * 60),
            gc_idle_period: Duration::from_secs(1),
        }
    }
}

impl Config for SessionConfig {
    fn validate(&self) -> Result<()> {
        require_nonzero("expiration", self.expiration)?;
        require_nonzero("gc_idle_period", self.gc_idle_period)?;
        deadline_after("expiration", self.expiration)?;
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.expiration =
            parse_env_millis(&format!("{}SESSION_EXPIRATION_MS", prefix), config.expiration);
        config.gc_idle_period =
            parse_env_millis(&format!("{}SESSION_GC_IDLE_MS", prefix), config.gc_idle_period);
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            expiration: Duration::from_secs(7 * 24 * 60 * 60),
            gc_idle_period: Duration::from_secs(10),
        }
    }

    fn memory_preset() -> Self {
        Self {
            expiration: Duration::from_secs(60 * 60),
            gc_idle_period: Duration::from_secs(1),
        }
    }

    fn realtime_preset() -> Self {
        Self {
            expiration: Duration::from_secs(15 * 60),
            gc_idle_period: Duration::from_millis(100),
        }
    }
}
