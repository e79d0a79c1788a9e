//! Expiring set configuration.

use super::{deadline_after, parse_env_millis, require_nonzero, Config};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing settings for [`crate::containers::ExpiringSet`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringSetConfig {
    /// How long an added key stays a member
    pub ttl: Duration,
    /// Reaper sleep when no deadline is pending
    pub idle_period: Duration,
}

impl ExpiringSetConfig {
    /// Default idle period with the given TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

impl Default for ExpiringSetConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            idle_period: Duration::from_secs(1),
        }
    }
}

impl Config for ExpiringSetConfig {
    fn validate(&self) -> Result<()> {
        require_nonzero("ttl", self.ttl)?;
        require_nonzero("idle_period", self.idle_period)?;
        deadline_after("ttl", self.ttl)?;
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.ttl = parse_env_millis(&format!("{}EXPIRING_TTL_MS", prefix), config.ttl);
        config.idle_period =
            parse_env_millis(&format!("{}EXPIRING_IDLE_MS", prefix), config.idle_period);
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            idle_period: Duration::from_secs(5),
        }
    }

    fn memory_preset() -> Self {
        Self {
            ttl: Duration::from_secs(10),
            idle_period: Duration::from_secs(1),
        }
    }

    fn realtime_preset() -> Self {
        Self {
            ttl: Duration::from_secs(1),
            idle_period: Duration::from_millis(50),
        }
    }
}
