//! Bounded ordered queue configuration.

use super::{parse_env_var, Config};
use crate::error::{Result, SylvaError};
use serde::{Deserialize, Serialize};

/// Default number of keys a queue retains before evicting
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Capacity settings for [`crate::containers::BoundedOrderedQueue`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of keys held at once
    pub capacity: usize,
}

impl QueueConfig {
    /// Configuration with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl Config for QueueConfig {
    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(SylvaError::configuration("capacity must be greater than 0"));
        }
        if self.capacity >= crate::tree::red_black::MAX_NODES {
            return Err(SylvaError::configuration(format!(
                "capacity must be below {}",
                crate::tree::red_black::MAX_NODES
            )));
        }
        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.capacity = parse_env_var(&format!("{}QUEUE_CAPACITY", prefix), config.capacity);
        config.validate()?;
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self { capacity: 64 * 1024 }
    }

    fn memory_preset() -> Self {
        Self { capacity: 128 }
    }

    fn realtime_preset() -> Self {
        Self { capacity: 4096 }
    }
}
