//! Error handling for the sylva library
//!
//! Recoverable conditions (duplicate insert, absent key) are ordinary return
//! values on the index types. The variants here cover caller errors that
//! must be rejected and the fatal structural faults that abort an operation.

use thiserror::Error;

/// Main error type for the sylva library
#[derive(Error, Debug)]
pub enum SylvaError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal tree invariant broken during rebalancing or fixup
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// Which invariant failed and where
        message: String,
    },

    /// Range bound with lower end above upper end
    #[error("Invalid bound: from {from} is greater than to {to}")]
    InvalidBound {
        /// Rendered lower bound
        from: String,
        /// Rendered upper bound
        to: String,
    },

    /// Operation the structure refuses by contract
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Name of the refused operation
        operation: String,
    },

    /// Node arena cannot address more slots
    #[error("Capacity exceeded: at most {capacity} nodes")]
    CapacityExceeded {
        /// Maximum addressable node count
        capacity: usize,
    },

    /// Key lookup failed where the contract requires a value
    #[error("Not found: {key}")]
    NotFound {
        /// The missing key
        key: String,
    },

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Underlying serializer message
        message: String,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// Resource already in use or could not be released
    #[error("Resource busy: {resource}")]
    ResourceBusy {
        /// Description of the busy resource
        resource: String,
    },
}

impl SylvaError {
    /// Create an invariant violation error
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::InvariantViolation { message: message.into() }
    }

    /// Create an invalid bound error
    pub fn invalid_bound<F: Into<String>, T: Into<String>>(from: F, to: T) -> Self {
        Self::InvalidBound { from: from.into(), to: to.into() }
    }

    /// Create an unsupported operation error
    pub fn unsupported<S: Into<String>>(operation: S) -> Self {
        Self::UnsupportedOperation { operation: operation.into() }
    }

    /// Create a capacity exceeded error
    pub fn capacity_exceeded(capacity: usize) -> Self {
        Self::CapacityExceeded { capacity }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization { message: message.into() }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a resource busy error
    pub fn resource_busy<S: Into<String>>(resource: S) -> Self {
        Self::ResourceBusy { resource: resource.into() }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::NotFound { .. } => true,
            Self::ResourceBusy { .. } => true,
            Self::InvalidBound { .. } => true,
            Self::InvariantViolation { .. } => false,
            Self::UnsupportedOperation { .. } => false,
            Self::CapacityExceeded { .. } => false,
            Self::Serialization { .. } => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvariantViolation { .. } => "invariant",
            Self::InvalidBound { .. } => "bound",
            Self::UnsupportedOperation { .. } => "unsupported",
            Self::CapacityExceeded { .. } => "capacity",
            Self::NotFound { .. } => "not_found",
            Self::Serialization { .. } => "serialization",
            Self::Configuration { .. } => "config",
            Self::ResourceBusy { .. } => "resource",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SylvaError>;
