//! Error types for the portalloc library.
//!
//! Every failure is returned synchronously and none is fatal: the caller
//! typically leaves the service pending and retries on its next
//! reconciliation pass.

use thiserror::Error;

use crate::endpoint::Protocol;
use crate::port::PortRange;

/// Result type alias for operations that may fail with a portalloc error.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the portalloc library.
#[derive(Debug, Error)]
pub enum Error {
    /// A port number outside 1-65535 was supplied.
    #[error("invalid port {value}: {reason}")]
    InvalidPort {
        /// The invalid port value.
        value: u16,
        /// The reason the port is invalid.
        reason: String,
    },

    /// The requested port is already held, or lies outside the band.
    #[error("port {port}/{protocol} is unavailable")]
    PortConflict {
        /// Protocol of the contended port space.
        protocol: Protocol,
        /// The requested port number.
        port: u16,
    },

    /// The dynamic band has no free port left.
    #[error("no ports available for {protocol} in {range}")]
    NoAvailablePorts {
        /// Protocol of the exhausted space.
        protocol: Protocol,
        /// The exhausted band.
        range: PortRange,
    },

    /// The allocator was not constructed with this protocol.
    #[error("unsupported protocol {protocol}")]
    UnsupportedProtocol {
        /// The protocol that was requested.
        protocol: Protocol,
    },

    /// An invalid port band was specified.
    #[error("invalid port range {min}-{max}: {reason}")]
    InvalidPortRange {
        /// The requested lower bound.
        min: u16,
        /// The requested upper bound.
        max: u16,
        /// The reason the range is invalid.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A configuration document could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::port::InvalidPortError> for Error {
    fn from(err: crate::port::InvalidPortError) -> Self {
        Self::InvalidPort {
            value: err.value,
            reason: err.reason,
        }
    }
}

impl From<crate::port::InvalidPortRangeError> for Error {
    fn from(err: crate::port::InvalidPortRangeError) -> Self {
        Self::InvalidPortRange {
            min: err.min,
            max: err.max,
            reason: err.reason,
        }
    }
}

impl Error {
    /// Check if error is a port collision.
    ///
    /// # Examples
    ///
    /// ```
    /// use portalloc::{Error, Protocol};
    ///
    /// let err = Error::PortConflict { protocol: Protocol::Tcp, port: 8080 };
    /// assert!(err.is_conflict());
    /// ```
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::PortConflict { .. })
    }

    /// Check if error reports an exhausted dynamic band.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::NoAvailablePorts { .. })
    }
}
