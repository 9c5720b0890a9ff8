//! Port numbers, port bands and the allocator built on them.
//!
//! [`Port`] and [`PortRange`] are validated value types. [`PortSpace`]
//! tracks which numbers of one band are currently held, [`ProtocolSpace`]
//! pairs the dynamic and master bands of one protocol, and
//! [`PortAllocator`] serves whole services across protocols.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod allocator;
pub mod bands;
pub mod space;

#[cfg(test)]
mod allocator_proptests;
#[cfg(test)]
mod proptests;

pub use allocator::PortAllocator;
pub use bands::ProtocolSpace;
pub use space::PortSpace;

/// Lowest port of the default dynamic band.
pub const DEFAULT_DYNAMIC_MIN: u16 = 30000;

/// Highest port of the default dynamic band.
pub const DEFAULT_DYNAMIC_MAX: u16 = 32767;

/// A usable network port number (1-65535).
///
/// Port 0 is never a valid reservation: in endpoint configuration it is the
/// "not yet assigned" sentinel.
///
/// # Examples
///
/// ```
/// use portalloc::Port;
///
/// let port = Port::try_from(8080).unwrap();
/// assert_eq!(port.value(), 8080);
/// assert!(Port::try_from(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// The minimum valid port number.
    pub const MIN: u16 = 1;

    /// The maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Returns the underlying port number.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for Port {
    type Error = InvalidPortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value < Self::MIN {
            Err(InvalidPortError {
                value,
                reason: "port 0 is not a usable port".into(),
            })
        } else {
            Ok(Self(value))
        }
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for invalid port numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPortError {
    /// The invalid port value.
    pub value: u16,
    /// The reason the port is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid port {}: {}", self.value, self.reason)
    }
}

impl std::error::Error for InvalidPortError {}

/// An inclusive band of ports.
///
/// # Examples
///
/// ```
/// use portalloc::{Port, PortRange};
///
/// let band = PortRange::from_values(30000, 32767).unwrap();
/// assert_eq!(band.len(), 2768);
/// assert!(band.contains(Port::try_from(30000).unwrap()));
/// assert!(!band.contains(Port::try_from(10000).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRange {
    min: Port,
    max: Port,
}

impl PortRange {
    /// The whole usable port range, 1-65535.
    pub const FULL: Self = Self {
        min: Port(Port::MIN),
        max: Port(Port::MAX),
    };

    /// The default band used for auto-assigned published ports.
    pub const DEFAULT_DYNAMIC: Self = Self {
        min: Port(DEFAULT_DYNAMIC_MIN),
        max: Port(DEFAULT_DYNAMIC_MAX),
    };

    /// Creates a new port range.
    ///
    /// # Errors
    ///
    /// Returns an error if `max` is less than `min`.
    pub fn new(min: Port, max: Port) -> Result<Self, InvalidPortRangeError> {
        if max < min {
            Err(InvalidPortRangeError {
                min: min.value(),
                max: max.value(),
                reason: "max must be greater than or equal to min".into(),
            })
        } else {
            Ok(Self { min, max })
        }
    }

    /// Creates a range from raw numbers, rejecting port 0 on either end.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is 0 or `max` is less than `min`.
    pub fn from_values(min: u16, max: u16) -> Result<Self, InvalidPortRangeError> {
        let invalid = |reason: &str| InvalidPortRangeError {
            min,
            max,
            reason: reason.into(),
        };
        let lo = Port::try_from(min).map_err(|_| invalid("min must be a usable port"))?;
        let hi = Port::try_from(max).map_err(|_| invalid("max must be a usable port"))?;
        Self::new(lo, hi)
    }

    /// Returns the minimum port in the range.
    #[must_use]
    pub const fn min(&self) -> Port {
        self.min
    }

    /// Returns the maximum port in the range.
    #[must_use]
    pub const fn max(&self) -> Port {
        self.max
    }

    /// Returns `true` if the range contains the given port.
    #[must_use]
    pub const fn contains(&self, port: Port) -> bool {
        self.contains_value(port.value())
    }

    /// Returns `true` if the raw number falls inside the range.
    ///
    /// Port 0 is never contained.
    #[must_use]
    pub const fn contains_value(&self, value: u16) -> bool {
        value >= self.min.value() && value <= self.max.value()
    }

    /// Returns `true` if every port of `self` is also inside `other`.
    #[must_use]
    pub const fn is_within(&self, other: &Self) -> bool {
        other.contains(self.min) && other.contains(self.max)
    }

    /// Returns the number of ports in the range (inclusive).
    #[must_use]
    pub const fn len(&self) -> usize {
        (self.max.value() - self.min.value()) as usize + 1
    }

    /// Always `false`: a validated range holds at least one port.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Error type for invalid port ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPortRangeError {
    /// The requested lower bound.
    pub min: u16,
    /// The requested upper bound.
    pub max: u16,
    /// The reason the range is invalid.
    pub reason: String,
}

impl fmt::Display for InvalidPortRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid port range {}-{}: {}",
            self.min, self.max, self.reason
        )
    }
}

impl std::error::Error for InvalidPortRangeError {}
