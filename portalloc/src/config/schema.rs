//! Configuration schema definitions.
//!
//! The allocator is configured with the protocols it serves and the two
//! bands each protocol gets: the dynamic band for auto-assigned ports and
//! the master band that bounds every published port.

use serde::{Deserialize, Serialize};

use crate::endpoint::Protocol;
use crate::error::{Error, Result};
use crate::port::{PortRange, DEFAULT_DYNAMIC_MAX, DEFAULT_DYNAMIC_MIN};
use crate::Port;

/// Complete allocator configuration.
///
/// Missing fields take their defaults, so an empty document is valid.
///
/// # Examples
///
/// ```
/// use portalloc::config::{AllocatorConfig, RangeConfig};
/// use portalloc::Protocol;
///
/// let config = AllocatorConfig {
///     protocols: vec![Protocol::Tcp],
///     dynamic_range: RangeConfig { min: 40000, max: 40999 },
///     ..Default::default()
/// };
/// assert_eq!(config.master_range, RangeConfig { min: 1, max: 65535 });
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Protocols to create port spaces for.
    pub protocols: Vec<Protocol>,

    /// Band used for ports the allocator picks itself.
    pub dynamic_range: RangeConfig,

    /// Band covering every port that may be published.
    pub master_range: RangeConfig,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            protocols: Protocol::ALL.to_vec(),
            dynamic_range: RangeConfig {
                min: DEFAULT_DYNAMIC_MIN,
                max: DEFAULT_DYNAMIC_MAX,
            },
            master_range: RangeConfig {
                min: Port::MIN,
                max: Port::MAX,
            },
        }
    }
}

/// An inclusive port band as written in configuration.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RangeConfig {
    /// Lowest port of the band.
    pub min: u16,

    /// Highest port of the band.
    pub max: u16,
}

impl RangeConfig {
    /// Converts to a validated [`PortRange`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming `field` if either bound is 0 or
    /// `max` is below `min`.
    pub fn to_range(self, field: &str) -> Result<PortRange> {
        PortRange::from_values(self.min, self.max).map_err(|err| Error::Validation {
            field: field.into(),
            message: err.to_string(),
        })
    }
}
