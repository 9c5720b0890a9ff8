//! Environment variable handling for configuration overrides.
//!
//! Recognized variables:
//!
//! - `PORTALLOC_PROTOCOLS`: comma-separated list, e.g. `tcp,udp`
//! - `PORTALLOC_DYNAMIC_MIN` / `PORTALLOC_DYNAMIC_MAX`
//! - `PORTALLOC_MASTER_MIN` / `PORTALLOC_MASTER_MAX`

use std::env;

use crate::config::schema::AllocatorConfig;
use crate::endpoint::Protocol;
use crate::error::{Error, Result};

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use portalloc::config::{AllocatorConfig, EnvironmentConfig};
///
/// let mut config = AllocatorConfig::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
#[derive(Debug)]
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value.
    pub fn apply_overrides(config: &mut AllocatorConfig) -> Result<()> {
        if let Ok(value) = env::var("PORTALLOC_PROTOCOLS") {
            config.protocols = Self::parse_protocols(&value)?;
        }

        if let Some(min) = Self::port_var("PORTALLOC_DYNAMIC_MIN")? {
            config.dynamic_range.min = min;
        }
        if let Some(max) = Self::port_var("PORTALLOC_DYNAMIC_MAX")? {
            config.dynamic_range.max = max;
        }
        if let Some(min) = Self::port_var("PORTALLOC_MASTER_MIN")? {
            config.master_range.min = min;
        }
        if let Some(max) = Self::port_var("PORTALLOC_MASTER_MAX")? {
            config.master_range.max = max;
        }

        Ok(())
    }

    fn port_var(name: &str) -> Result<Option<u16>> {
        match env::var(name) {
            Ok(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| Error::Validation {
                    field: name.into(),
                    message: format!("Invalid port number: '{value}'"),
                }),
            Err(_) => Ok(None),
        }
    }

    /// Parse a comma-separated protocol list, skipping empty items.
    fn parse_protocols(s: &str) -> Result<Vec<Protocol>> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse().map_err(|_| Error::Validation {
                    field: "PORTALLOC_PROTOCOLS".into(),
                    message: format!("Unknown protocol: '{part}'"),
                })
            })
            .collect()
    }
}
