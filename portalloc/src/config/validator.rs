//! Configuration validation.

use std::collections::HashSet;

use crate::config::schema::AllocatorConfig;
use crate::error::{Error, Result};

/// Validates allocator configuration.
///
/// # Examples
///
/// ```
/// use portalloc::config::{AllocatorConfig, ConfigValidator};
///
/// ConfigValidator::validate(&AllocatorConfig::default()).unwrap();
/// ```
#[derive(Debug)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// Checks that at least one protocol is listed, none twice, that both
    /// bands are well-formed, and that the dynamic band lies inside the
    /// master band.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first problem found.
    pub fn validate(config: &AllocatorConfig) -> Result<()> {
        Self::validate_protocols(config)?;

        let dynamic = config.dynamic_range.to_range("dynamic_range")?;
        let master = config.master_range.to_range("master_range")?;

        if !dynamic.is_within(&master) {
            return Err(Error::Validation {
                field: "dynamic_range".into(),
                message: format!("{dynamic} must lie inside master_range {master}"),
            });
        }

        Ok(())
    }

    fn validate_protocols(config: &AllocatorConfig) -> Result<()> {
        if config.protocols.is_empty() {
            return Err(Error::Validation {
                field: "protocols".into(),
                message: "at least one protocol is required".into(),
            });
        }

        let mut seen = HashSet::new();
        for protocol in &config.protocols {
            if !seen.insert(protocol) {
                return Err(Error::Validation {
                    field: "protocols".into(),
                    message: format!("protocol {protocol} listed more than once"),
                });
            }
        }

        Ok(())
    }
}
