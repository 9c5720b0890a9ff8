//! Loading allocator configuration from YAML.

use std::fs;
use std::path::Path;

use crate::config::schema::AllocatorConfig;
use crate::error::{Error, Result};

/// Reads YAML configuration documents.
///
/// # Examples
///
/// ```
/// use portalloc::config::ConfigLoader;
///
/// let config = ConfigLoader::from_yaml_str("protocols: [tcp]\n").unwrap();
/// assert_eq!(config.protocols.len(), 1);
/// ```
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse a YAML document.
    ///
    /// An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the YAML is malformed or has
    /// unknown fields.
    pub fn from_yaml_str(contents: &str) -> Result<AllocatorConfig> {
        if contents.trim().is_empty() {
            return Ok(AllocatorConfig::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Load and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Validation`] naming the file if it cannot be parsed.
    pub fn load_file(path: &Path) -> Result<AllocatorConfig> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("Invalid YAML: {e}"),
        })
    }
}
