//! Builder for assembling allocator configuration from its sources.

use std::path::{Path, PathBuf};

use crate::config::environment::EnvironmentConfig;
use crate::config::loader::ConfigLoader;
use crate::config::schema::AllocatorConfig;
use crate::config::validator::ConfigValidator;
use crate::error::Result;

/// Builds an [`AllocatorConfig`].
///
/// Sources apply in order: built-in defaults, then the YAML file (if any),
/// then `PORTALLOC_*` environment variables. A programmatic config passed to
/// [`with_config`](Self::with_config) replaces defaults and file. The result
/// is validated before it is returned.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    file: Option<PathBuf>,
    config: Option<AllocatorConfig>,
    skip_env: bool,
}

impl ConfigBuilder {
    /// Creates a builder that starts from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads configuration from a YAML file.
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Uses `config` as the base instead of defaults and file.
    #[must_use]
    pub fn with_config(mut self, config: AllocatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Ignores `PORTALLOC_*` environment variables.
    #[must_use]
    pub const fn skip_env(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Assembles and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, an
    /// environment variable is malformed, or the result fails validation.
    pub fn build(self) -> Result<AllocatorConfig> {
        let mut config = match (self.config, self.file) {
            (Some(config), _) => config,
            (None, Some(path)) => {
                log::debug!("loading allocator config from {}", path.display());
                ConfigLoader::load_file(&path)?
            }
            (None, None) => AllocatorConfig::default(),
        };

        if !self.skip_env {
            EnvironmentConfig::apply_overrides(&mut config)?;
        }

        ConfigValidator::validate(&config)?;
        Ok(config)
    }
}
