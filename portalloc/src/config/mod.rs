//! Allocator configuration.
//!
//! Configuration comes from, in increasing precedence:
//!
//! 1. Built-in defaults (TCP and UDP, dynamic band 30000-32767, master
//!    band 1-65535)
//! 2. A YAML file, or a programmatic [`AllocatorConfig`]
//! 3. Environment variables (`PORTALLOC_*`)
//!
//! # Examples
//!
//! ```
//! use portalloc::config::ConfigBuilder;
//! use portalloc::PortAllocator;
//!
//! let config = ConfigBuilder::new().skip_env().build().unwrap();
//! let allocator = PortAllocator::with_config(&config).unwrap();
//! assert_eq!(allocator.protocols().len(), 2);
//! ```
//!
//! A file looks like:
//!
//! ```yaml
//! protocols: [tcp, udp]
//! dynamic_range:
//!   min: 30000
//!   max: 32767
//! master_range:
//!   min: 1
//!   max: 65535
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod schema;
pub mod validator;

#[cfg(test)]
mod proptests;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::ConfigLoader;
pub use schema::{AllocatorConfig, RangeConfig};
pub use validator::ConfigValidator;
