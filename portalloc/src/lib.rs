#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # portalloc
//!
//! Published-port allocation for services exposed through a cluster
//! ingress.
//!
//! Each service declares the ports it wants to publish; the allocator
//! reconciles that declaration against what the service already holds,
//! assigns free numbers from a dynamic band where none was requested, and
//! guarantees that no two services hold the same published port for the
//! same protocol.
//!
//! ## Core Types
//!
//! - [`Port`] and [`PortRange`]: validated port numbers and bands
//! - [`PortSpace`] and [`ProtocolSpace`]: reservation state per band and
//!   per protocol
//! - [`PortAllocator`]: whole-service allocation, deallocation and the
//!   allocation check
//! - [`Service`], [`EndpointSpec`], [`Endpoint`] and [`PortConfig`]:
//!   the desired and live port declarations of a service
//! - [`reconcile`] and [`ports_allocated`]: the pure functions the
//!   allocator is built on
//! - [`AllocatorConfig`] and [`ConfigBuilder`]: configuration
//!
//! ## Examples
//!
//! ```
//! use portalloc::{PortAllocator, PortConfig, Protocol, Service};
//!
//! let allocator = PortAllocator::new(&[Protocol::Tcp]).unwrap();
//!
//! let mut web = Service::new("web").with_spec(vec![PortConfig::new("http", Protocol::Tcp, 80, 0)]);
//! allocator.service_allocate_ports(&mut web).unwrap();
//!
//! let assigned = web.live_ports().unwrap()[0].published_port;
//! assert!((30000..=32767).contains(&assigned));
//! assert!(allocator.is_ports_allocated(&web));
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod idempotency;
pub mod port;
pub mod reconcile;

// Re-export key types at crate root for convenience
pub use config::{AllocatorConfig, ConfigBuilder};
pub use endpoint::{Endpoint, EndpointSpec, PortConfig, PortKey, Protocol, PublishMode, Service};
pub use error::{Error, Result};
pub use idempotency::ports_allocated;
pub use port::{
    InvalidPortError, InvalidPortRangeError, Port, PortAllocator, PortRange, PortSpace,
    ProtocolSpace,
};
pub use reconcile::{dropped, reconcile};
