//! Common test utilities for integration tests.
//!
//! This module provides helper functions and fixture builders for testing
//! the portalloc library.

use portalloc::{PortAllocator, PortConfig, PortRange, Protocol, PublishMode, Service};

/// Shorthand for an ingress TCP binding.
#[allow(dead_code)]
pub fn tcp(name: &str, target: u16, published: u16) -> PortConfig {
    PortConfig::new(name, Protocol::Tcp, target, published)
}

/// Shorthand for an ingress UDP binding.
#[allow(dead_code)]
pub fn udp(name: &str, target: u16, published: u16) -> PortConfig {
    PortConfig::new(name, Protocol::Udp, target, published)
}

/// Shorthand for a host-mode TCP binding.
#[allow(dead_code)]
pub fn host_tcp(name: &str, target: u16, published: u16) -> PortConfig {
    tcp(name, target, published).with_publish_mode(PublishMode::Host)
}

/// TCP and UDP allocator with the default bands.
#[allow(dead_code)]
pub fn default_allocator() -> PortAllocator {
    PortAllocator::new(&Protocol::ALL).unwrap()
}

/// TCP and UDP allocator whose dynamic band holds `size` ports starting at
/// 40000.
#[allow(dead_code)]
pub fn small_allocator(size: u16) -> PortAllocator {
    let dynamic = PortRange::from_values(40000, 40000 + size - 1).unwrap();
    PortAllocator::with_bands(&Protocol::ALL, dynamic, PortRange::FULL).unwrap()
}

/// Published ports of a service's live bindings, in live order.
#[allow(dead_code)]
pub fn published(service: &Service) -> Vec<u16> {
    service
        .live_ports()
        .unwrap_or_default()
        .iter()
        .map(|port| port.published_port)
        .collect()
}

/// Builder for test services with sensible defaults.
///
/// # Examples
///
/// ```no_run
/// # use common::ServiceFixture;
/// let service = ServiceFixture::new("web")
///     .desired(tcp("http", 80, 0))
///     .build();
/// ```
#[allow(dead_code)]
pub struct ServiceFixture {
    name: String,
    desired: Option<Vec<PortConfig>>,
    live: Option<Vec<PortConfig>>,
}

#[allow(dead_code)]
impl ServiceFixture {
    /// Creates a fixture with no spec and no endpoint.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            desired: None,
            live: None,
        }
    }

    /// Appends a desired binding.
    pub fn desired(mut self, port: PortConfig) -> Self {
        self.desired.get_or_insert_with(Vec::new).push(port);
        self
    }

    /// Appends a live binding.
    pub fn live(mut self, port: PortConfig) -> Self {
        self.live.get_or_insert_with(Vec::new).push(port);
        self
    }

    /// Builds the service.
    pub fn build(self) -> Service {
        let mut service = Service::new(self.name);
        if let Some(ports) = self.desired {
            service = service.with_spec(ports);
        }
        if let Some(ports) = self.live {
            service = service.with_endpoint(ports);
        }
        service
    }
}
