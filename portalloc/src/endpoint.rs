//! Service endpoint types: desired port specs and live port allocations.
//!
//! A [`Service`] carries the user's desired [`EndpointSpec`] and the
//! allocator-owned live [`Endpoint`]. Both are ordered lists of
//! [`PortConfig`] entries, matched across the two sides by [`PortKey`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Transport protocol of a published port.
///
/// Each protocol has its own, fully independent port spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

impl Protocol {
    /// Every protocol known to this crate.
    pub const ALL: [Self; 2] = [Self::Tcp, Self::Udp];

    /// Lowercase protocol name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = Error;

    /// Parses `tcp` or `udp`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            _ => Err(Error::Validation {
                field: "protocol".into(),
                message: format!("unknown protocol: {s}"),
            }),
        }
    }
}

/// How a published port is exposed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Routed through the cluster-wide load balancer; the published port is
    /// exclusive across the cluster.
    #[default]
    Ingress,
    /// Bound directly on the node running the task; not tracked cluster-wide.
    Host,
}

/// One published-port binding of a service.
///
/// A `published_port` of 0 means "not assigned yet": the allocator picks a
/// number from the dynamic band.
///
/// # Examples
///
/// ```
/// use portalloc::{PortConfig, Protocol, PublishMode};
///
/// let web = PortConfig::new("web", Protocol::Tcp, 80, 0);
/// assert!(web.needs_assignment());
///
/// let metrics = PortConfig::new("metrics", Protocol::Tcp, 9100, 9100)
///     .with_publish_mode(PublishMode::Host);
/// assert!(!metrics.is_ingress());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortConfig {
    /// Name of the binding, unique within a service's port list.
    pub name: String,
    /// Transport protocol.
    pub protocol: Protocol,
    /// Port the container listens on.
    pub target_port: u16,
    /// Externally visible port, or 0 when not yet assigned.
    #[serde(default)]
    pub published_port: u16,
    /// Exposure mode.
    #[serde(default)]
    pub publish_mode: PublishMode,
}

impl PortConfig {
    /// Creates an ingress-mode binding.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        protocol: Protocol,
        target_port: u16,
        published_port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            protocol,
            target_port,
            published_port,
            publish_mode: PublishMode::Ingress,
        }
    }

    /// Sets the publish mode.
    #[must_use]
    pub fn with_publish_mode(mut self, publish_mode: PublishMode) -> Self {
        self.publish_mode = publish_mode;
        self
    }

    /// Identity of this binding for desired/live matching.
    #[must_use]
    pub fn key(&self) -> PortKey<'_> {
        PortKey {
            name: &self.name,
            protocol: self.protocol,
            target_port: self.target_port,
            publish_mode: self.publish_mode,
        }
    }

    /// Returns `true` if this binding is subject to cluster-wide exclusivity.
    #[must_use]
    pub fn is_ingress(&self) -> bool {
        self.publish_mode == PublishMode::Ingress
    }

    /// Returns `true` if the allocator still has to choose a published port.
    #[must_use]
    pub const fn needs_assignment(&self) -> bool {
        self.published_port == 0
    }
}

impl fmt::Display for PortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}->{}/{}",
            self.name, self.published_port, self.target_port, self.protocol
        )
    }
}

/// Identity of a port binding: everything except the published port.
///
/// The published port is the value being tracked, so two entries with the
/// same key describe the same binding even when their published ports differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortKey<'a> {
    /// Binding name.
    pub name: &'a str,
    /// Transport protocol.
    pub protocol: Protocol,
    /// Container-side port.
    pub target_port: u16,
    /// Exposure mode.
    pub publish_mode: PublishMode,
}

/// Desired published ports of a service, as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSpec {
    /// Ordered list of desired bindings.
    #[serde(default)]
    pub ports: Vec<PortConfig>,
}

/// Live published ports of a service, as reserved by the allocator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Ordered list of allocated bindings.
    #[serde(default)]
    pub ports: Vec<PortConfig>,
}

/// A service as seen by the port allocator.
///
/// Either side may be absent, meaning "no published ports".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service name, used in diagnostics.
    pub name: String,
    /// Desired endpoint configuration.
    #[serde(default)]
    pub spec: Option<EndpointSpec>,
    /// Live endpoint allocation.
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
}

impl Service {
    /// Creates a service with neither a spec nor a live endpoint.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: None,
            endpoint: None,
        }
    }

    /// Sets the desired ports.
    #[must_use]
    pub fn with_spec(mut self, ports: Vec<PortConfig>) -> Self {
        self.spec = Some(EndpointSpec { ports });
        self
    }

    /// Sets the live ports.
    #[must_use]
    pub fn with_endpoint(mut self, ports: Vec<PortConfig>) -> Self {
        self.endpoint = Some(Endpoint { ports });
        self
    }

    /// Desired ports, if a spec is present.
    #[must_use]
    pub fn desired_ports(&self) -> Option<&[PortConfig]> {
        self.spec.as_ref().map(|spec| spec.ports.as_slice())
    }

    /// Live ports, if an endpoint is present.
    #[must_use]
    pub fn live_ports(&self) -> Option<&[PortConfig]> {
        self.endpoint.as_ref().map(|endpoint| endpoint.ports.as_slice())
    }
}
