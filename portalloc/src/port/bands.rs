//! The dynamic/master band pair that backs one protocol.
//!
//! The master band spans every port that can be published and is the
//! authority for collisions. The dynamic band is the narrow sub-range used to
//! hand out ports for bindings that did not ask for one; explicit ports that
//! land inside it are mirrored there so they are never handed out twice.

use crate::endpoint::{PortConfig, Protocol};
use crate::error::{Error, Result};

use super::{Port, PortRange, PortSpace};

/// Both port spaces of one protocol.
///
/// Every method that touches both spaces either completes on both or leaves
/// both exactly as they were.
#[derive(Debug, Clone)]
pub struct ProtocolSpace {
    dynamic: PortSpace,
    master: PortSpace,
}

impl ProtocolSpace {
    /// Creates empty spaces for `protocol`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `dynamic` is not inside `master`.
    pub fn new(protocol: Protocol, dynamic: PortRange, master: PortRange) -> Result<Self> {
        if !dynamic.is_within(&master) {
            return Err(Error::Validation {
                field: "dynamic_range".into(),
                message: format!("dynamic band {dynamic} must lie inside master band {master}"),
            });
        }
        Ok(Self {
            dynamic: PortSpace::new(protocol, dynamic),
            master: PortSpace::new(protocol, master),
        })
    }

    /// The protocol these spaces track.
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.master.protocol()
    }

    /// The auto-assignment band.
    #[must_use]
    pub const fn dynamic(&self) -> &PortSpace {
        &self.dynamic
    }

    /// The collision-tracking band.
    #[must_use]
    pub const fn master(&self) -> &PortSpace {
        &self.master
    }

    /// Returns `true` if `port` is held by any binding of this protocol.
    #[must_use]
    pub fn is_reserved(&self, port: u16) -> bool {
        self.master.is_reserved(port)
    }

    /// Holds an explicitly requested port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPort`] for 0 and [`Error::PortConflict`] if the
    /// port is held already.
    pub fn reserve(&mut self, port: u16) -> Result<Port> {
        let port = self.master.reserve(port)?;
        if self.dynamic.contains(port.value()) {
            if let Err(err) = self.dynamic.reserve(port.value()) {
                self.master.release(port.value());
                return Err(err);
            }
        }
        Ok(port)
    }

    /// Holds the lowest free port of the dynamic band.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAvailablePorts`] when the dynamic band is full.
    pub fn reserve_dynamic(&mut self) -> Result<Port> {
        let port = self.dynamic.reserve_next()?;
        if let Err(err) = self.master.reserve(port.value()) {
            self.dynamic.release(port.value());
            return Err(err);
        }
        Ok(port)
    }

    /// Gives `config` a concrete published port.
    ///
    /// Host-mode bindings are left untouched and yield `None`. An unassigned
    /// binding gets a dynamic port written into `published_port`; an explicit
    /// one has its port held as requested.
    ///
    /// # Errors
    ///
    /// Propagates [`reserve`](Self::reserve) and
    /// [`reserve_dynamic`](Self::reserve_dynamic) errors; `config` is not
    /// modified on error.
    pub fn allocate(&mut self, config: &mut PortConfig) -> Result<Option<Port>> {
        if !config.is_ingress() {
            return Ok(None);
        }
        if config.needs_assignment() {
            let port = self.reserve_dynamic()?;
            config.published_port = port.value();
            log::debug!("assigned dynamic port {port}/{} to {}", self.protocol(), config.name);
            Ok(Some(port))
        } else {
            let port = self.reserve(config.published_port)?;
            log::debug!("reserved port {port}/{} for {}", self.protocol(), config.name);
            Ok(Some(port))
        }
    }

    /// Frees `port` in both bands. Freeing a free port is a no-op.
    ///
    /// Returns `true` if the port was held.
    pub fn release(&mut self, port: u16) -> bool {
        self.dynamic.release(port);
        self.master.release(port)
    }
}
