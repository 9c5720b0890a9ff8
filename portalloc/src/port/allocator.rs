//! Service-level published-port allocation.
//!
//! [`PortAllocator`] owns one [`ProtocolSpace`] per supported protocol and
//! drives whole services through it: reconcile the desired ports against
//! the live ones, hold whatever is new, and commit the result onto the
//! service only when every binding succeeded.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::{AllocatorConfig, ConfigValidator};
use crate::endpoint::{Endpoint, PortConfig, Protocol, Service};
use crate::error::{Error, Result};
use crate::idempotency::ports_allocated;
use crate::reconcile::reconcile;

use super::bands::ProtocolSpace;
use super::{Port, PortRange};

/// Allocates published ports for services.
///
/// The allocator keeps its occupancy purely in memory. After a restart it is
/// rebuilt by passing every live [`Endpoint`] to [`restore`](Self::restore)
/// before serving requests.
///
/// Each protocol's spaces sit behind their own lock. A service pass locks
/// every protocol it touches, in protocol order, and holds the locks until
/// the pass has either committed or rolled back.
///
/// # Examples
///
/// ```
/// use portalloc::{PortAllocator, PortConfig, Protocol, Service};
///
/// let allocator = PortAllocator::new(&[Protocol::Tcp, Protocol::Udp]).unwrap();
///
/// let mut service = Service::new("web").with_spec(vec![
///     PortConfig::new("http", Protocol::Tcp, 80, 8080),
///     PortConfig::new("admin", Protocol::Tcp, 9000, 0),
/// ]);
/// assert!(!allocator.is_ports_allocated(&service));
///
/// allocator.service_allocate_ports(&mut service).unwrap();
/// let live = &service.endpoint.as_ref().unwrap().ports;
/// assert_eq!(live[0].published_port, 8080);
/// assert_eq!(live[1].published_port, 30000);
/// assert!(allocator.is_ports_allocated(&service));
/// ```
#[derive(Debug)]
pub struct PortAllocator {
    spaces: BTreeMap<Protocol, Mutex<ProtocolSpace>>,
    dynamic: PortRange,
    master: PortRange,
}

impl PortAllocator {
    /// Creates an allocator for `protocols` with the default bands
    /// (dynamic 30000-32767, master 1-65535).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `protocols` is empty.
    pub fn new(protocols: &[Protocol]) -> Result<Self> {
        Self::with_bands(protocols, PortRange::DEFAULT_DYNAMIC, PortRange::FULL)
    }

    /// Creates an allocator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn with_config(config: &AllocatorConfig) -> Result<Self> {
        ConfigValidator::validate(config)?;
        Self::with_bands(
            &config.protocols,
            config.dynamic_range.to_range("dynamic_range")?,
            config.master_range.to_range("master_range")?,
        )
    }

    /// Creates an allocator with explicit bands.
    ///
    /// Repeated protocols are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `protocols` is empty or `dynamic` is
    /// not inside `master`.
    pub fn with_bands(protocols: &[Protocol], dynamic: PortRange, master: PortRange) -> Result<Self> {
        if protocols.is_empty() {
            return Err(Error::Validation {
                field: "protocols".into(),
                message: "at least one protocol is required".into(),
            });
        }

        let mut spaces = BTreeMap::new();
        for &protocol in protocols {
            if !spaces.contains_key(&protocol) {
                let space = ProtocolSpace::new(protocol, dynamic, master)?;
                spaces.insert(protocol, Mutex::new(space));
            }
        }

        log::debug!(
            "port allocator ready for {:?} (dynamic {dynamic}, master {master})",
            spaces.keys().collect::<Vec<_>>()
        );
        Ok(Self {
            spaces,
            dynamic,
            master,
        })
    }

    /// Protocols this allocator serves, in ascending order.
    #[must_use]
    pub fn protocols(&self) -> Vec<Protocol> {
        self.spaces.keys().copied().collect()
    }

    /// The band auto-assigned ports are drawn from.
    #[must_use]
    pub const fn dynamic_range(&self) -> PortRange {
        self.dynamic
    }

    /// The band explicit ports may be requested from.
    #[must_use]
    pub const fn master_range(&self) -> PortRange {
        self.master
    }

    /// Returns `true` if `port` is held for `protocol`.
    ///
    /// Unsupported protocols hold nothing.
    #[must_use]
    pub fn is_reserved(&self, protocol: Protocol, port: u16) -> bool {
        self.spaces
            .get(&protocol)
            .is_some_and(|space| lock(space).is_reserved(port))
    }

    /// Number of ports still free in `protocol`'s dynamic band.
    #[must_use]
    pub fn available_dynamic(&self, protocol: Protocol) -> Option<usize> {
        self.spaces
            .get(&protocol)
            .map(|space| lock(space).dynamic().available_count())
    }

    /// Returns `true` if the service's live ports already satisfy its spec.
    ///
    /// This is a pure check on the service; allocator state is not consulted.
    #[must_use]
    pub fn is_ports_allocated(&self, service: &Service) -> bool {
        ports_allocated(service.desired_ports(), service.live_ports())
    }

    /// Brings the service's live ports in line with its desired ports.
    ///
    /// The desired list is reconciled against the live one, carrying
    /// previously granted ports forward for bindings that leave their
    /// published port unassigned. Live ports that are reserved here are kept
    /// as they are; anything else, including live ports this allocator never
    /// recorded, is reserved, and live ports the result no
    /// longer uses are released. On success `service.endpoint` is replaced
    /// by the reconciled list in desired order.
    ///
    /// A service without a desired spec has its live ingress ports released
    /// and its endpoint cleared; if it holds none, the call does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PortConflict`], [`Error::NoAvailablePorts`] or
    /// [`Error::UnsupportedProtocol`] from the first binding that fails.
    /// Everything reserved by the failing call is released again and the
    /// service is left untouched.
    pub fn service_allocate_ports(&self, service: &mut Service) -> Result<()> {
        if service.spec.is_none() {
            return self.release_unwanted(service);
        }
        let desired = service.desired_ports().unwrap_or_default();
        let live = service.live_ports().unwrap_or_default();

        let mut target = reconcile(desired, live);
        let mut spaces = self.lock_for(target.iter().chain(live))?;
        let mut held = held_ports(live);
        let mut fresh: Vec<(Protocol, Port)> = Vec::new();

        for entry in target.iter_mut().filter(|entry| entry.is_ingress()) {
            // A live port is only carried if this allocator actually holds it.
            if !entry.needs_assignment()
                && claim(&mut held, entry.protocol, entry.published_port)
                && spaces.is_reserved(entry.protocol, entry.published_port)
            {
                continue;
            }
            let result = spaces
                .get_mut(entry.protocol)
                .and_then(|space| space.allocate(entry));
            match result {
                Ok(Some(port)) => fresh.push((entry.protocol, port)),
                Ok(None) => {}
                Err(err) => {
                    log::warn!(
                        "allocating {entry} for service {} failed: {err}; rolling back {} port(s)",
                        service.name,
                        fresh.len()
                    );
                    spaces.rollback(&fresh);
                    return Err(err);
                }
            }
        }

        for ((protocol, port), count) in held {
            if count > 0 {
                log::debug!("releasing superseded port {port}/{protocol} of {}", service.name);
                spaces.release(protocol, port);
            }
        }
        drop(spaces);

        log::info!(
            "allocated {} new port(s) for service {}",
            fresh.len(),
            service.name
        );
        service.endpoint = Some(Endpoint { ports: target });
        Ok(())
    }

    /// Releases every published port the service holds and clears its
    /// endpoint.
    ///
    /// Host-mode bindings and unassigned bindings hold nothing and are
    /// skipped. Releasing a port that is not held is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedProtocol`] if a live binding uses a
    /// protocol this allocator does not serve; nothing is released then.
    pub fn service_deallocate_ports(&self, service: &mut Service) -> Result<()> {
        let Some(live) = service.live_ports() else {
            return Ok(());
        };

        let mut spaces = self.lock_for(live)?;
        for port in live.iter().filter(|port| holds_port(port)) {
            spaces.release(port.protocol, port.published_port);
        }
        drop(spaces);

        log::info!("released published ports of service {}", service.name);
        service.endpoint = None;
        Ok(())
    }

    /// Re-reserves the ports recorded in a live endpoint.
    ///
    /// Used at start-up to rebuild occupancy from durable state. Ingress
    /// bindings still at 0 are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first reservation error; ports reserved by this call are
    /// released again before returning.
    pub fn restore(&self, endpoint: &Endpoint) -> Result<()> {
        let mut spaces = self.lock_for(&endpoint.ports)?;
        let mut fresh: Vec<(Protocol, Port)> = Vec::new();

        for entry in endpoint.ports.iter().filter(|entry| entry.is_ingress()) {
            if entry.needs_assignment() {
                log::warn!("skipping unassigned live binding {entry} during restore");
                continue;
            }
            let result = spaces
                .get_mut(entry.protocol)
                .and_then(|space| space.reserve(entry.published_port));
            match result {
                Ok(port) => fresh.push((entry.protocol, port)),
                Err(err) => {
                    log::warn!("restoring {entry} failed: {err}");
                    spaces.rollback(&fresh);
                    return Err(err);
                }
            }
        }

        log::debug!("restored {} port(s)", fresh.len());
        Ok(())
    }

    fn release_unwanted(&self, service: &mut Service) -> Result<()> {
        let Some(live) = service.live_ports() else {
            return Ok(());
        };
        if !live.iter().any(holds_port) {
            return Ok(());
        }
        self.service_deallocate_ports(service)
    }

    /// Locks the spaces of every ingress protocol among `ports`.
    fn lock_for<'p>(&self, ports: impl IntoIterator<Item = &'p PortConfig>) -> Result<LockedSpaces<'_>> {
        let protocols: BTreeSet<Protocol> = ports
            .into_iter()
            .filter(|port| port.is_ingress())
            .map(|port| port.protocol)
            .collect();

        if let Some(&protocol) = protocols
            .iter()
            .find(|protocol| !self.spaces.contains_key(*protocol))
        {
            return Err(Error::UnsupportedProtocol { protocol });
        }

        // BTreeSet iteration gives every caller the same lock order.
        let guards = protocols
            .into_iter()
            .filter_map(|protocol| {
                self.spaces
                    .get(&protocol)
                    .map(|space| (protocol, lock(space)))
            })
            .collect();
        Ok(LockedSpaces { guards })
    }
}

/// The spaces locked for one operation.
struct LockedSpaces<'a> {
    guards: BTreeMap<Protocol, MutexGuard<'a, ProtocolSpace>>,
}

impl LockedSpaces<'_> {
    fn get_mut(&mut self, protocol: Protocol) -> Result<&mut ProtocolSpace> {
        self.guards
            .get_mut(&protocol)
            .map(|guard| &mut **guard)
            .ok_or(Error::UnsupportedProtocol { protocol })
    }

    fn is_reserved(&self, protocol: Protocol, port: u16) -> bool {
        self.guards
            .get(&protocol)
            .is_some_and(|space| space.is_reserved(port))
    }

    fn release(&mut self, protocol: Protocol, port: u16) {
        if let Some(space) = self.guards.get_mut(&protocol) {
            space.release(port);
        }
    }

    fn rollback(&mut self, reserved: &[(Protocol, Port)]) {
        for &(protocol, port) in reserved.iter().rev() {
            self.release(protocol, port.value());
        }
    }
}

/// Every mutation under the lock completes or is rolled back before a
/// fallible step returns, so a poisoned space is still consistent.
fn lock(space: &Mutex<ProtocolSpace>) -> MutexGuard<'_, ProtocolSpace> {
    space.lock().unwrap_or_else(PoisonError::into_inner)
}

fn holds_port(port: &PortConfig) -> bool {
    port.is_ingress() && !port.needs_assignment()
}

/// Ports held by a service's live ingress bindings, with multiplicity.
fn held_ports(live: &[PortConfig]) -> HashMap<(Protocol, u16), usize> {
    let mut held = HashMap::new();
    for port in live.iter().filter(|port| holds_port(port)) {
        *held.entry((port.protocol, port.published_port)).or_insert(0) += 1;
    }
    held
}

fn claim(held: &mut HashMap<(Protocol, u16), usize>, protocol: Protocol, port: u16) -> bool {
    match held.get_mut(&(protocol, port)) {
        Some(count) if *count > 0 => {
            *count -= 1;
            true
        }
        _ => false,
    }
}
