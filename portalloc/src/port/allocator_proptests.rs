//! Property-based tests for service-level allocation.
//!
//! Services are generated against a deliberately small dynamic band so that
//! conflicts and exhaustion occur often.

use std::collections::HashSet;

use super::{PortAllocator, PortRange};
use crate::endpoint::{PortConfig, Protocol, PublishMode, Service};
use crate::idempotency::ports_allocated;
use crate::reconcile::reconcile;
use proptest::prelude::*;

const DYNAMIC_MIN: u16 = 40000;
const DYNAMIC_MAX: u16 = 40015;

fn small_allocator() -> PortAllocator {
    PortAllocator::with_bands(
        &Protocol::ALL,
        PortRange::from_values(DYNAMIC_MIN, DYNAMIC_MAX).unwrap(),
        PortRange::from_values(39990, 40025).unwrap(),
    )
    .unwrap()
}

fn protocol_strategy() -> impl Strategy<Value = Protocol> {
    prop_oneof![Just(Protocol::Tcp), Just(Protocol::Udp)]
}

/// A binding that is either dynamic (0) or explicit in or around the master
/// band; a few are host-mode.
fn port_config_strategy() -> impl Strategy<Value = PortConfig> {
    (
        "[a-c]",
        protocol_strategy(),
        1u16..=4,
        prop_oneof![Just(0u16), 39990u16..=40025],
        prop::bool::weighted(0.15),
    )
        .prop_map(|(name, protocol, target, published, host)| {
            let config = PortConfig::new(name, protocol, target, published);
            if host {
                config.with_publish_mode(PublishMode::Host)
            } else {
                config
            }
        })
}

fn ports_strategy() -> impl Strategy<Value = Vec<PortConfig>> {
    prop::collection::vec(port_config_strategy(), 0..5)
}

/// Snapshot of every held port in the master band.
fn held(allocator: &PortAllocator) -> Vec<(Protocol, u16)> {
    Protocol::ALL
        .iter()
        .flat_map(|&protocol| {
            (39990u16..=40025)
                .filter(move |&port| allocator.is_reserved(protocol, port))
                .map(move |port| (protocol, port))
        })
        .collect()
}

fn ingress_ports(service: &Service) -> Vec<(Protocol, u16)> {
    service
        .live_ports()
        .unwrap_or_default()
        .iter()
        .filter(|port| port.is_ingress())
        .map(|port| (port.protocol, port.published_port))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 500,
        .. ProptestConfig::default()
    })]

    // No two successfully allocated services share an ingress port
    #[test]
    fn allocated_services_never_share_ports(specs in prop::collection::vec(ports_strategy(), 1..8)) {
        let allocator = small_allocator();
        let mut seen = HashSet::new();

        for (index, ports) in specs.into_iter().enumerate() {
            let mut service = Service::new(format!("svc-{index}")).with_spec(ports);
            if allocator.service_allocate_ports(&mut service).is_ok() {
                for key in ingress_ports(&service) {
                    prop_assert!(seen.insert(key), "{:?} handed out twice", key);
                    prop_assert!(allocator.is_reserved(key.0, key.1));
                }
            }
        }
        prop_assert_eq!(held(&allocator).len(), seen.len());
    }

    // A failed allocation leaves the allocator and the service unchanged
    #[test]
    fn failed_allocation_changes_nothing(
        first in ports_strategy(),
        second in ports_strategy(),
        update in ports_strategy()
    ) {
        let allocator = small_allocator();
        let mut other = Service::new("other").with_spec(first);
        let _ = allocator.service_allocate_ports(&mut other);

        let mut service = Service::new("svc").with_spec(second);
        if allocator.service_allocate_ports(&mut service).is_err() {
            service.endpoint = None;
        }

        service.spec = Some(crate::EndpointSpec { ports: update });
        let before_state = held(&allocator);
        let before_service = service.clone();

        if allocator.service_allocate_ports(&mut service).is_err() {
            prop_assert_eq!(held(&allocator), before_state);
            prop_assert_eq!(service, before_service);
        }
    }

    // Success satisfies the allocation check and a repeat pass is a no-op
    #[test]
    fn allocation_is_idempotent(ports in ports_strategy()) {
        let allocator = small_allocator();
        let mut service = Service::new("svc").with_spec(ports);

        if allocator.service_allocate_ports(&mut service).is_ok() {
            prop_assert!(allocator.is_ports_allocated(&service));

            let state = held(&allocator);
            let snapshot = service.clone();
            allocator.service_allocate_ports(&mut service).unwrap();
            prop_assert_eq!(held(&allocator), state);
            prop_assert_eq!(service, snapshot);
        }
    }

    // Deallocating every service frees every port
    #[test]
    fn deallocation_frees_everything(specs in prop::collection::vec(ports_strategy(), 1..6)) {
        let allocator = small_allocator();
        let mut services = Vec::new();
        for (index, ports) in specs.into_iter().enumerate() {
            let mut service = Service::new(format!("svc-{index}")).with_spec(ports);
            if allocator.service_allocate_ports(&mut service).is_ok() {
                services.push(service);
            }
        }

        for service in &mut services {
            allocator.service_deallocate_ports(service).unwrap();
            prop_assert!(service.endpoint.is_none());
        }
        prop_assert!(held(&allocator).is_empty());
        prop_assert_eq!(
            allocator.available_dynamic(Protocol::Tcp),
            Some(usize::from(DYNAMIC_MAX - DYNAMIC_MIN) + 1)
        );
    }

    // Reconcile keeps desired length and order, and only fills wildcards
    #[test]
    fn reconcile_preserves_desired_shape(desired in ports_strategy(), live in ports_strategy()) {
        let result = reconcile(&desired, &live);
        prop_assert_eq!(result.len(), desired.len());
        for (out, want) in result.iter().zip(&desired) {
            prop_assert_eq!(out.key(), want.key());
            if want.published_port != 0 {
                prop_assert_eq!(out.published_port, want.published_port);
            }
        }
    }

    // A fully assigned list satisfies itself in any order
    #[test]
    fn assigned_list_satisfies_itself(ports in ports_strategy()) {
        let assigned: Vec<PortConfig> = ports
            .into_iter()
            .map(|mut port| {
                if port.published_port == 0 {
                    port.published_port = DYNAMIC_MIN;
                }
                port
            })
            .collect();
        let mut shuffled = assigned.clone();
        shuffled.reverse();
        prop_assert!(ports_allocated(Some(&assigned), Some(&shuffled)));
    }
}
