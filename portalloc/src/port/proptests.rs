//! Property-based tests for `Port`, `PortRange` and `PortSpace`.

use std::collections::BTreeSet;

use super::{Port, PortRange, PortSpace};
use crate::endpoint::Protocol;
use proptest::prelude::*;

// Small bands keep exhaustion cheap.
fn band_strategy() -> impl Strategy<Value = PortRange> {
    (Port::MIN..=65000u16, 0u16..=200)
        .prop_map(|(min, size)| PortRange::from_values(min, min.saturating_add(size)).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        max_shrink_iters: 10000,
        .. ProptestConfig::default()
    })]

    // Every non-zero number is a port and keeps its value
    #[test]
    fn port_accepts_nonzero(value in Port::MIN..=Port::MAX) {
        let port = Port::try_from(value).unwrap();
        prop_assert_eq!(u16::from(port), value);
    }

    // from_values accepts exactly the ordered, non-zero pairs
    #[test]
    fn range_from_values_validity(min in any::<u16>(), max in any::<u16>()) {
        let valid = min >= Port::MIN && max >= min;
        prop_assert_eq!(PortRange::from_values(min, max).is_ok(), valid);
    }

    // len counts exactly the numbers contains_value accepts
    #[test]
    fn range_len_matches_contains(band in band_strategy()) {
        let lo = band.min().value().saturating_sub(3);
        let hi = band.max().value().saturating_add(3);
        let counted = (lo..=hi).filter(|&v| band.contains_value(v)).count();
        prop_assert_eq!(counted, band.len());
    }

    // reserve_next hands out each port of the band once, lowest first
    #[test]
    fn reserve_next_exhausts_band_in_order(band in band_strategy()) {
        let mut space = PortSpace::new(Protocol::Tcp, band);
        let mut previous = None;
        for _ in 0..band.len() {
            let port = space.reserve_next().unwrap();
            prop_assert!(band.contains(port));
            if let Some(prev) = previous {
                prop_assert!(port > prev);
            }
            previous = Some(port);
        }
        prop_assert!(space.reserve_next().unwrap_err().is_exhausted());
        prop_assert_eq!(space.available_count(), 0);
    }

    // After arbitrary reservations, reserve_next picks the lowest free port
    #[test]
    fn reserve_next_picks_lowest_free(
        band in band_strategy(),
        offsets in prop::collection::vec(0u16..=200, 0..50)
    ) {
        let mut space = PortSpace::new(Protocol::Udp, band);
        let mut held = BTreeSet::new();
        for offset in offsets {
            let value = band.min().value().saturating_add(offset);
            if band.contains_value(value) && space.reserve(value).is_ok() {
                held.insert(value);
            }
        }
        prop_assert_eq!(space.reserved_count(), held.len());

        let expected = (band.min().value()..=band.max().value()).find(|v| !held.contains(v));
        match expected {
            Some(value) => prop_assert_eq!(space.reserve_next().unwrap().value(), value),
            None => prop_assert!(space.reserve_next().is_err()),
        }
    }

    // A second reserve of the same port conflicts; release makes it free again
    #[test]
    fn reserve_release_cycle(band in band_strategy(), offset in 0usize..=200) {
        let offset = u16::try_from(offset % band.len()).unwrap();
        let value = band.min().value() + offset;

        let mut space = PortSpace::new(Protocol::Tcp, band);
        space.reserve(value).unwrap();
        prop_assert!(space.reserve(value).unwrap_err().is_conflict());
        prop_assert!(space.release(value));
        prop_assert!(!space.release(value));
        prop_assert!(!space.is_reserved(value));
        prop_assert_eq!(space.available_count(), band.len());
    }

    // Ports outside the band are never reservable
    #[test]
    fn reserve_outside_band_fails(band in band_strategy(), value in 1u16..=Port::MAX) {
        prop_assume!(!band.contains_value(value));
        let mut space = PortSpace::new(Protocol::Tcp, band);
        prop_assert!(space.reserve(value).is_err());
        prop_assert_eq!(space.reserved_count(), 0);
    }
}
