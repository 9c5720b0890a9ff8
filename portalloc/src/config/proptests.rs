//! Property-based tests for configuration validation.

use super::schema::{AllocatorConfig, RangeConfig};
use super::validator::ConfigValidator;
use super::ConfigLoader;
use crate::endpoint::Protocol;
use crate::error::Error;
use proptest::prelude::*;

// Strategy for generating well-formed bands
fn range_strategy() -> impl Strategy<Value = RangeConfig> {
    (1u16..=65535)
        .prop_flat_map(|min| (Just(min), min..=65535))
        .prop_map(|(min, max)| RangeConfig { min, max })
}

// A master band and a dynamic band nested inside it
fn nested_strategy() -> impl Strategy<Value = (RangeConfig, RangeConfig)> {
    range_strategy().prop_flat_map(|master| {
        (master.min..=master.max)
            .prop_flat_map(move |min| (Just(master), Just(min), min..=master.max))
            .prop_map(|(master, min, max)| (master, RangeConfig { min, max }))
    })
}

fn protocols_strategy() -> impl Strategy<Value = Vec<Protocol>> {
    prop_oneof![
        Just(vec![Protocol::Tcp]),
        Just(vec![Protocol::Udp]),
        Just(vec![Protocol::Tcp, Protocol::Udp]),
        Just(vec![Protocol::Udp, Protocol::Tcp]),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Any dynamic band nested in its master band validates
    #[test]
    fn nested_bands_are_valid(
        (master, dynamic) in nested_strategy(),
        protocols in protocols_strategy()
    ) {
        let config = AllocatorConfig { protocols, dynamic_range: dynamic, master_range: master };
        prop_assert!(ConfigValidator::validate(&config).is_ok());
    }

    // A dynamic band reaching outside the master band is rejected
    #[test]
    fn escaping_dynamic_band_is_rejected(
        master in range_strategy(),
        dynamic in range_strategy()
    ) {
        prop_assume!(dynamic.min < master.min || dynamic.max > master.max);
        let config = AllocatorConfig {
            dynamic_range: dynamic,
            master_range: master,
            ..Default::default()
        };
        let rejected = matches!(
            ConfigValidator::validate(&config),
            Err(Error::Validation { ref field, .. }) if field == "dynamic_range"
        );
        prop_assert!(rejected);
    }

    // Inverted bounds never validate
    #[test]
    fn inverted_range_is_rejected(
        (min, max) in (2u16..=65535).prop_flat_map(|min| (Just(min), 1..min))
    ) {
        let range = RangeConfig { min, max };
        prop_assert!(range.to_range("master_range").is_err());
    }

    // Serializing a config and loading it back yields the same config
    #[test]
    fn yaml_preserves_config(
        (master, dynamic) in nested_strategy(),
        protocols in protocols_strategy()
    ) {
        let config = AllocatorConfig { protocols, dynamic_range: dynamic, master_range: master };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded = ConfigLoader::from_yaml_str(&yaml).unwrap();
        prop_assert_eq!(loaded, config);
    }
}
