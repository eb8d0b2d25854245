//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for property tests using the
//! proptest framework: site keys, service names, temperature readings,
//! decorated and malformed numeric strings, and ready-made accessories.

pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid site key in XX:XX:XX:XX:XX:XX format
    pub fn site_key() -> impl Strategy<Value = String> {
        prop::collection::vec(0u8..=255, 6).prop_map(|bytes| {
            bytes
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(":")
        })
    }

    /// Generate a pair of distinct site keys
    pub fn distinct_site_keys() -> impl Strategy<Value = (String, String)> {
        (site_key(), site_key()).prop_filter("site keys must differ", |(a, b)| a != b)
    }

    /// Generate a realistic sub-service name
    pub fn service_name() -> impl Strategy<Value = String> {
        prop_oneof![
            prop::sample::select(vec![
                "Outdoor Temperature".to_string(),
                "Outdoor Humidity".to_string(),
                "Indoor Temperature".to_string(),
                "Indoor Humidity".to_string(),
                "Outdoor Sensor".to_string(),
                "Occupancy".to_string(),
                "Motion".to_string(),
            ]),
            (1u8..=8, prop::sample::select(vec!["Temperature", "Humidity", "Battery"]))
                .prop_map(|(n, kind)| format!("Channel {} {}", n, kind)),
            prop::string::string_regex("[A-Za-z][A-Za-z0-9 ]{0,40}")
                .expect("Valid regex for service_name"),
        ]
    }

    /// Generate a Fahrenheit reading within the hub's sensor range
    pub fn fahrenheit() -> impl Strategy<Value = f64> {
        -40.0f64..=185.0
    }

    /// Generate a humidity percentage with two decimals at most
    pub fn humidity_pct() -> impl Strategy<Value = f64> {
        (0u32..=10_000).prop_map(|hundredths| f64::from(hundredths) / 100.0)
    }

    /// Generate a numeric string wrapped in non-numeric decoration,
    /// in plain or exponent form
    /// Returns (decorated string, expected value)
    pub fn decorated_number() -> impl Strategy<Value = (String, f64)> {
        (
            humidity_pct(),
            any::<bool>(),
            prop::sample::select(vec!["", " ", "RH=", "humidity: "]),
            prop::sample::select(vec!["", " ", "%", " %RH"]),
        )
            .prop_map(|(value, exponent, prefix, suffix)| {
                let number = if exponent {
                    format!("{:e}", value)
                } else {
                    format!("{}", value)
                };
                (format!("{}{}{}", prefix, number, suffix), value)
            })
    }

    /// Generate a string that contains no digits at all
    pub fn malformed_number() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            Just("abc".to_string()),
            Just("--".to_string()),
            Just("N/A".to_string()),
            prop::string::string_regex("[a-zA-Z%=_ ]{1,20}").expect("Valid regex"),
        ]
    }
}

pub mod helpers {
    use crate::domain::{AccessoryDescriptor, BaseStationInfo};
    use crate::memory_host::MemoryAccessory;
    use crate::station::WeatherStation;

    /// Build a station and an empty accessory for `site_key`
    pub fn station(site_key: &str) -> (WeatherStation, MemoryAccessory) {
        let descriptor = AccessoryDescriptor::new(
            site_key,
            "GW1000",
            "Weather Station",
            BaseStationInfo::default(),
        );
        let host = MemoryAccessory::new(descriptor.external_id(), &descriptor.display_name);
        (WeatherStation::new(descriptor), host)
    }

    /// Helper to check if a string is a lowercase hex SHA-256 digest
    pub fn is_sha256_hex(s: &str) -> bool {
        s.len() == 64 && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{validate_mac_address, validate_service_name};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_site_key_generator(key in generators::site_key()) {
            prop_assert_eq!(key.len(), 17);
            prop_assert!(validate_mac_address(&key).is_ok());
        }

        #[test]
        fn test_service_name_generator(name in generators::service_name()) {
            prop_assert!(validate_service_name(&name).is_ok());
        }

        #[test]
        fn test_malformed_number_has_no_digits(input in generators::malformed_number()) {
            prop_assert!(!input.chars().any(|c| c.is_ascii_digit()));
        }

        #[test]
        fn test_distinct_site_keys_generator((a, b) in generators::distinct_site_keys()) {
            prop_assert_ne!(a, b);
        }
    }

    #[test]
    fn test_helpers_station() {
        let (station, host) = helpers::station("AA:BB:CC:DD:EE:FF");
        assert_eq!(station.descriptor().site_key, "AA:BB:CC:DD:EE:FF");
        assert_eq!(host.external_id(), "AA:BB:CC:DD:EE:FF-GW1000");
    }
}
