//! Property Test: Unit Conversion and Tolerant Parsing
//!
//! This property test verifies that:
//! - Fahrenheit readings convert to Celsius at the usual reference points
//! - Converted temperatures are rounded to one decimal place
//! - Numbers wrapped in prefixes or unit suffixes still parse
//! - Inputs without any digits fail with a ParseError naming the field

use ecowitt_bridge::error::ParseFailure;
use ecowitt_bridge::test_utils::generators;
use ecowitt_bridge::units::{parse_humidity, parse_number, to_celsius};
use ecowitt_bridge::FieldValue;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: conversion stays within 0.05 of the exact formula
    #[test]
    fn prop_celsius_close_to_exact(f in generators::fahrenheit()) {
        let exact = (f - 32.0) * 5.0 / 9.0;
        let converted = to_celsius(f);
        prop_assert!(
            (converted - exact).abs() <= 0.05 + 1e-9,
            "{}°F converted to {} but exact is {}",
            f,
            converted,
            exact
        );
    }

    /// Property: converted values carry at most one decimal
    #[test]
    fn prop_celsius_has_one_decimal(f in generators::fahrenheit()) {
        let converted = to_celsius(f);
        let tenths = converted * 10.0;
        prop_assert!((tenths - tenths.round()).abs() < 1e-6);
    }

    /// Property: conversion is monotonic
    #[test]
    fn prop_celsius_monotonic(a in generators::fahrenheit(), b in generators::fahrenheit()) {
        prop_assume!(a <= b);
        prop_assert!(to_celsius(a) <= to_celsius(b));
    }

    /// Property: decorated numeric strings parse to their numeric part
    #[test]
    fn prop_decorated_numbers_parse((input, expected) in generators::decorated_number()) {
        let parsed = parse_number("humidity", &input);
        prop_assert_eq!(parsed, Ok(expected));
    }

    /// Property: in-range humidity survives the text round trip
    #[test]
    fn prop_humidity_text_accepted(value in generators::humidity_pct()) {
        let parsed = parse_humidity("humidity", &FieldValue::Text(value.to_string()));
        prop_assert_eq!(parsed, Ok(value));
    }

    /// Property: inputs without digits are rejected
    #[test]
    fn prop_malformed_numbers_rejected(input in generators::malformed_number()) {
        let err = parse_number("tempf", &input).unwrap_err();
        prop_assert_eq!(err.field.as_str(), "tempf");
        prop_assert_eq!(err.reason, ParseFailure::NotNumeric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_reference_points() {
        assert_eq!(to_celsius(32.0), 0.0);
        assert_eq!(to_celsius(212.0), 100.0);
        assert_eq!(to_celsius(-40.0), -40.0);
        assert_eq!(to_celsius(68.0), 20.0);
        assert_eq!(to_celsius(98.6), 37.0);
    }

    #[test]
    fn test_humidity_out_of_range() {
        let err = parse_humidity("humidity", &FieldValue::Number(104.0)).unwrap_err();
        assert_eq!(err.reason, ParseFailure::OutOfRange);
    }
}
