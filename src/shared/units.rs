use regex::Regex;
use std::sync::OnceLock;

use crate::domain::FieldValue;
use crate::error::{ParseError, ParseFailure};

pub const HUMIDITY_MIN_PCT: f64 = 0.0;
pub const HUMIDITY_MAX_PCT: f64 = 100.0;
pub const BATTERY_LEVEL_MIN_PCT: i64 = 0;
pub const BATTERY_LEVEL_MAX_PCT: i64 = 100;

/// Convert Fahrenheit to Celsius, rounded to one decimal place
pub fn to_celsius(fahrenheit: f64) -> f64 {
    round_tenths((fahrenheit - 32.0) * 5.0 / 9.0)
}

fn round_tenths(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid "-0" in labels
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Extract the first number embedded in `input`, ignoring surrounding text
/// ("55", " 55.5 %", "RH=47", "4.7e1" all parse)
pub fn parse_number(field: &str, input: &str) -> Result<f64, ParseError> {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NUMBER_REGEX.get_or_init(|| {
        Regex::new(r"[-+]?(\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?").expect("number pattern is valid")
    });

    regex
        .find(input)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::new(field, input, ParseFailure::NotNumeric))
}

/// Numeric value of a report field
pub fn numeric_value(field: &str, value: &FieldValue) -> Result<f64, ParseError> {
    match value {
        FieldValue::Number(n) if n.is_finite() => Ok(*n),
        FieldValue::Number(n) => Err(ParseError::new(
            field,
            n.to_string(),
            ParseFailure::NotNumeric,
        )),
        FieldValue::Text(text) => parse_number(field, text),
        FieldValue::Flag(flag) => Err(ParseError::new(
            field,
            flag.to_string(),
            ParseFailure::NotNumeric,
        )),
    }
}

/// Relative humidity percentage from a report field, validated to 0..=100
pub fn parse_humidity(field: &str, value: &FieldValue) -> Result<f64, ParseError> {
    let humidity = numeric_value(field, value)?;
    if !(HUMIDITY_MIN_PCT..=HUMIDITY_MAX_PCT).contains(&humidity) {
        return Err(ParseError::new(
            field,
            value.to_string(),
            ParseFailure::OutOfRange,
        ));
    }
    Ok(humidity)
}

/// Celsius temperature from a Fahrenheit report field
pub fn parse_fahrenheit(field: &str, value: &FieldValue) -> Result<f64, ParseError> {
    numeric_value(field, value).map(to_celsius)
}

/// Battery level percentage, clamped to the protocol's 0..=100 range
pub fn parse_battery_level(field: &str, value: &FieldValue) -> Result<i64, ParseError> {
    let level = numeric_value(field, value)?;
    Ok((level.round() as i64).clamp(BATTERY_LEVEL_MIN_PCT, BATTERY_LEVEL_MAX_PCT))
}

/// Boolean flag from a report field
/// Numbers are true when non-zero; text accepts true/false, on/off, yes/no or a number
pub fn parse_flag(field: &str, value: &FieldValue) -> Result<bool, ParseError> {
    match value {
        FieldValue::Flag(flag) => Ok(*flag),
        FieldValue::Number(n) => Ok(*n != 0.0),
        FieldValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" => Ok(true),
            "false" | "off" | "no" => Ok(false),
            _ => parse_number(field, text)
                .map(|n| n != 0.0)
                .map_err(|_| ParseError::new(field, text.as_str(), ParseFailure::NotAFlag)),
        },
    }
}

/// Format a value for a display label, without a trailing ".0"
pub fn format_label_value(value: f64) -> String {
    format!("{}", value)
}
