use regex::Regex;
use std::sync::OnceLock;

/// Maximum length of a service name, in characters
pub const MAX_SERVICE_NAME_CHARS: usize = 64;

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation error for field '{field}': {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate MAC address format (XX:XX:XX:XX:XX:XX with uppercase hex)
pub fn validate_mac_address(mac: &str) -> Result<(), ValidationError> {
    static MAC_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = MAC_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9A-F]{2}:[0-9A-F]{2}:[0-9A-F]{2}:[0-9A-F]{2}:[0-9A-F]{2}:[0-9A-F]{2}$")
            .expect("MAC pattern is valid")
    });

    if regex.is_match(mac) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "site_key",
            "MAC address must be in format XX:XX:XX:XX:XX:XX with uppercase hexadecimal",
        ))
    }
}

/// Validate a sub-service name
/// Non-empty, at most 64 characters, no control characters
pub fn validate_service_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "Service name cannot be empty"));
    }

    let chars = name.chars().count();
    if chars > MAX_SERVICE_NAME_CHARS {
        return Err(ValidationError::new(
            "name",
            format!(
                "Service name length {} exceeds maximum of {} characters",
                chars, MAX_SERVICE_NAME_CHARS
            ),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "name",
            "Service name must not contain control characters",
        ));
    }

    Ok(())
}
