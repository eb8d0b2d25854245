use ecowitt_bridge::{validate_mac_address, AccessoryDescriptor, BaseStationInfo};

/// Configuration for the bridge process
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Hub hardware address, the identity namespace for sub-services
    pub site_key: String,
    /// Hub model code (e.g., "GW1000")
    pub model: String,
    /// Accessory display name
    pub model_name: String,
    /// Immutable base station metadata
    pub info: BaseStationInfo,
    /// Whether battery services report a chargeable battery
    pub battery_chargeable: bool,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Create a Config from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let site_key = lookup("BRIDGE_SITE_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("BRIDGE_SITE_KEY".to_string()))?;
        validate_mac_address(&site_key)
            .map_err(|e| ConfigError::Invalid("BRIDGE_SITE_KEY".to_string(), e.message))?;

        let or_default = |name: &str, default: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let battery_chargeable = match lookup("BRIDGE_BATTERY_CHARGEABLE").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid(
                    "BRIDGE_BATTERY_CHARGEABLE".to_string(),
                    format!("expected true or false, got '{}'", other),
                ))
            }
        };

        Ok(Config {
            site_key,
            model: or_default("BRIDGE_MODEL", "GW1000"),
            model_name: or_default("BRIDGE_MODEL_NAME", "Weather Station"),
            info: BaseStationInfo {
                frequency: or_default("BRIDGE_FREQUENCY", "915"),
                serial_number: or_default("BRIDGE_SERIAL_NUMBER", "unknown"),
                hardware_revision: or_default("BRIDGE_HARDWARE_REVISION", "unknown"),
                software_revision: or_default("BRIDGE_SOFTWARE_REVISION", "unknown"),
                firmware_revision: or_default("BRIDGE_FIRMWARE_REVISION", "unknown"),
            },
            battery_chargeable,
        })
    }

    pub fn descriptor(&self) -> AccessoryDescriptor {
        AccessoryDescriptor::new(
            self.site_key.clone(),
            self.model.clone(),
            self.model_name.clone(),
            self.info.clone(),
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    Invalid(String, String),
}
