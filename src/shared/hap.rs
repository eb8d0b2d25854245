//! Accessory-representation vocabulary and the host interface
//!
//! This module names the service types, characteristics and enumerated
//! values of the smart-home accessory protocol, and defines the
//! [`AccessoryHost`] trait through which the synchronization layer reads
//! and writes the external accessory tree. The layer never mutates that
//! tree except through these primitives.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HostError;
use crate::identity::ServiceIdentity;

// ============================================================================
// Service types and characteristics
// ============================================================================

/// Service types exposed by a weather-station accessory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    AccessoryInformation,
    TemperatureSensor,
    HumiditySensor,
    OccupancySensor,
    MotionSensor,
    Battery,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::AccessoryInformation => "accessory_information",
            ServiceType::TemperatureSensor => "temperature_sensor",
            ServiceType::HumiditySensor => "humidity_sensor",
            ServiceType::OccupancySensor => "occupancy_sensor",
            ServiceType::MotionSensor => "motion_sensor",
            ServiceType::Battery => "battery",
        }
    }
}

/// Characteristic keys written by this layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Characteristic {
    Name,
    ConfiguredName,
    Manufacturer,
    Model,
    SerialNumber,
    ProductData,
    HardwareRevision,
    SoftwareRevision,
    FirmwareRevision,
    CurrentTemperature,
    CurrentRelativeHumidity,
    OccupancyDetected,
    MotionDetected,
    BatteryLevel,
    ChargingState,
    StatusLowBattery,
    StatusActive,
}

impl fmt::Display for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A characteristic value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CharacteristicValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CharacteristicValue::Float(v) => Some(*v),
            CharacteristicValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CharacteristicValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        CharacteristicValue::Bool(value)
    }
}

impl From<f64> for CharacteristicValue {
    fn from(value: f64) -> Self {
        CharacteristicValue::Float(value)
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        CharacteristicValue::Text(value.to_string())
    }
}

impl From<String> for CharacteristicValue {
    fn from(value: String) -> Self {
        CharacteristicValue::Text(value)
    }
}

// ============================================================================
// Enumerated characteristic values
// ============================================================================

/// OccupancyDetected characteristic values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OccupancyDetected {
    NotDetected = 0,
    Detected = 1,
}

/// StatusLowBattery characteristic values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusLowBattery {
    Normal = 0,
    Low = 1,
}

/// ChargingState characteristic values
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargingState {
    NotCharging = 0,
    Charging = 1,
    NotChargeable = 2,
}

macro_rules! enumerated_value {
    ($ty:ty) => {
        impl From<$ty> for CharacteristicValue {
            fn from(value: $ty) -> Self {
                CharacteristicValue::Int(value as i64)
            }
        }
    };
}

enumerated_value!(OccupancyDetected);
enumerated_value!(StatusLowBattery);
enumerated_value!(ChargingState);

// ============================================================================
// Host interface
// ============================================================================

/// Opaque reference to a service attached to an accessory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceHandle(pub usize);

/// Accessory-representation host
///
/// The host owns all durable state: service instances, their identities and
/// their last written characteristic values.
pub trait AccessoryHost {
    /// Look up a service by its display name
    fn get_service(&self, name: &str) -> Option<ServiceHandle>;

    /// Look up a service by its identity
    fn service_by_identity(&self, identity: &ServiceIdentity) -> Option<ServiceHandle>;

    /// Display name a service was registered under
    fn service_name(&self, service: ServiceHandle) -> Option<&str>;

    fn service_type(&self, service: ServiceHandle) -> Option<ServiceType>;

    /// The accessory information service
    fn information_service(&self) -> Result<ServiceHandle, HostError>;

    /// Attach a new service. Fails if `identity` is already attached.
    fn add_service(
        &mut self,
        service_type: ServiceType,
        name: &str,
        identity: &ServiceIdentity,
    ) -> Result<ServiceHandle, HostError>;

    /// Set a characteristic value (a client-visible write)
    fn set_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError>;

    /// Push an updated characteristic value (a notification)
    fn update_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError>;

    /// Declare an optional characteristic on the service
    fn add_optional_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
    ) -> Result<(), HostError>;

    /// Add a characteristic with an initial value
    fn add_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError>;

    /// Read back the current value of a characteristic
    fn characteristic(&self, service: ServiceHandle, key: Characteristic)
        -> Option<&CharacteristicValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerated_values() {
        assert_eq!(
            CharacteristicValue::from(OccupancyDetected::Detected),
            CharacteristicValue::Int(1)
        );
        assert_eq!(
            CharacteristicValue::from(OccupancyDetected::NotDetected),
            CharacteristicValue::Int(0)
        );
        assert_eq!(
            CharacteristicValue::from(StatusLowBattery::Low),
            CharacteristicValue::Int(1)
        );
        assert_eq!(
            CharacteristicValue::from(StatusLowBattery::Normal),
            CharacteristicValue::Int(0)
        );
        assert_eq!(
            CharacteristicValue::from(ChargingState::NotChargeable),
            CharacteristicValue::Int(2)
        );
    }

    #[test]
    fn test_enumerated_serialization() {
        assert_eq!(
            serde_json::to_string(&StatusLowBattery::Low).unwrap(),
            "\"LOW\""
        );
        assert_eq!(
            serde_json::to_string(&OccupancyDetected::NotDetected).unwrap(),
            "\"NOT_DETECTED\""
        );
    }

    #[test]
    fn test_characteristic_value_untagged() {
        let json = serde_json::to_string(&CharacteristicValue::Float(20.5)).unwrap();
        assert_eq!(json, "20.5");

        let json = serde_json::to_string(&CharacteristicValue::Text("x".into())).unwrap();
        assert_eq!(json, "\"x\"");
    }

    #[test]
    fn test_characteristic_value_accessors() {
        assert_eq!(CharacteristicValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CharacteristicValue::Bool(true).as_f64(), None);
        assert_eq!(CharacteristicValue::from("abc").as_text(), Some("abc"));
    }

    #[test]
    fn test_service_type_as_str() {
        assert_eq!(ServiceType::Battery.as_str(), "battery");
        assert_eq!(
            ServiceType::TemperatureSensor.as_str(),
            "temperature_sensor"
        );
    }
}
