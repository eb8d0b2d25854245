use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::hap::{ServiceHandle, ServiceType};
use crate::identity::ServiceIdentity;

/// Immutable metadata reported by a base station
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BaseStationInfo {
    pub frequency: String,
    pub serial_number: String,
    pub hardware_revision: String,
    pub software_revision: String,
    pub firmware_revision: String,
}

/// One physical base station as seen by the accessory representation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessoryDescriptor {
    /// Identity namespace for sub-services (the hub's hardware address)
    pub site_key: String,
    pub model: String,
    pub display_name: String,
    pub info: BaseStationInfo,
}

impl AccessoryDescriptor {
    pub fn new(
        site_key: impl Into<String>,
        model: impl Into<String>,
        display_name: impl Into<String>,
        info: BaseStationInfo,
    ) -> Self {
        Self {
            site_key: site_key.into(),
            model: model.into(),
            display_name: display_name.into(),
            info,
        }
    }

    /// Stable external identifier, composite of site key and model
    pub fn external_id(&self) -> String {
        format!("{}-{}", self.site_key, self.model)
    }
}

/// Sensor channel kind
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Temperature,
    Humidity,
    Occupancy,
    Motion,
    Battery,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Temperature => "temperature",
            SensorKind::Humidity => "humidity",
            SensorKind::Occupancy => "occupancy",
            SensorKind::Motion => "motion",
            SensorKind::Battery => "battery",
        }
    }

    pub fn service_type(&self) -> ServiceType {
        match self {
            SensorKind::Temperature => ServiceType::TemperatureSensor,
            SensorKind::Humidity => ServiceType::HumiditySensor,
            SensorKind::Occupancy => ServiceType::OccupancySensor,
            SensorKind::Motion => ServiceType::MotionSensor,
            SensorKind::Battery => ServiceType::Battery,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Telemetry reports
// ============================================================================

/// Raw value of one report field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(v) => write!(f, "{}", v),
            FieldValue::Flag(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One reporting cycle's worth of raw field values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryReport {
    fields: BTreeMap<String, FieldValue>,
}

impl TelemetryReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Observation time from the hub's `dateutc` field
    /// Accepts "2024-01-15 10:30:00" and the form-encoded "2024-01-15+10:30:00"
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        let raw = match self.get("dateutc")? {
            FieldValue::Text(raw) => raw.replace('+', " "),
            _ => return None,
        };
        NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl<K, V> FromIterator<(K, V)> for TelemetryReport
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ============================================================================
// Sensor services
// ============================================================================

/// Report fields feeding one sensor service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    /// Primary field (temperature, humidity, occupancy/motion/low-battery flag)
    pub value: String,
    /// Battery level percentage field, battery services only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl FieldBinding {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            level: None,
        }
    }

    /// Default binding for the hub's outdoor array
    pub fn default_for(kind: SensorKind) -> Self {
        match kind {
            SensorKind::Temperature => Self::new("tempf"),
            SensorKind::Humidity => Self::new("humidity"),
            SensorKind::Occupancy => Self::new("occupancy"),
            SensorKind::Motion => Self::new("motion"),
            SensorKind::Battery => Self::new("wh65batt"),
        }
    }

    /// Binding for numbered channel `n` of a multi-channel sensor
    pub fn channel(kind: SensorKind, n: u8) -> Self {
        match kind {
            SensorKind::Temperature => Self::new(format!("temp{}f", n)),
            SensorKind::Humidity => Self::new(format!("humidity{}", n)),
            SensorKind::Battery => Self::new(format!("batt{}", n)),
            SensorKind::Occupancy | SensorKind::Motion => {
                Self::new(format!("{}{}", kind.as_str(), n))
            }
        }
    }

    /// Every report field this binding reads
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.value.as_str()).chain(self.level.as_deref())
    }
}

/// A sub-service representing one sensor channel on one accessory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorService {
    pub kind: SensorKind,
    pub name: String,
    pub identity: ServiceIdentity,
    pub handle: ServiceHandle,
    pub binding: FieldBinding,
}

impl SensorService {
    /// Rebind the primary report field
    pub fn bind(mut self, field: impl Into<String>) -> Self {
        self.binding.value = field.into();
        self
    }

    /// Bind a battery level percentage field
    pub fn bind_level(mut self, field: impl Into<String>) -> Self {
        self.binding.level = Some(field.into());
        self
    }

    /// Replace the whole binding
    pub fn with_binding(mut self, binding: FieldBinding) -> Self {
        self.binding = binding;
        self
    }
}
