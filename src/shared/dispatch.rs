use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::classify;
use crate::domain::{FieldValue, SensorKind, SensorService, TelemetryReport};
use crate::error::{BridgeError, FieldFailure, ParseError};
use crate::hap::{AccessoryHost, Characteristic, CharacteristicValue};
use crate::units;

/// A characteristic written during a dispatch pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedWrite {
    pub service: String,
    pub field: String,
    pub characteristic: Characteristic,
    pub value: CharacteristicValue,
}

/// Result of applying one report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchOutcome {
    /// Characteristic writes that reached the host
    pub applied: Vec<AppliedWrite>,
    /// Bound fields absent from the report (nothing written)
    pub skipped: Vec<String>,
    /// Fields whose conversion or write failed
    pub failures: Vec<FieldFailure>,
    /// Report fields bound to no service
    pub unmapped: Vec<String>,
}

impl DispatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: DispatchOutcome) {
        self.applied.extend(other.applied);
        self.skipped.extend(other.skipped);
        self.failures.extend(other.failures);
        self.unmapped.extend(other.unmapped);
    }
}

type Writes = Vec<(Characteristic, CharacteristicValue)>;

/// Apply every report field relevant to `service`
///
/// Writes are unconditional: every present field is re-asserted on every
/// call. A field that fails to convert is recorded and logged, and the
/// remaining fields are still applied. Absent fields write nothing.
pub fn apply(
    host: &mut dyn AccessoryHost,
    service: &SensorService,
    report: &TelemetryReport,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    let value_field = service.binding.value.as_str();

    match service.kind {
        SensorKind::Temperature => {
            apply_field(host, service, value_field, report, &mut outcome, |field, value| {
                let celsius = units::parse_fahrenheit(field, value)?;
                Ok(vec![
                    (Characteristic::CurrentTemperature, celsius.into()),
                    (Characteristic::Name, temperature_label(celsius).into()),
                ])
            });
        }
        SensorKind::Humidity => {
            apply_field(host, service, value_field, report, &mut outcome, |field, value| {
                let humidity = units::parse_humidity(field, value)?;
                Ok(vec![
                    (Characteristic::CurrentRelativeHumidity, humidity.into()),
                    (Characteristic::Name, humidity_label(humidity).into()),
                ])
            });
        }
        SensorKind::Occupancy => {
            apply_field(host, service, value_field, report, &mut outcome, |field, value| {
                let detected = units::parse_flag(field, value)?;
                Ok(vec![(
                    Characteristic::OccupancyDetected,
                    classify::occupancy(detected).into(),
                )])
            });
        }
        SensorKind::Motion => {
            apply_field(host, service, value_field, report, &mut outcome, |field, value| {
                let detected = units::parse_flag(field, value)?;
                Ok(vec![(
                    Characteristic::MotionDetected,
                    classify::motion(detected).into(),
                )])
            });
        }
        SensorKind::Battery => {
            apply_field(host, service, value_field, report, &mut outcome, |field, value| {
                let low = units::parse_flag(field, value)?;
                Ok(vec![(
                    Characteristic::StatusLowBattery,
                    classify::low_battery_status(low).into(),
                )])
            });

            if let Some(level_field) = service.binding.level.as_deref() {
                apply_field(host, service, level_field, report, &mut outcome, |field, value| {
                    let level = units::parse_battery_level(field, value)?;
                    Ok(vec![(
                        Characteristic::BatteryLevel,
                        CharacteristicValue::Int(level),
                    )])
                });
            }
        }
    }

    outcome
}

/// Apply a report to every service, then note the fields nothing consumed
pub fn apply_all(
    host: &mut dyn AccessoryHost,
    services: &[SensorService],
    report: &TelemetryReport,
) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();
    for service in services {
        outcome.merge(apply(host, service, report));
    }

    let bound: BTreeSet<&str> = services
        .iter()
        .flat_map(|service| service.binding.fields())
        .collect();
    for field in report.field_names().filter(|f| !bound.contains(f)) {
        debug!(error = %BridgeError::UnmappedField(field.to_string()), "Ignoring report field");
        outcome.unmapped.push(field.to_string());
    }

    outcome
}

pub fn temperature_label(celsius: f64) -> String {
    format!("Temperature: {}°", units::format_label_value(celsius))
}

pub fn humidity_label(humidity: f64) -> String {
    format!("Humidity: {}%", units::format_label_value(humidity))
}

fn apply_field<F>(
    host: &mut dyn AccessoryHost,
    service: &SensorService,
    field: &str,
    report: &TelemetryReport,
    outcome: &mut DispatchOutcome,
    convert: F,
) where
    F: FnOnce(&str, &FieldValue) -> Result<Writes, ParseError>,
{
    let Some(value) = report.get(field) else {
        debug!(service = %service.name, field = %field, "Field absent from report, skipping");
        outcome.skipped.push(field.to_string());
        return;
    };

    let writes = match convert(field, value) {
        Ok(writes) => writes,
        Err(e) => {
            warn!(
                service = %service.name,
                field = %field,
                error = %e,
                "Field conversion failed, keeping last written value"
            );
            outcome.failures.push(FieldFailure::from(&e));
            return;
        }
    };

    for (characteristic, value) in writes {
        match host.update_characteristic(service.handle, characteristic, value.clone()) {
            Ok(()) => outcome.applied.push(AppliedWrite {
                service: service.name.clone(),
                field: field.to_string(),
                characteristic,
                value,
            }),
            Err(e) => {
                warn!(
                    service = %service.name,
                    field = %field,
                    characteristic = %characteristic,
                    error = %e,
                    "Characteristic write failed"
                );
                outcome.failures.push(FieldFailure::host(field, &e));
            }
        }
    }
}
