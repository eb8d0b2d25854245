//! Bridge process
//!
//! Reads hub telemetry reports as newline-delimited JSON on stdin, keeps the
//! accessory's sub-services in sync with each report and prints the final
//! accessory snapshot as JSON on stdout once the input is exhausted.
//! Logs go to stderr.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ecowitt_bridge::{
    AccessoryHost, FieldBinding, MemoryAccessory, SensorKind, SensorService, TelemetryReport,
    WeatherStation,
};

mod config;

use config::Config;

/// Number of numbered sensor channels a hub can pair with
const MAX_CHANNELS: u8 = 8;

/// A sub-service the bridge creates once its primary field shows up
#[derive(Debug, Clone)]
struct Channel {
    kind: SensorKind,
    name: String,
    binding: FieldBinding,
}

impl Channel {
    fn new(kind: SensorKind, name: impl Into<String>, binding: FieldBinding) -> Self {
        Self {
            kind,
            name: name.into(),
            binding,
        }
    }
}

fn default_channels() -> Vec<Channel> {
    let mut channels = vec![
        Channel::new(
            SensorKind::Temperature,
            "Outdoor Temperature",
            FieldBinding::default_for(SensorKind::Temperature),
        ),
        Channel::new(
            SensorKind::Humidity,
            "Outdoor Humidity",
            FieldBinding::default_for(SensorKind::Humidity),
        ),
        Channel::new(
            SensorKind::Temperature,
            "Indoor Temperature",
            FieldBinding::new("tempinf"),
        ),
        Channel::new(
            SensorKind::Humidity,
            "Indoor Humidity",
            FieldBinding::new("humidityin"),
        ),
        Channel::new(
            SensorKind::Battery,
            "Outdoor Sensor",
            FieldBinding::default_for(SensorKind::Battery),
        ),
    ];

    for n in 1..=MAX_CHANNELS {
        channels.push(Channel::new(
            SensorKind::Temperature,
            format!("Channel {} Temperature", n),
            FieldBinding::channel(SensorKind::Temperature, n),
        ));
        channels.push(Channel::new(
            SensorKind::Humidity,
            format!("Channel {} Humidity", n),
            FieldBinding::channel(SensorKind::Humidity, n),
        ));
        channels.push(Channel::new(
            SensorKind::Battery,
            format!("Channel {} Sensor", n),
            FieldBinding::channel(SensorKind::Battery, n),
        ));
    }

    channels
}

/// Log filter from `RUST_LOG` directives, `info` when unset or unparsable
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to load bridge configuration")?;
    let descriptor = config.descriptor();
    let mut host = MemoryAccessory::new(descriptor.external_id(), &descriptor.display_name);
    let station = WeatherStation::new(descriptor);

    station
        .install(&mut host)
        .context("Failed to install accessory information")?;

    let channels = default_channels();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut processed_count = 0;
    let mut skipped_count = 0;
    let mut error_count = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let report: TelemetryReport = match serde_json::from_str(line) {
            Ok(report) => report,
            Err(e) => {
                warn!("Skipping malformed report: {}", e);
                skipped_count += 1;
                continue;
            }
        };

        processed_count += 1;
        error_count +=
            process_report(&station, &mut host, &channels, &report, config.battery_chargeable);
    }

    info!(
        "Input exhausted: {} reports processed, {} skipped, {} errors",
        processed_count, skipped_count, error_count
    );

    let snapshot = serde_json::to_string_pretty(&host.snapshot())
        .context("Failed to serialize accessory snapshot")?;
    println!("{}", snapshot);

    Ok(())
}

/// Sync one report into the accessory, returning the number of failures
///
/// A channel whose service cannot be resolved is skipped; the rest of the
/// report is still applied.
fn process_report(
    station: &WeatherStation,
    host: &mut dyn AccessoryHost,
    channels: &[Channel],
    report: &TelemetryReport,
    battery_chargeable: bool,
) -> usize {
    let mut services: Vec<SensorService> = Vec::new();
    let mut unresolved = 0;

    for channel in channels {
        if !report.contains(&channel.binding.value) {
            continue;
        }

        let resolved = match channel.kind {
            SensorKind::Battery => station.add_battery(host, &channel.name, battery_chargeable),
            kind => station.registry().get_or_create(host, kind, &channel.name),
        };

        match resolved {
            Ok(service) => services.push(service.with_binding(channel.binding.clone())),
            Err(e) => {
                error!(
                    service = %channel.name,
                    error = %e,
                    "Failed to resolve service, skipping channel"
                );
                unresolved += 1;
            }
        }
    }

    let outcome = station.update(host, &services, report);

    match report.observed_at() {
        Some(observed_at) => info!(
            observed_at = %observed_at,
            applied = outcome.applied.len(),
            failures = outcome.failures.len(),
            "Applied report"
        ),
        None => info!(
            applied = outcome.applied.len(),
            failures = outcome.failures.len(),
            "Applied report without dateutc"
        ),
    }

    for failure in &outcome.failures {
        debug!(field = %failure.field, code = %failure.code, "{}", failure.message);
    }

    unresolved + outcome.failures.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecowitt_bridge::{AccessoryDescriptor, BaseStationInfo, Characteristic, CharacteristicValue};

    fn station() -> (WeatherStation, MemoryAccessory) {
        let descriptor = AccessoryDescriptor::new(
            "AA:BB:CC:DD:EE:FF",
            "GW1000",
            "Weather Station",
            BaseStationInfo::default(),
        );
        let host = MemoryAccessory::new(descriptor.external_id(), &descriptor.display_name);
        (WeatherStation::new(descriptor), host)
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("")).to_string(), "info");
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
        assert_eq!(
            log_filter(Some("ecowitt_bridge=debug")).to_string(),
            "ecowitt_bridge=debug"
        );
    }

    #[test]
    fn test_process_report_skips_unresolvable_channel() {
        let (station, mut host) = station();
        // Occupy the outdoor temperature name with a service of another kind
        station
            .registry()
            .get_or_create(&mut host, SensorKind::Humidity, "Outdoor Temperature")
            .unwrap();
        let report = TelemetryReport::new()
            .with("tempf", 68.0)
            .with("humidity", "47")
            .with("wh65batt", 0.0);

        let failures = process_report(&station, &mut host, &default_channels(), &report, false);

        assert_eq!(failures, 1);
        let humidity = host.get_service("Outdoor Humidity").unwrap();
        assert_eq!(
            host.characteristic(humidity, Characteristic::CurrentRelativeHumidity),
            Some(&CharacteristicValue::Float(47.0))
        );
        assert!(host.get_service("Outdoor Sensor").is_some());
        assert_eq!(host.services_added(), 3);
    }

    #[test]
    fn test_default_channels_are_unique() {
        let channels = default_channels();
        let mut names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), channels.len());
        assert_eq!(channels.len(), 5 + 3 * MAX_CHANNELS as usize);
    }

    #[test]
    fn test_process_report_creates_only_reported_services() {
        let (station, mut host) = station();
        let report: TelemetryReport = serde_json::from_str(
            r#"{"dateutc":"2024-03-01+12:00:00","tempf":"68","humidity":"47","temp2f":"32.0"}"#,
        )
        .unwrap();

        let failures =
            process_report(&station, &mut host, &default_channels(), &report, false);

        assert_eq!(failures, 0);
        assert_eq!(host.services_added(), 3);

        let outdoor = host.get_service("Outdoor Temperature").unwrap();
        assert_eq!(
            host.characteristic(outdoor, Characteristic::CurrentTemperature),
            Some(&CharacteristicValue::Float(20.0))
        );
        let channel = host.get_service("Channel 2 Temperature").unwrap();
        assert_eq!(
            host.characteristic(channel, Characteristic::CurrentTemperature),
            Some(&CharacteristicValue::Float(0.0))
        );
        assert!(host.get_service("Indoor Temperature").is_none());
    }

    #[test]
    fn test_process_report_is_idempotent_across_reports() {
        let (station, mut host) = station();
        let channels = default_channels();
        let report = TelemetryReport::new()
            .with("tempf", 50.0)
            .with("wh65batt", 0.0);

        for _ in 0..3 {
            process_report(&station, &mut host, &channels, &report, false);
        }

        assert_eq!(host.services_added(), 2);
    }

    #[test]
    fn test_process_report_counts_failures() {
        let (station, mut host) = station();
        let report = TelemetryReport::new()
            .with("tempf", "n/a")
            .with("humidity", "55");

        let failures =
            process_report(&station, &mut host, &default_channels(), &report, false);

        assert_eq!(failures, 1);
        let humidity = host.get_service("Outdoor Humidity").unwrap();
        assert_eq!(
            host.characteristic(humidity, Characteristic::CurrentRelativeHumidity),
            Some(&CharacteristicValue::Float(55.0))
        );
    }
}
