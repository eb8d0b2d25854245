use tracing::info;

use crate::domain::{AccessoryDescriptor, SensorKind, SensorService, TelemetryReport};
use crate::dispatch::{self, DispatchOutcome};
use crate::error::{BridgeError, HostError};
use crate::hap::{AccessoryHost, Characteristic, CharacteristicValue};
use crate::identity::{IdentityResolver, Sha256IdentityResolver};
use crate::registry::ServiceRegistry;

pub const MANUFACTURER: &str = "Ecowitt";

/// One base station and the services attached to its accessory
///
/// Holds no sensor state of its own: every operation takes the accessory
/// host explicitly, and the host remains the only record of current values.
pub struct WeatherStation {
    descriptor: AccessoryDescriptor,
    resolver: Box<dyn IdentityResolver>,
}

impl WeatherStation {
    pub fn new(descriptor: AccessoryDescriptor) -> Self {
        Self::with_resolver(descriptor, Box::new(Sha256IdentityResolver::new()))
    }

    pub fn with_resolver(
        descriptor: AccessoryDescriptor,
        resolver: Box<dyn IdentityResolver>,
    ) -> Self {
        Self {
            descriptor,
            resolver,
        }
    }

    pub fn descriptor(&self) -> &AccessoryDescriptor {
        &self.descriptor
    }

    pub fn registry(&self) -> ServiceRegistry<'_> {
        ServiceRegistry::new(&self.descriptor.site_key, self.resolver.as_ref())
    }

    // ------------------------------------------------------------------------
    // Accessory information
    // ------------------------------------------------------------------------

    /// Write manufacturer, product data, serial number, revisions and model
    pub fn install(&self, host: &mut dyn AccessoryHost) -> Result<(), HostError> {
        let info = &self.descriptor.info;
        let service = host.information_service()?;

        self.set_model(host, &self.descriptor.model, &self.descriptor.display_name)?;
        host.set_characteristic(service, Characteristic::Manufacturer, MANUFACTURER.into())?;
        host.set_characteristic(
            service,
            Characteristic::ProductData,
            format!("{}Hz", info.frequency).into(),
        )?;
        host.set_characteristic(
            service,
            Characteristic::SerialNumber,
            info.serial_number.as_str().into(),
        )?;
        host.set_characteristic(
            service,
            Characteristic::HardwareRevision,
            info.hardware_revision.as_str().into(),
        )?;
        host.set_characteristic(
            service,
            Characteristic::SoftwareRevision,
            info.software_revision.as_str().into(),
        )?;
        host.set_characteristic(
            service,
            Characteristic::FirmwareRevision,
            info.firmware_revision.as_str().into(),
        )?;
        host.add_optional_characteristic(service, Characteristic::ConfiguredName)?;

        info!(
            site_key = %self.descriptor.site_key,
            model = %self.descriptor.model,
            external_id = %self.descriptor.external_id(),
            "Installed accessory information"
        );
        Ok(())
    }

    pub fn set_model(
        &self,
        host: &mut dyn AccessoryHost,
        model: &str,
        name: &str,
    ) -> Result<(), HostError> {
        let service = host.information_service()?;
        host.set_characteristic(service, Characteristic::Model, model.into())?;
        host.set_characteristic(service, Characteristic::Name, name.into())
    }

    /// Current model as recorded by the host
    pub fn model<'h>(&self, host: &'h dyn AccessoryHost) -> Option<&'h str> {
        let service = host.information_service().ok()?;
        host.characteristic(service, Characteristic::Model)?.as_text()
    }

    pub fn set_serial_number(
        &self,
        host: &mut dyn AccessoryHost,
        serial_number: &str,
    ) -> Result<(), HostError> {
        let service = host.information_service()?;
        host.set_characteristic(service, Characteristic::SerialNumber, serial_number.into())
    }

    // ------------------------------------------------------------------------
    // Service labels and status
    // ------------------------------------------------------------------------

    pub fn set_name(
        &self,
        host: &mut dyn AccessoryHost,
        service: &SensorService,
        name: &str,
    ) -> Result<(), HostError> {
        host.set_characteristic(service.handle, Characteristic::Name, name.into())
    }

    pub fn update_name(
        &self,
        host: &mut dyn AccessoryHost,
        service: &SensorService,
        name: &str,
    ) -> Result<(), HostError> {
        host.update_characteristic(service.handle, Characteristic::Name, name.into())
    }

    /// Declare and fill the optional ConfiguredName characteristic
    pub fn set_configured_name(
        &self,
        host: &mut dyn AccessoryHost,
        service: &SensorService,
        name: &str,
    ) -> Result<(), HostError> {
        host.add_optional_characteristic(service.handle, Characteristic::ConfiguredName)?;
        host.add_characteristic(service.handle, Characteristic::ConfiguredName, name.into())
    }

    pub fn set_status_active(
        &self,
        host: &mut dyn AccessoryHost,
        service: &SensorService,
        active: bool,
    ) -> Result<(), HostError> {
        host.set_characteristic(
            service.handle,
            Characteristic::StatusActive,
            CharacteristicValue::Bool(active),
        )
    }

    pub fn update_status_active(
        &self,
        host: &mut dyn AccessoryHost,
        service: &SensorService,
        active: bool,
    ) -> Result<(), HostError> {
        host.update_characteristic(
            service.handle,
            Characteristic::StatusActive,
            CharacteristicValue::Bool(active),
        )
    }

    // ------------------------------------------------------------------------
    // Service creation and updates
    // ------------------------------------------------------------------------

    pub fn add_temperature_sensor(
        &self,
        host: &mut dyn AccessoryHost,
        name: &str,
    ) -> Result<SensorService, BridgeError> {
        self.registry()
            .get_or_create(host, SensorKind::Temperature, name)
    }

    pub fn add_humidity_sensor(
        &self,
        host: &mut dyn AccessoryHost,
        name: &str,
    ) -> Result<SensorService, BridgeError> {
        self.registry().get_or_create(host, SensorKind::Humidity, name)
    }

    pub fn add_occupancy_sensor(
        &self,
        host: &mut dyn AccessoryHost,
        name: &str,
    ) -> Result<SensorService, BridgeError> {
        self.registry().get_or_create(host, SensorKind::Occupancy, name)
    }

    pub fn add_motion_sensor(
        &self,
        host: &mut dyn AccessoryHost,
        name: &str,
    ) -> Result<SensorService, BridgeError> {
        self.registry().get_or_create(host, SensorKind::Motion, name)
    }

    pub fn add_battery(
        &self,
        host: &mut dyn AccessoryHost,
        name: &str,
        chargeable: bool,
    ) -> Result<SensorService, BridgeError> {
        self.registry()
            .get_or_create_battery(host, name, chargeable)
    }

    /// Apply one report to the given services
    pub fn update(
        &self,
        host: &mut dyn AccessoryHost,
        services: &[SensorService],
        report: &TelemetryReport,
    ) -> DispatchOutcome {
        dispatch::apply_all(host, services, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BaseStationInfo;
    use crate::memory_host::{MemoryAccessory, WriteOp};

    fn station() -> (WeatherStation, MemoryAccessory) {
        let descriptor = AccessoryDescriptor::new(
            "AA:BB:CC:DD:EE:FF",
            "GW1000",
            "Weather Station",
            BaseStationInfo {
                frequency: "915".to_string(),
                serial_number: "SN-001".to_string(),
                hardware_revision: "1".to_string(),
                software_revision: "1.6.8".to_string(),
                firmware_revision: "GW1000B_V1.6.8".to_string(),
            },
        );
        let host = MemoryAccessory::new(descriptor.external_id(), &descriptor.display_name);
        (WeatherStation::new(descriptor), host)
    }

    fn info_text(host: &MemoryAccessory, key: Characteristic) -> Option<String> {
        let info = host.information_service().ok()?;
        host.characteristic(info, key)?.as_text().map(str::to_string)
    }

    #[test]
    fn test_install_writes_information() {
        let (station, mut host) = station();
        station.install(&mut host).unwrap();

        assert_eq!(
            info_text(&host, Characteristic::Manufacturer).as_deref(),
            Some("Ecowitt")
        );
        assert_eq!(
            info_text(&host, Characteristic::ProductData).as_deref(),
            Some("915Hz")
        );
        assert_eq!(
            info_text(&host, Characteristic::SerialNumber).as_deref(),
            Some("SN-001")
        );
        assert_eq!(
            info_text(&host, Characteristic::FirmwareRevision).as_deref(),
            Some("GW1000B_V1.6.8")
        );
        assert_eq!(station.model(&host), Some("GW1000"));
        assert_eq!(
            info_text(&host, Characteristic::Name).as_deref(),
            Some("Weather Station")
        );

        let info = host.information_service().unwrap();
        assert!(host.services()[info.0]
            .optional
            .contains(&Characteristic::ConfiguredName));
    }

    #[test]
    fn test_set_model_and_serial() {
        let (station, mut host) = station();
        station.install(&mut host).unwrap();

        station.set_model(&mut host, "WS2900", "Console").unwrap();
        station.set_serial_number(&mut host, "SN-002").unwrap();

        assert_eq!(station.model(&host), Some("WS2900"));
        assert_eq!(
            info_text(&host, Characteristic::SerialNumber).as_deref(),
            Some("SN-002")
        );
    }

    #[test]
    fn test_set_configured_name() {
        let (station, mut host) = station();
        let service = station
            .add_temperature_sensor(&mut host, "Outdoor Temperature")
            .unwrap();

        station
            .set_configured_name(&mut host, &service, "Garden")
            .unwrap();

        let ops: Vec<WriteOp> = host.journal().iter().map(|r| r.op).collect();
        assert_eq!(ops, vec![WriteOp::AddOptional, WriteOp::Add]);
        assert_eq!(
            host.characteristic(service.handle, Characteristic::ConfiguredName),
            Some(&CharacteristicValue::Text("Garden".into()))
        );
    }

    #[test]
    fn test_status_active_setters() {
        let (station, mut host) = station();
        let service = station.add_motion_sensor(&mut host, "Motion").unwrap();

        station.set_status_active(&mut host, &service, true).unwrap();
        station
            .update_status_active(&mut host, &service, false)
            .unwrap();

        assert_eq!(
            host.characteristic(service.handle, Characteristic::StatusActive),
            Some(&CharacteristicValue::Bool(false))
        );
        assert_eq!(host.journal()[0].op, WriteOp::Set);
        assert_eq!(host.journal()[1].op, WriteOp::Update);
    }

    #[test]
    fn test_name_setters() {
        let (station, mut host) = station();
        let service = station.add_humidity_sensor(&mut host, "Humidity").unwrap();

        station.set_name(&mut host, &service, "Indoor").unwrap();
        station.update_name(&mut host, &service, "Indoor RH").unwrap();

        assert_eq!(
            host.characteristic(service.handle, Characteristic::Name),
            Some(&CharacteristicValue::Text("Indoor RH".into()))
        );
        // Lookup keys stay on the registered name
        assert_eq!(host.get_service("Humidity"), Some(service.handle));
    }

    #[test]
    fn test_update_applies_report() {
        let (station, mut host) = station();
        let services = vec![
            station
                .add_temperature_sensor(&mut host, "Outdoor Temperature")
                .unwrap(),
            station.add_battery(&mut host, "Outdoor Sensor", false).unwrap(),
            station
                .add_occupancy_sensor(&mut host, "Occupancy")
                .unwrap(),
        ];
        let report = TelemetryReport::new()
            .with("tempf", 212.0)
            .with("wh65batt", 1.0);

        let outcome = station.update(&mut host, &services, &report);

        assert!(outcome.is_clean());
        assert_eq!(outcome.skipped, vec!["occupancy".to_string()]);
        assert_eq!(
            host.characteristic(services[0].handle, Characteristic::CurrentTemperature),
            Some(&CharacteristicValue::Float(100.0))
        );
    }
}
