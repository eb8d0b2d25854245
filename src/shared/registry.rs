use tracing::{debug, error, info, warn};

use crate::classify;
use crate::domain::{FieldBinding, SensorKind, SensorService};
use crate::error::{BridgeError, HostError};
use crate::hap::{AccessoryHost, Characteristic, CharacteristicValue, ServiceType};
use crate::identity::IdentityResolver;
use crate::validators::validate_service_name;

/// Battery label suffix shown next to the service name
pub const BATTERY_LABEL_SUFFIX: &str = "🔋";

/// Idempotent create-or-get of sub-services by name
pub struct ServiceRegistry<'a> {
    site_key: &'a str,
    resolver: &'a dyn IdentityResolver,
}

impl<'a> ServiceRegistry<'a> {
    pub fn new(site_key: &'a str, resolver: &'a dyn IdentityResolver) -> Self {
        Self { site_key, resolver }
    }

    /// Return the service named `name`, creating it on first use
    ///
    /// Battery services created here start out not chargeable; use
    /// [`ServiceRegistry::get_or_create_battery`] to choose.
    pub fn get_or_create(
        &self,
        host: &mut dyn AccessoryHost,
        kind: SensorKind,
        name: &str,
    ) -> Result<SensorService, BridgeError> {
        self.resolve(host, kind, name, false)
    }

    /// Return the battery service named `name`, creating it on first use
    pub fn get_or_create_battery(
        &self,
        host: &mut dyn AccessoryHost,
        name: &str,
        chargeable: bool,
    ) -> Result<SensorService, BridgeError> {
        self.resolve(host, SensorKind::Battery, name, chargeable)
    }

    fn resolve(
        &self,
        host: &mut dyn AccessoryHost,
        kind: SensorKind,
        name: &str,
        chargeable: bool,
    ) -> Result<SensorService, BridgeError> {
        validate_service_name(name)?;

        let identity = self.resolver.identity(self.site_key, name);

        // Step 1: the identity map is authoritative
        if let Some(handle) = host.service_by_identity(&identity) {
            let existing = host.service_name(handle).unwrap_or_default();
            if existing != name {
                error!(
                    site_key = %self.site_key,
                    identity = %identity,
                    existing = %existing,
                    requested = %name,
                    "Service identity collision"
                );
                return Err(BridgeError::IdentityCollision {
                    identity,
                    existing: existing.to_string(),
                    requested: name.to_string(),
                });
            }

            let existing_type = host.service_type(handle);
            if existing_type != Some(kind.service_type()) {
                error!(
                    service = %name,
                    existing = ?existing_type,
                    requested = %kind,
                    "Service kind mismatch"
                );
                return Err(BridgeError::KindMismatch {
                    name: name.to_string(),
                    existing: existing_type.unwrap_or(ServiceType::AccessoryInformation),
                    requested: kind.service_type(),
                });
            }

            debug!(service = %name, kind = %kind, "Found existing service");
            return Ok(SensorService {
                kind,
                name: name.to_string(),
                identity,
                handle,
                binding: FieldBinding::default_for(kind),
            });
        }

        // Step 2: a same-named service under another identity would be aliased
        if let Some(handle) = host.get_service(name) {
            warn!(
                service = %name,
                handle = handle.0,
                "Service exists under a different identity, not creating a duplicate"
            );
            return Err(BridgeError::IdentityCollision {
                identity,
                existing: name.to_string(),
                requested: name.to_string(),
            });
        }

        // Step 3: create and register baseline metadata
        let handle = match host.add_service(kind.service_type(), name, &identity) {
            Ok(handle) => handle,
            Err(HostError::DuplicateIdentity(identity)) => {
                error!(service = %name, identity = %identity, "Host refused duplicate identity");
                return Err(BridgeError::IdentityCollision {
                    identity,
                    existing: String::new(),
                    requested: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if kind == SensorKind::Battery {
            host.set_characteristic(
                handle,
                Characteristic::Name,
                CharacteristicValue::Text(format!("{} {}", name, BATTERY_LABEL_SUFFIX)),
            )?;
            host.set_characteristic(
                handle,
                Characteristic::ChargingState,
                classify::charging_state(chargeable).into(),
            )?;
            host.set_characteristic(
                handle,
                Characteristic::StatusLowBattery,
                classify::low_battery_status(false).into(),
            )?;
        }

        info!(
            site_key = %self.site_key,
            service = %name,
            kind = %kind,
            identity = %identity,
            "Created service"
        );

        Ok(SensorService {
            kind,
            name: name.to_string(),
            identity,
            handle,
            binding: FieldBinding::default_for(kind),
        })
    }
}
