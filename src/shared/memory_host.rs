//! In-memory accessory host
//!
//! Keeps services, their identities and characteristic values in memory and
//! journals every write. The binary runs against it, and tests use the
//! journal to observe exactly what the synchronization layer wrote.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::HostError;
use crate::hap::{
    AccessoryHost, Characteristic, CharacteristicValue, ServiceHandle, ServiceType,
};
use crate::identity::ServiceIdentity;

/// Kind of write recorded in the journal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOp {
    Set,
    Update,
    AddOptional,
    Add,
}

/// One journaled write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteRecord {
    pub service: ServiceHandle,
    pub op: WriteOp,
    pub key: Characteristic,
    pub value: Option<CharacteristicValue>,
}

/// Service state held by the memory host
#[derive(Debug, Clone, Serialize)]
pub struct MemoryService {
    pub service_type: ServiceType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<ServiceIdentity>,
    pub characteristics: BTreeMap<Characteristic, CharacteristicValue>,
    pub optional: BTreeSet<Characteristic>,
}

impl MemoryService {
    fn new(service_type: ServiceType, name: &str, identity: Option<ServiceIdentity>) -> Self {
        Self {
            service_type,
            name: name.to_string(),
            identity,
            characteristics: BTreeMap::new(),
            optional: BTreeSet::new(),
        }
    }
}

/// Serializable view of the whole accessory
#[derive(Debug, Clone, Serialize)]
pub struct AccessorySnapshot<'a> {
    pub external_id: &'a str,
    pub services: &'a [MemoryService],
}

/// In-memory accessory
#[derive(Debug, Clone)]
pub struct MemoryAccessory {
    external_id: String,
    services: Vec<MemoryService>,
    by_identity: HashMap<ServiceIdentity, ServiceHandle>,
    journal: Vec<WriteRecord>,
    services_added: usize,
}

impl MemoryAccessory {
    /// Create an accessory holding only its information service
    pub fn new(external_id: impl Into<String>, display_name: &str) -> Self {
        Self {
            external_id: external_id.into(),
            services: vec![MemoryService::new(
                ServiceType::AccessoryInformation,
                display_name,
                None,
            )],
            by_identity: HashMap::new(),
            journal: Vec::new(),
            services_added: 0,
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn services(&self) -> &[MemoryService] {
        &self.services
    }

    pub fn service(&self, handle: ServiceHandle) -> Option<&MemoryService> {
        self.services.get(handle.0)
    }

    /// Number of `add_service` calls that created a service
    pub fn services_added(&self) -> usize {
        self.services_added
    }

    pub fn journal(&self) -> &[WriteRecord] {
        &self.journal
    }

    /// Journaled writes of `key` on `service`
    pub fn writes_to(&self, service: ServiceHandle, key: Characteristic) -> usize {
        self.journal
            .iter()
            .filter(|record| record.service == service && record.key == key)
            .count()
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn snapshot(&self) -> AccessorySnapshot<'_> {
        AccessorySnapshot {
            external_id: &self.external_id,
            services: &self.services,
        }
    }

    fn service_mut(&mut self, handle: ServiceHandle) -> Result<&mut MemoryService, HostError> {
        self.services
            .get_mut(handle.0)
            .ok_or(HostError::UnknownService(handle.0))
    }

    fn write(
        &mut self,
        service: ServiceHandle,
        op: WriteOp,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError> {
        self.service_mut(service)?
            .characteristics
            .insert(key, value.clone());
        self.journal.push(WriteRecord {
            service,
            op,
            key,
            value: Some(value),
        });
        Ok(())
    }
}

impl AccessoryHost for MemoryAccessory {
    fn get_service(&self, name: &str) -> Option<ServiceHandle> {
        self.services
            .iter()
            .position(|service| {
                service.service_type != ServiceType::AccessoryInformation && service.name == name
            })
            .map(ServiceHandle)
    }

    fn service_by_identity(&self, identity: &ServiceIdentity) -> Option<ServiceHandle> {
        self.by_identity.get(identity).copied()
    }

    fn service_name(&self, service: ServiceHandle) -> Option<&str> {
        self.services.get(service.0).map(|s| s.name.as_str())
    }

    fn service_type(&self, service: ServiceHandle) -> Option<ServiceType> {
        self.services.get(service.0).map(|s| s.service_type)
    }

    fn information_service(&self) -> Result<ServiceHandle, HostError> {
        self.services
            .iter()
            .position(|service| service.service_type == ServiceType::AccessoryInformation)
            .map(ServiceHandle)
            .ok_or(HostError::MissingInformationService)
    }

    fn add_service(
        &mut self,
        service_type: ServiceType,
        name: &str,
        identity: &ServiceIdentity,
    ) -> Result<ServiceHandle, HostError> {
        // Check-then-insert under &mut self, so a second insert cannot alias the first
        if self.by_identity.contains_key(identity) {
            return Err(HostError::DuplicateIdentity(identity.clone()));
        }

        let handle = ServiceHandle(self.services.len());
        self.services
            .push(MemoryService::new(service_type, name, Some(identity.clone())));
        self.by_identity.insert(identity.clone(), handle);
        self.services_added += 1;
        Ok(handle)
    }

    fn set_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError> {
        self.write(service, WriteOp::Set, key, value)
    }

    fn update_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError> {
        self.write(service, WriteOp::Update, key, value)
    }

    fn add_optional_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
    ) -> Result<(), HostError> {
        self.service_mut(service)?.optional.insert(key);
        self.journal.push(WriteRecord {
            service,
            op: WriteOp::AddOptional,
            key,
            value: None,
        });
        Ok(())
    }

    fn add_characteristic(
        &mut self,
        service: ServiceHandle,
        key: Characteristic,
        value: CharacteristicValue,
    ) -> Result<(), HostError> {
        self.write(service, WriteOp::Add, key, value)
    }

    fn characteristic(
        &self,
        service: ServiceHandle,
        key: Characteristic,
    ) -> Option<&CharacteristicValue> {
        self.services.get(service.0)?.characteristics.get(&key)
    }
}
