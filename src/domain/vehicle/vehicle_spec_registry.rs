use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;

use crate::api::vehicle_spec_dto::VehicleSpecDto;
use crate::domain::vehicle::vehicle_spec::VehicleSpec;
use crate::error::{Error, Result};

new_key_type! {
    pub struct VehicleSpecKey;
}

/// Known vehicle classes, enumerated in registration order.
#[derive(Debug, Default)]
pub struct VehicleSpecRegistry {
    /// Spec storage.
    slots: SlotMap<VehicleSpecKey, VehicleSpec>,

    /// Lookup of the internal key by spec name.
    name_index: HashMap<String, VehicleSpecKey>,

    /// Keys in registration order.
    order: Vec<VehicleSpecKey>,
}

impl VehicleSpecRegistry {
    pub fn new() -> Self {
        VehicleSpecRegistry { slots: SlotMap::with_key(), name_index: HashMap::new(), order: Vec::new() }
    }

    pub fn from_dtos(dtos: &[VehicleSpecDto]) -> Result<Self> {
        let mut registry = VehicleSpecRegistry::new();
        for dto in dtos {
            registry.register(VehicleSpec::from_dto(dto)?)?;
        }

        return Ok(registry);
    }

    /// Adds a vehicle class.
    ///
    /// # Returns
    /// The internal key, or `Error::ModelConstructionError` if a class with the same
    /// name is already registered.
    pub fn register(&mut self, spec: VehicleSpec) -> Result<VehicleSpecKey> {
        if self.name_index.contains_key(&spec.name) {
            return Err(Error::ModelConstructionError(format!("Vehicle spec '{}' registered twice", spec.name)));
        }

        let name = spec.name.clone();
        let key = self.slots.insert(spec);
        self.name_index.insert(name, key);
        self.order.push(key);

        return Ok(key);
    }

    pub fn get(&self, key: VehicleSpecKey) -> Option<&VehicleSpec> {
        self.slots.get(key)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&VehicleSpec> {
        let key = self.name_index.get(name)?;
        self.slots.get(*key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VehicleSpec> {
        self.order.iter().filter_map(|key| self.slots.get(*key))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_registration_order() {
        let mut registry = VehicleSpecRegistry::new();
        registry.register(VehicleSpec::new("Van", 20.0, 2.0, 4.0, 5.0, 2.0)).unwrap();
        registry.register(VehicleSpec::new("Sedan", 25.0, 3.0, 5.0, 4.0, 1.8)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get_by_name("Sedan").unwrap().max_velocity, 25.0);
        assert!(registry.get_by_name("Bus").is_none());

        let names: Vec<&str> = registry.iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(names, vec!["Van", "Sedan"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = VehicleSpecRegistry::new();
        registry.register(VehicleSpec::new("Van", 20.0, 2.0, 4.0, 5.0, 2.0)).unwrap();

        assert!(registry.register(VehicleSpec::new("Van", 30.0, 2.0, 4.0, 5.0, 2.0)).is_err());
    }
}
