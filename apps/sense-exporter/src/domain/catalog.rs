//! Device Catalog
//!
//! Per-scrape lookup of device metadata by identifier. Devices that show up
//! in the realtime feed but not in the catalog get empty label values.

use std::collections::HashMap;

use super::model::Device;

/// Devices of one monitor, keyed by identifier, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct DeviceCatalog {
    devices: Vec<Device>,
    index: HashMap<String, usize>,
}

impl DeviceCatalog {
    /// Build a catalog. A later duplicate identifier replaces the earlier
    /// metadata but keeps the position of the first occurrence.
    #[must_use]
    pub fn new(devices: Vec<Device>) -> Self {
        let mut catalog = Self {
            devices: Vec::with_capacity(devices.len()),
            index: HashMap::with_capacity(devices.len()),
        };
        for device in devices {
            if let Some(&pos) = catalog.index.get(&device.id) {
                catalog.devices[pos] = device;
            } else {
                catalog.index.insert(device.id.clone(), catalog.devices.len());
                catalog.devices.push(device);
            }
        }
        catalog
    }

    /// Look up a device.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Device> {
        self.index.get(id).map(|&pos| &self.devices[pos])
    }

    /// Devices in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Label values for a device metric: id, name, type, make, model.
    #[must_use]
    pub fn device_labels(&self, id: &str) -> Vec<String> {
        match self.get(id) {
            Some(d) => vec![
                id.to_string(),
                d.name.clone(),
                d.device_type.clone(),
                d.make.clone(),
                d.model.clone(),
            ],
            None => vec![
                id.to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ],
        }
    }
}
