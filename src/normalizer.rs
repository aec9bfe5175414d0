//! Builds canonical records from raw controller payloads

use crate::client::{RawDeviceInfo, RawListEntry, RawSensorInfo};
use crate::codec::{
    decode_battery, decode_capabilities, decode_device_value, decode_metric_channel,
    decode_state, UnitTable,
};
use crate::mapping::{Serial, SerialMapper, SERIAL_BLOCK};
use crate::model::{CanonicalDevice, DeviceDetails, SensorInput};
use tracing::{debug, warn};

/// Turns list entries plus detail payloads into [`CanonicalDevice`] records
#[derive(Debug, Clone)]
pub struct Normalizer {
    mapper: SerialMapper,
    units: UnitTable,
}

impl Normalizer {
    pub fn new(mapper: SerialMapper, units: UnitTable) -> Self {
        Self { mapper, units }
    }

    pub fn mapper(&self) -> &SerialMapper {
        &self.mapper
    }

    /// Serial for an entry, warning when the id cannot be routed back
    fn serial_for(&self, entry: &RawListEntry) -> Serial {
        if !SerialMapper::is_addressable(entry.id) {
            warn!(
                "Id {} of {:?} is not below {SERIAL_BLOCK}; commands for it will reach the wrong device",
                entry.id,
                entry.display_name().unwrap_or_default()
            );
        }
        self.mapper.to_serial(entry.id)
    }

    pub fn device(&self, entry: &RawListEntry, info: &RawDeviceInfo) -> CanonicalDevice {
        let value = info
            .statevalue
            .and_then(|raw| u8::try_from(raw).ok())
            .map(decode_device_value);

        CanonicalDevice {
            serial: self.serial_for(entry),
            name: entry.display_name().unwrap_or_default().to_string(),
            battery: decode_battery(info.battery),
            details: DeviceDetails::Device {
                capabilities: decode_capabilities(info.methods),
                state: decode_state(info.state),
                value,
            },
        }
    }

    pub fn sensor(&self, entry: &RawListEntry, info: &RawSensorInfo) -> CanonicalDevice {
        let inputs = info
            .data
            .iter()
            .filter_map(|reading| {
                let Some(raw_name) = reading.name.as_deref().filter(|n| !n.is_empty()) else {
                    debug!("Skipping unnamed channel on sensor {}", entry.id);
                    return None;
                };
                let (name, value) = decode_metric_channel(raw_name, reading.value, reading.scale);
                Some(SensorInput {
                    name: name.to_string(),
                    value,
                    unit: self.units.unit_for(name).map(str::to_string),
                })
            })
            .collect();

        CanonicalDevice {
            serial: self.serial_for(entry),
            name: entry.display_name().unwrap_or_default().to_string(),
            battery: decode_battery(info.battery),
            details: DeviceDetails::Sensor { inputs },
        }
    }
}
