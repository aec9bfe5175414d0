//! Canonical device model forwarded to the host registry
//!
//! Field names on the wire follow the host's registration contract: `Sn` for
//! the serial, `type` for the kind, `methods` for the capability flags.

use crate::codec::{Battery, Capabilities, Method};
use crate::mapping::Serial;
use serde::{Deserialize, Serialize};

/// Kind of a canonical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Device,
    Sensor,
}

/// One normalized metric channel of a sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorInput {
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Kind-specific part of a canonical record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceDetails {
    Device {
        #[serde(rename = "methods")]
        capabilities: Capabilities,
        /// `None` when the state value matches no single method
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<Method>,
        /// Dim level in percent
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<u8>,
    },
    Sensor {
        inputs: Vec<SensorInput>,
    },
}

/// Normalized sensor or device, keyed by serial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalDevice {
    #[serde(rename = "Sn")]
    pub serial: Serial,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<Battery>,
    #[serde(flatten)]
    pub details: DeviceDetails,
}

impl CanonicalDevice {
    pub fn kind(&self) -> DeviceKind {
        match self.details {
            DeviceDetails::Device { .. } => DeviceKind::Device,
            DeviceDetails::Sensor { .. } => DeviceKind::Sensor,
        }
    }

    pub fn capabilities(&self) -> Option<&Capabilities> {
        match &self.details {
            DeviceDetails::Device { capabilities, .. } => Some(capabilities),
            DeviceDetails::Sensor { .. } => None,
        }
    }

    pub fn state(&self) -> Option<Method> {
        match &self.details {
            DeviceDetails::Device { state, .. } => *state,
            DeviceDetails::Sensor { .. } => None,
        }
    }

    pub fn value(&self) -> Option<u8> {
        match &self.details {
            DeviceDetails::Device { value, .. } => *value,
            DeviceDetails::Sensor { .. } => None,
        }
    }

    /// Sensor inputs, empty for devices
    pub fn inputs(&self) -> &[SensorInput] {
        match &self.details {
            DeviceDetails::Sensor { inputs } => inputs,
            DeviceDetails::Device { .. } => &[],
        }
    }
}
