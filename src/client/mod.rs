//! TellStick controller client abstraction and raw payload types
//!
//! The raw types mirror what the controller's Local API returns. They are
//! transient: the discovery poller fetches them fresh on every pass and hands
//! them to the normalizer.

pub mod http_client;

use crate::error::Result;
use crate::mapping::LocalId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http_client::TelldusHttpClient;

/// One entry of a sensor or device list call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListEntry {
    pub id: LocalId,
    /// Absent or empty name excludes the entry from registration
    #[serde(default)]
    pub name: Option<String>,
}

impl RawListEntry {
    pub fn new(id: LocalId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }

    /// Name if present and non-empty
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Per-device detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDeviceInfo {
    /// Bitmask of supported methods
    #[serde(default)]
    pub methods: u32,
    /// Current state, a single method bit
    #[serde(default)]
    pub state: u32,
    /// Dim level 0..=255, often sent as a string
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub statevalue: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub battery: Option<i64>,
}

/// Per-sensor detail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSensorInfo {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub battery: Option<i64>,
    /// Metric channels in controller order
    #[serde(default)]
    pub data: Vec<RawSensorReading>,
}

/// One metric channel reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSensorReading {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::f64_value")]
    pub value: f64,
    /// Disambiguates overloaded channels such as `watt`
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub scale: Option<i64>,
}

impl RawSensorReading {
    pub fn new(name: impl Into<String>, value: f64, scale: Option<i64>) -> Self {
        Self {
            name: Some(name.into()),
            value,
            scale,
        }
    }
}

/// Controller identification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Trait for TellStick controller client implementations
#[async_trait]
pub trait TelldusClient: Send + Sync {
    /// List all sensors known to the controller
    async fn list_sensors(&self) -> Result<Vec<RawListEntry>>;

    /// List all devices known to the controller
    async fn list_devices(&self) -> Result<Vec<RawListEntry>>;

    /// Fetch metric channels and battery for one sensor
    async fn sensor_info(&self, id: LocalId) -> Result<RawSensorInfo>;

    /// Fetch methods, state and dim level for one device
    async fn device_info(&self, id: LocalId) -> Result<RawDeviceInfo>;

    /// Turn a device on or off
    async fn set_device(&self, id: LocalId, on: bool) -> Result<()>;

    /// Set a device's dim level (0..=255)
    async fn set_dim_level(&self, id: LocalId, level: u8) -> Result<()>;

    /// Product and firmware version of the controller
    async fn system_info(&self) -> Result<SystemInfo>;
}

/// Deserializers for numeric fields the controller sometimes sends as strings
pub(crate) mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn f64_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("number {n} out of range"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid number {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("expected number, got {other}"))),
        }
    }

    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid integer {s:?}: {e}"))),
            other => Err(D::Error::custom(format!("expected integer, got {other}"))),
        }
    }
}
