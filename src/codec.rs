//! Decoding of the controller's bitmask and scale encoded fields
//!
//! The controller reports supported operations as a bitmask of [`Method`]
//! flags, the current state as exactly one of those flags, battery levels as a
//! byte with three reserved codes, and overloads the `watt` metric channel with
//! a scale code.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Operations a device can support, with the controller's bit values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    On,
    Off,
    Bell,
    Toggle,
    Dim,
    Learn,
    Execute,
    Up,
    Down,
    Stop,
}

impl Method {
    /// All methods in ascending bit order
    pub const ALL: [Method; 10] = [
        Method::On,
        Method::Off,
        Method::Bell,
        Method::Toggle,
        Method::Dim,
        Method::Learn,
        Method::Execute,
        Method::Up,
        Method::Down,
        Method::Stop,
    ];

    /// Bit value of this method in the controller's bitmask
    pub const fn bit(self) -> u32 {
        match self {
            Method::On => 0x0001,
            Method::Off => 0x0002,
            Method::Bell => 0x0004,
            Method::Toggle => 0x0008,
            Method::Dim => 0x0010,
            Method::Learn => 0x0020,
            Method::Execute => 0x0040,
            Method::Up => 0x0080,
            Method::Down => 0x0100,
            Method::Stop => 0x0200,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::On => "on",
            Method::Off => "off",
            Method::Bell => "bell",
            Method::Toggle => "toggle",
            Method::Dim => "dim",
            Method::Learn => "learn",
            Method::Execute => "execute",
            Method::Up => "up",
            Method::Down => "down",
            Method::Stop => "stop",
        }
    }

    /// Whether every bit of this method is set in `mask`
    pub fn is_set_in(self, mask: u32) -> bool {
        mask & self.bit() == self.bit()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitmask asking the controller to report every method it knows about
pub const ALL_METHODS_MASK: u32 = 0x03FF;

/// Named capability flags exposed to the host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub on: bool,
    pub off: bool,
    pub dim: bool,
    pub up: bool,
    pub down: bool,
    pub stop: bool,
    pub toggle: bool,
    pub bell: bool,
}

/// Decode a supported-methods bitmask into named capabilities
pub fn decode_capabilities(mask: u32) -> Capabilities {
    Capabilities {
        on: Method::On.is_set_in(mask),
        off: Method::Off.is_set_in(mask),
        dim: Method::Dim.is_set_in(mask),
        up: Method::Up.is_set_in(mask),
        down: Method::Down.is_set_in(mask),
        stop: Method::Stop.is_set_in(mask),
        toggle: Method::Toggle.is_set_in(mask),
        bell: Method::Bell.is_set_in(mask),
    }
}

/// Decode the current state value.
///
/// This is an exact match against a single flag value, not a bit test: zero
/// or a combination of flags has no label.
pub fn decode_state(state: u32) -> Option<Method> {
    Method::ALL.into_iter().find(|m| m.bit() == state)
}

/// Battery level as reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Battery {
    /// Level in percent, 0..=100
    Percent(u8),
    /// Battery is fine, level not reported
    Ok,
    /// Battery status cannot be determined
    Unknown,
    /// Battery is low
    Low,
}

impl Battery {
    pub const OK_CODE: i64 = 253;
    pub const UNKNOWN_CODE: i64 = 254;
    pub const LOW_CODE: i64 = 255;

    /// Host-facing numeric value: the percentage, or -1/-2/-3 for the sentinels
    pub fn as_value(self) -> i16 {
        match self {
            Battery::Percent(p) => i16::from(p),
            Battery::Ok => -1,
            Battery::Unknown => -2,
            Battery::Low => -3,
        }
    }
}

impl Serialize for Battery {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_value())
    }
}

/// Decode the raw battery byte.
///
/// An absent or zero field yields `None` so the record omits it. Values
/// between 101 and 252 carry no defined meaning and are omitted as well.
pub fn decode_battery(raw: Option<i64>) -> Option<Battery> {
    match raw? {
        0 => None,
        p @ 1..=100 => u8::try_from(p).ok().map(Battery::Percent),
        Battery::OK_CODE => Some(Battery::Ok),
        Battery::UNKNOWN_CODE => Some(Battery::Unknown),
        Battery::LOW_CODE => Some(Battery::Low),
        other => {
            debug!("Ignoring undefined battery code {other}");
            None
        }
    }
}

/// Resolve the display name of a metric channel.
///
/// Only the overloaded `watt` channel is renamed, and only when the scale code
/// is one of the known ones.
pub fn decode_metric_channel(name: &str, value: f64, scale: Option<i64>) -> (&str, f64) {
    let name = match (name, scale) {
        ("watt", Some(0)) => "energy",
        ("watt", Some(2)) => "power",
        ("watt", Some(4)) => "voltage",
        ("watt", Some(5)) => "current",
        _ => name,
    };
    (name, value)
}

/// Convert the controller's 0..=255 state value into a percentage
pub fn decode_device_value(statevalue: u8) -> u8 {
    (f64::from(statevalue) / 255.0 * 100.0).round() as u8
}

/// Convert a dim percentage into the controller's byte, clamping to 0..=100 first
pub fn encode_dim_level(percent: f64) -> u8 {
    if percent.is_nan() {
        return 0;
    }
    let percent = percent.clamp(0.0, 100.0);
    (percent / 100.0 * 255.0).round() as u8
}

const DEFAULT_UNITS: &[(&str, &str)] = &[
    ("temp", "°C"),
    ("humidity", "%"),
    ("wdir", "°"),
    ("dewp", "°C"),
    ("barpress", "kPa"),
    ("wgust", "m/s"),
    ("wavg", "m/s"),
    ("power", "W"),
    ("energy", "kWh"),
    ("current", "A"),
    ("voltage", "V"),
];

/// Channel name to display unit lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTable {
    units: HashMap<String, String>,
}

impl UnitTable {
    /// Default table with configured overrides layered on top
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut table = Self::default();
        for (name, unit) in overrides {
            table.units.insert(name.clone(), unit.clone());
        }
        table
    }

    pub fn unit_for(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self {
            units: DEFAULT_UNITS
                .iter()
                .map(|(name, unit)| ((*name).to_string(), (*unit).to_string()))
                .collect(),
        }
    }
}
