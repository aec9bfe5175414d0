//! Test fixtures for consistent test setup

use rstest::*;
use std::time::Duration;
use tellstick_bridge::client::{RawDeviceInfo, RawListEntry, RawSensorInfo, RawSensorReading};
use tellstick_bridge::discovery::{BackoffPolicy, PacingConfig};
use tellstick_bridge::BridgeConfig;

/// Pacing with every pause set to zero, for tests that use the real timer
pub fn no_pacing() -> PacingConfig {
    let zero = BackoffPolicy {
        slow_latency: Duration::from_millis(1_000),
        overloaded_latency: Duration::from_millis(10_000),
        normal_pause: Duration::ZERO,
        slow_pause: Duration::ZERO,
        overloaded_pause: Duration::ZERO,
    };
    PacingConfig {
        item_delay: Duration::ZERO,
        sensors: zero.clone(),
        devices: zero,
    }
}

/// Minimal valid configuration
#[fixture]
pub fn test_config() -> BridgeConfig {
    BridgeConfig {
        ip: "192.168.1.20".to_string(),
        access_token: "test-token".to_string(),
        ..Default::default()
    }
}

pub fn outdoor_sensor() -> (RawListEntry, RawSensorInfo) {
    (
        RawListEntry::new(1, "Outdoor"),
        RawSensorInfo {
            battery: None,
            data: vec![RawSensorReading::new("temp", 21.3, None)],
        },
    )
}

pub fn energy_meter() -> (RawListEntry, RawSensorInfo) {
    (
        RawListEntry::new(11, "Energy meter"),
        RawSensorInfo {
            battery: Some(253),
            data: vec![
                RawSensorReading::new("watt", 1523.4, Some(0)),
                RawSensorReading::new("watt", 412.0, Some(2)),
                RawSensorReading::new("watt", 231.0, Some(4)),
                RawSensorReading::new("watt", 1.8, Some(5)),
            ],
        },
    )
}

pub fn hall_dimmer() -> (RawListEntry, RawDeviceInfo) {
    (
        RawListEntry::new(7, "Hall dimmer"),
        RawDeviceInfo {
            methods: 19,
            state: 16,
            statevalue: Some(255),
            battery: None,
        },
    )
}

pub fn garden_switch() -> (RawListEntry, RawDeviceInfo) {
    (
        RawListEntry::new(8, "Garden switch"),
        RawDeviceInfo {
            methods: 3,
            state: 2,
            statevalue: Some(0),
            battery: None,
        },
    )
}
