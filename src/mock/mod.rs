//! Mock implementations for testing
//!
//! This module provides an in-memory controller and a pacer that records
//! pauses instead of sleeping.

use crate::client::{RawDeviceInfo, RawListEntry, RawSensorInfo, SystemInfo, TelldusClient};
use crate::discovery::Pacer;
use crate::error::{BridgeError, Result};
use crate::mapping::LocalId;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Command received by the mock controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCommand {
    OnOff { id: LocalId, on: bool },
    Dim { id: LocalId, level: u8 },
}

#[derive(Debug, Clone, Default)]
struct Fixture {
    sensors: Vec<(RawListEntry, RawSensorInfo)>,
    devices: Vec<(RawListEntry, RawDeviceInfo)>,
    system: SystemInfo,
    list_latency: Duration,
    fail_sensor_list: bool,
    fail_device_list: bool,
    fail_system_info: bool,
    fail_commands: bool,
    failing_details: HashSet<LocalId>,
}

#[derive(Debug, Default)]
struct CallLog {
    sensor_info: Vec<LocalId>,
    device_info: Vec<LocalId>,
    commands: Vec<MockCommand>,
}

/// Mock TellStick controller for testing
///
/// Clones share the call log, so a test can keep one handle and give the
/// other to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockTelldusClient {
    fixture: Arc<Fixture>,
    calls: Arc<Mutex<CallLog>>,
}

impl MockTelldusClient {
    /// Create new mock client
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sensor(mut self, entry: RawListEntry, info: RawSensorInfo) -> Self {
        Arc::make_mut(&mut self.fixture).sensors.push((entry, info));
        self
    }

    pub fn with_device(mut self, entry: RawListEntry, info: RawDeviceInfo) -> Self {
        Arc::make_mut(&mut self.fixture).devices.push((entry, info));
        self
    }

    pub fn with_system_info(mut self, product: &str, version: &str) -> Self {
        Arc::make_mut(&mut self.fixture).system = SystemInfo {
            product: Some(product.to_string()),
            version: Some(version.to_string()),
        };
        self
    }

    /// Make both list calls take this long (uses the tokio clock)
    pub fn with_list_latency(mut self, latency: Duration) -> Self {
        Arc::make_mut(&mut self.fixture).list_latency = latency;
        self
    }

    pub fn failing_sensor_list(mut self) -> Self {
        Arc::make_mut(&mut self.fixture).fail_sensor_list = true;
        self
    }

    pub fn failing_device_list(mut self) -> Self {
        Arc::make_mut(&mut self.fixture).fail_device_list = true;
        self
    }

    pub fn failing_system_info(mut self) -> Self {
        Arc::make_mut(&mut self.fixture).fail_system_info = true;
        self
    }

    pub fn failing_commands(mut self) -> Self {
        Arc::make_mut(&mut self.fixture).fail_commands = true;
        self
    }

    /// Make the detail call for `id` fail
    pub fn failing_detail(mut self, id: LocalId) -> Self {
        Arc::make_mut(&mut self.fixture).failing_details.insert(id);
        self
    }

    /// Ids passed to `sensor_info`, in call order
    pub async fn sensor_info_calls(&self) -> Vec<LocalId> {
        self.calls.lock().await.sensor_info.clone()
    }

    /// Ids passed to `device_info`, in call order
    pub async fn device_info_calls(&self) -> Vec<LocalId> {
        self.calls.lock().await.device_info.clone()
    }

    pub async fn commands(&self) -> Vec<MockCommand> {
        self.calls.lock().await.commands.clone()
    }

    async fn simulate_latency(&self) {
        if !self.fixture.list_latency.is_zero() {
            tokio::time::sleep(self.fixture.list_latency).await;
        }
    }

    fn check_detail(&self, id: LocalId) -> Result<()> {
        if self.fixture.failing_details.contains(&id) {
            return Err(BridgeError::connection(format!("mock detail failure for {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl TelldusClient for MockTelldusClient {
    async fn list_sensors(&self) -> Result<Vec<RawListEntry>> {
        self.simulate_latency().await;
        if self.fixture.fail_sensor_list {
            return Err(BridgeError::connection("mock sensor list failure"));
        }
        Ok(self.fixture.sensors.iter().map(|(e, _)| e.clone()).collect())
    }

    async fn list_devices(&self) -> Result<Vec<RawListEntry>> {
        self.simulate_latency().await;
        if self.fixture.fail_device_list {
            return Err(BridgeError::connection("mock device list failure"));
        }
        Ok(self.fixture.devices.iter().map(|(e, _)| e.clone()).collect())
    }

    async fn sensor_info(&self, id: LocalId) -> Result<RawSensorInfo> {
        self.calls.lock().await.sensor_info.push(id);
        self.check_detail(id)?;
        self.fixture
            .sensors
            .iter()
            .find(|(e, _)| e.id == id)
            .map(|(_, info)| info.clone())
            .ok_or_else(|| BridgeError::api("Sensor not found"))
    }

    async fn device_info(&self, id: LocalId) -> Result<RawDeviceInfo> {
        self.calls.lock().await.device_info.push(id);
        self.check_detail(id)?;
        self.fixture
            .devices
            .iter()
            .find(|(e, _)| e.id == id)
            .map(|(_, info)| info.clone())
            .ok_or_else(|| BridgeError::api("Device not found"))
    }

    async fn set_device(&self, id: LocalId, on: bool) -> Result<()> {
        if self.fixture.fail_commands {
            return Err(BridgeError::timeout("mock command failure"));
        }
        self.calls.lock().await.commands.push(MockCommand::OnOff { id, on });
        Ok(())
    }

    async fn set_dim_level(&self, id: LocalId, level: u8) -> Result<()> {
        if self.fixture.fail_commands {
            return Err(BridgeError::timeout("mock command failure"));
        }
        self.calls.lock().await.commands.push(MockCommand::Dim { id, level });
        Ok(())
    }

    async fn system_info(&self) -> Result<SystemInfo> {
        if self.fixture.fail_system_info {
            return Err(BridgeError::connection("mock system info failure"));
        }
        Ok(self.fixture.system.clone())
    }
}

/// Pacer that records requested pauses without sleeping
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub async fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().await.clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().await.push(duration);
    }
}
