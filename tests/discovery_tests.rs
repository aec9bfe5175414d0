//! Discovery poller tests against the in-memory controller

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tellstick_bridge::client::RawListEntry;
use tellstick_bridge::codec::{Battery, UnitTable};
use tellstick_bridge::discovery::{DiscoveryPoller, RegistrationPolicy};
use tellstick_bridge::host::{ChannelHost, HostEvent};
use tellstick_bridge::mapping::SerialMapper;
use tellstick_bridge::mock::{MockTelldusClient, RecordingPacer};
use tellstick_bridge::model::{CanonicalDevice, DeviceKind, SensorInput};
use tellstick_bridge::normalizer::Normalizer;
use tokio::sync::mpsc::UnboundedReceiver;

mod common;
use common::test_fixtures::{energy_meter, garden_switch, hall_dimmer, outdoor_sensor};

fn build(
    client: MockTelldusClient,
    policy: RegistrationPolicy,
) -> (DiscoveryPoller, UnboundedReceiver<HostEvent>, Arc<RecordingPacer>) {
    let (host, events) = ChannelHost::new(5000);
    let pacer = Arc::new(RecordingPacer::default());
    let normalizer = Normalizer::new(SerialMapper::with_base(5000), UnitTable::default());
    let poller = DiscoveryPoller::new(Arc::new(client), Arc::new(host), normalizer)
        .with_policy(policy)
        .with_pacer(pacer.clone());
    (poller, events, pacer)
}

fn drain(events: &mut UnboundedReceiver<HostEvent>) -> Vec<CanonicalDevice> {
    let mut devices = Vec::new();
    while let Ok(HostEvent::RegisterDevice(device)) = events.try_recv() {
        devices.push(device);
    }
    devices
}

#[tokio::test(start_paused = true)]
async fn test_outdoor_sensor_scenario() {
    let (entry, info) = outdoor_sensor();
    let client = MockTelldusClient::new().with_sensor(entry, info);
    let (mut poller, mut events, _) = build(client, RegistrationPolicy::Once);

    poller.run_pass().await;

    let devices = drain(&mut events);
    assert_eq!(devices.len(), 1);
    let sensor = &devices[0];
    assert_eq!(sensor.kind(), DeviceKind::Sensor);
    assert_eq!(sensor.serial, 5001);
    assert_eq!(sensor.name, "Outdoor");
    assert_eq!(
        sensor.inputs(),
        &[SensorInput {
            name: "temp".to_string(),
            value: 21.3,
            unit: Some("°C".to_string()),
        }]
    );
    assert_eq!(
        serde_json::to_value(sensor).unwrap(),
        json!({
            "Sn": 5001,
            "name": "Outdoor",
            "type": "sensor",
            "inputs": [{"name": "temp", "value": 21.3, "unit": "°C"}]
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_mixed_inventory() {
    let (s1, i1) = outdoor_sensor();
    let (s2, i2) = energy_meter();
    let (d1, j1) = hall_dimmer();
    let (d2, j2) = garden_switch();
    let client = MockTelldusClient::new()
        .with_sensor(s1, i1)
        .with_sensor(s2, i2)
        .with_device(d1, j1)
        .with_device(d2, j2);
    let (mut poller, mut events, _) = build(client, RegistrationPolicy::Once);

    let report = poller.run_pass().await;
    assert_eq!(report.sensors.registered, 2);
    assert_eq!(report.devices.registered, 2);

    let devices = drain(&mut events);
    let serials: Vec<_> = devices.iter().map(|d| d.serial).collect();
    assert_eq!(serials, vec![5001, 5011, 5007, 5008]);

    let meter = &devices[1];
    assert_eq!(meter.battery, Some(Battery::Ok));
    let channels: Vec<_> = meter
        .inputs()
        .iter()
        .map(|i| (i.name.as_str(), i.unit.as_deref()))
        .collect();
    assert_eq!(
        channels,
        vec![
            ("energy", Some("kWh")),
            ("power", Some("W")),
            ("voltage", Some("V")),
            ("current", Some("A")),
        ]
    );

    let dimmer = &devices[2];
    assert_eq!(dimmer.value(), Some(100));
    assert_eq!(dimmer.state().map(|m| m.as_str()), Some("dim"));

    let switch = &devices[3];
    let caps = switch.capabilities().unwrap();
    assert!(caps.on && caps.off && !caps.dim);
    assert_eq!(switch.value(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_ignore_list_uses_local_ids() {
    let (d1, j1) = hall_dimmer();
    let (d2, j2) = garden_switch();
    let client = MockTelldusClient::new().with_device(d1, j1).with_device(d2, j2);
    let (poller, mut events, _) = build(client.clone(), RegistrationPolicy::Once);
    // 5008 is a serial, not a local id, so it must not match anything
    let mut poller = poller.with_ignore_list([8, 5007]);

    let report = poller.run_pass().await;
    assert_eq!(report.devices.seen, 2);
    assert_eq!(report.devices.ignored, 1);

    let serials: Vec<_> = drain(&mut events).iter().map(|d| d.serial).collect();
    assert_eq!(serials, vec![5007]);
    assert_eq!(client.device_info_calls().await, vec![7]);
}

#[tokio::test(start_paused = true)]
async fn test_changed_policy_forwards_only_changes() {
    let (entry, info) = hall_dimmer();
    let client = MockTelldusClient::new().with_device(entry, info);
    let (mut poller, mut events, _) = build(client, RegistrationPolicy::Changed);

    poller.run_pass().await;
    let second = poller.run_pass().await;

    assert_eq!(second.devices.suppressed, 1);
    assert_eq!(drain(&mut events).len(), 1);
    assert_eq!(poller.registry().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_controller_backoff() {
    let (entry, info) = outdoor_sensor();
    let client = MockTelldusClient::new()
        .with_sensor(entry, info)
        .with_list_latency(Duration::from_secs(12));
    let (mut poller, _events, pacer) = build(client, RegistrationPolicy::Once);

    let report = poller.run_pass().await;
    assert_eq!(report.sensors.backoff, Duration::from_secs(60));
    assert_eq!(
        pacer.pauses().await,
        vec![
            Duration::from_secs(60),
            Duration::from_millis(500),
            Duration::from_secs(60),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_both_lists_failing_registers_nothing() {
    let (entry, info) = outdoor_sensor();
    let client = MockTelldusClient::new()
        .with_sensor(entry, info)
        .failing_sensor_list()
        .failing_device_list();
    let (mut poller, mut events, _) = build(client, RegistrationPolicy::Once);

    let report = poller.run_pass().await;
    assert!(report.sensors.list_failed && report.devices.list_failed);
    assert_eq!(report.registered(), 0);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unnamed_entries_are_counted_but_skipped() {
    let (_, info) = outdoor_sensor();
    let client = MockTelldusClient::new()
        .with_sensor(RawListEntry { id: 5, name: None }, info.clone())
        .with_sensor(RawListEntry::new(6, ""), info);
    let (mut poller, mut events, _) = build(client, RegistrationPolicy::Always);

    let report = poller.run_pass().await;
    assert_eq!(report.sensors.seen, 2);
    assert_eq!(report.sensors.ignored, 2);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sensor_and_device_with_same_local_id() {
    let (sensor, sensor_info) = outdoor_sensor();
    let (_, lamp_info) = garden_switch();
    let client = MockTelldusClient::new()
        .with_sensor(sensor, sensor_info)
        .with_device(RawListEntry::new(1, "Hall lamp"), lamp_info);
    let (mut poller, mut events, _) = build(client, RegistrationPolicy::Once);

    let report = poller.run_pass().await;
    assert_eq!(report.devices.suppressed, 0);

    let registered: Vec<_> = drain(&mut events)
        .iter()
        .map(|d| (d.serial, d.name.clone(), d.kind()))
        .collect();
    assert_eq!(
        registered,
        vec![
            (5001, "Outdoor".to_string(), DeviceKind::Sensor),
            (5001, "Hall lamp".to_string(), DeviceKind::Device),
        ]
    );

    let second = poller.run_pass().await;
    assert_eq!(second.registered(), 0);
    assert_eq!(poller.registry().len(), 2);
}
