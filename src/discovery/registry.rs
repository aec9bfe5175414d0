//! In-memory registration map
//!
//! Tracks what has already been forwarded to the host so repeated discovery
//! passes do not flood it. The map lives for the process lifetime only.
//!
//! The controller numbers sensors and devices separately, so a sensor and a
//! device can share a serial. Records are keyed by kind and serial.

use crate::mapping::Serial;
use crate::model::{CanonicalDevice, DeviceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// When a record that was seen before is forwarded again
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Each serial is registered at most once per process lifetime
    #[default]
    Once,
    /// Re-register when the record differs from the last one sent.
    /// Requires a host registry that accepts re-registration.
    Changed,
    /// Re-register on every pass.
    /// Requires a host registry that accepts re-registration.
    Always,
}

/// Outcome of offering a record to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Serial not seen before
    New,
    /// Seen before, record differs
    Changed,
    /// Seen before, forwarded again because the policy says so
    Repeated,
    /// Seen before, not forwarded
    Suppressed,
}

impl Admission {
    pub fn should_register(self) -> bool {
        !matches!(self, Admission::Suppressed)
    }
}

/// Mapping from kind and serial to the last record registered with the host
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    policy: RegistrationPolicy,
    devices: HashMap<(DeviceKind, Serial), CanonicalDevice>,
}

impl DeviceRegistry {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            policy,
            devices: HashMap::new(),
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Decide whether `device` goes to the host and remember it if so
    pub fn admit(&mut self, device: &CanonicalDevice) -> Admission {
        let key = (device.kind(), device.serial);
        let admission = match (self.devices.get(&key), self.policy) {
            (None, _) => {
                if self.devices.contains_key(&(other_kind(key.0), key.1)) {
                    warn!(
                        "{:?} {:?} shares serial {} with a {:?}",
                        key.0,
                        device.name,
                        device.serial,
                        other_kind(key.0)
                    );
                }
                Admission::New
            }
            (Some(_), RegistrationPolicy::Once) => Admission::Suppressed,
            (Some(previous), RegistrationPolicy::Changed) if previous == device => {
                Admission::Suppressed
            }
            (Some(_), RegistrationPolicy::Changed) => Admission::Changed,
            (Some(_), RegistrationPolicy::Always) => Admission::Repeated,
        };

        if admission.should_register() {
            self.devices.insert(key, device.clone());
        }
        admission
    }

    pub fn get(&self, kind: DeviceKind, serial: Serial) -> Option<&CanonicalDevice> {
        self.devices.get(&(kind, serial))
    }

    pub fn contains(&self, kind: DeviceKind, serial: Serial) -> bool {
        self.devices.contains_key(&(kind, serial))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalDevice> {
        self.devices.values()
    }
}

fn other_kind(kind: DeviceKind) -> DeviceKind {
    match kind {
        DeviceKind::Device => DeviceKind::Sensor,
        DeviceKind::Sensor => DeviceKind::Device,
    }
}
