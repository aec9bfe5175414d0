//! Host platform contract
//!
//! The host supplies the base serial number at startup and receives
//! registration events. Registration is fire-and-forget: a failed delivery is
//! logged and never retried from here.

use crate::mapping::Serial;
use crate::model::CanonicalDevice;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// Description of this bridge, sent once initialization has finished
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(rename = "baseSn")]
    pub base_sn: Serial,
}

/// Services the host platform provides to the bridge
pub trait HostServices: Send + Sync {
    /// Host's base serial number; the bridge offsets its own block from it
    fn base_sn(&self) -> Serial;

    /// Forward one discovered or changed record to the host registry
    fn register_device(&self, device: CanonicalDevice);

    /// Announce the bridge as a platform
    fn register_platform(&self, info: PlatformInfo);
}

/// Events emitted to the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum HostEvent {
    RegisterDevice(CanonicalDevice),
    RegisterPlatform(PlatformInfo),
}

/// Host implementation that publishes events on a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelHost {
    base_sn: Serial,
    sender: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelHost {
    pub fn new(base_sn: Serial) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { base_sn, sender }, receiver)
    }

    fn emit(&self, event: HostEvent) {
        if self.sender.send(event).is_err() {
            warn!("Host event receiver dropped, registration lost");
        }
    }
}

impl HostServices for ChannelHost {
    fn base_sn(&self) -> Serial {
        self.base_sn
    }

    fn register_device(&self, device: CanonicalDevice) {
        self.emit(HostEvent::RegisterDevice(device));
    }

    fn register_platform(&self, info: PlatformInfo) {
        self.emit(HostEvent::RegisterPlatform(info));
    }
}
