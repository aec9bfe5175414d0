//! Discovery poller
//!
//! One pass enumerates sensors, then devices. Every call to the controller is
//! awaited before the next one starts, and the poller backs off after each
//! list call according to how long the controller took to answer.

use crate::client::{RawListEntry, TelldusClient};
use crate::discovery::pacing::{BackoffPolicy, PacingConfig, Pacer, TokioPacer};
use crate::discovery::registry::{DeviceRegistry, RegistrationPolicy};
use crate::error::Result;
use crate::host::HostServices;
use crate::mapping::LocalId;
use crate::model::CanonicalDevice;
use crate::normalizer::Normalizer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// The two halves of a discovery pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Sensors,
    Devices,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Sensors => f.write_str("sensor"),
            Phase::Devices => f.write_str("device"),
        }
    }
}

/// Counters for one phase of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Entries returned by the list call, ignored ones included
    pub seen: usize,
    pub ignored: usize,
    pub registered: usize,
    /// Normalized but not forwarded because of the registration policy
    pub suppressed: usize,
    /// Detail fetch failed
    pub failed: usize,
    pub list_failed: bool,
    #[serde(with = "humantime_serde")]
    pub list_latency: Duration,
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,
}

/// Summary of one discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub sensors: PhaseReport,
    pub devices: PhaseReport,
}

impl PassReport {
    pub fn registered(&self) -> usize {
        self.sensors.registered + self.devices.registered
    }

    pub fn failed(&self) -> usize {
        self.sensors.failed + self.devices.failed
    }
}

/// Enumerates the controller and forwards normalized records to the host
pub struct DiscoveryPoller {
    client: Arc<dyn TelldusClient>,
    host: Arc<dyn HostServices>,
    pacer: Arc<dyn Pacer>,
    normalizer: Normalizer,
    ignore_list: HashSet<LocalId>,
    pacing: PacingConfig,
    registry: DeviceRegistry,
}

impl DiscoveryPoller {
    pub fn new(
        client: Arc<dyn TelldusClient>,
        host: Arc<dyn HostServices>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            client,
            host,
            pacer: Arc::new(TokioPacer),
            normalizer,
            ignore_list: HashSet::new(),
            pacing: PacingConfig::default(),
            registry: DeviceRegistry::default(),
        }
    }

    /// Controller-local ids to leave out of registration
    pub fn with_ignore_list(mut self, ids: impl IntoIterator<Item = LocalId>) -> Self {
        self.ignore_list = ids.into_iter().collect();
        self
    }

    pub fn with_policy(mut self, policy: RegistrationPolicy) -> Self {
        self.registry = DeviceRegistry::new(policy);
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Whether an entry is excluded: unnamed, or on the ignore list
    pub fn is_ignored(&self, entry: &RawListEntry) -> bool {
        entry.display_name().is_none() || self.ignore_list.contains(&entry.id)
    }

    /// Run one full pass: sensors first, then devices.
    ///
    /// Never fails; transport errors only shrink what gets registered. Taking
    /// `&mut self` keeps two passes from running on the same poller at once.
    #[tracing::instrument(name = "discovery_pass", skip(self))]
    pub async fn run_pass(&mut self) -> PassReport {
        let started_at = Utc::now();
        let sensors = self.run_phase(Phase::Sensors).await;
        let devices = self.run_phase(Phase::Devices).await;

        let report = PassReport {
            started_at,
            sensors,
            devices,
        };
        info!(
            "Discovery pass finished: {} registered, {} failed, {} known",
            report.registered(),
            report.failed(),
            self.registry.len()
        );
        report
    }

    async fn run_phase(&mut self, phase: Phase) -> PhaseReport {
        let mut report = PhaseReport::default();

        let started = Instant::now();
        let listed = self.list(phase).await;
        report.list_latency = started.elapsed();

        let entries = match listed {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to list {phase}s, continuing with none: {e}");
                report.list_failed = true;
                Vec::new()
            }
        };
        debug!(
            "{} {phase}s listed in {:?}",
            entries.len(),
            report.list_latency
        );

        report.backoff = self.backoff_policy(phase).pause_for(report.list_latency);
        if report.backoff > self.backoff_policy(phase).normal_pause {
            warn!(
                "Controller slow ({:?} for {phase} list), pausing {:?}",
                report.list_latency, report.backoff
            );
        }
        self.pacer.pause(report.backoff).await;

        report.seen = entries.len();
        for entry in &entries {
            if self.is_ignored(entry) {
                debug!("Ignoring {phase} id = {}", entry.id);
                report.ignored += 1;
                continue;
            }

            let fetched = self.fetch(phase, entry).await;
            self.pacer.pause(self.pacing.item_delay).await;

            let record = match fetched {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping {phase} {}: {e}", entry.id);
                    report.failed += 1;
                    continue;
                }
            };

            let admission = self.registry.admit(&record);
            if admission.should_register() {
                debug!("Registering {phase} {} ({admission:?})", record.serial);
                self.host.register_device(record);
                report.registered += 1;
            } else {
                report.suppressed += 1;
            }
        }

        report
    }

    fn backoff_policy(&self, phase: Phase) -> &BackoffPolicy {
        match phase {
            Phase::Sensors => &self.pacing.sensors,
            Phase::Devices => &self.pacing.devices,
        }
    }

    async fn list(&self, phase: Phase) -> Result<Vec<RawListEntry>> {
        match phase {
            Phase::Sensors => self.client.list_sensors().await,
            Phase::Devices => self.client.list_devices().await,
        }
    }

    async fn fetch(&self, phase: Phase, entry: &RawListEntry) -> Result<CanonicalDevice> {
        match phase {
            Phase::Sensors => {
                let info = self.client.sensor_info(entry.id).await?;
                Ok(self.normalizer.sensor(entry, &info))
            }
            Phase::Devices => {
                let info = self.client.device_info(entry.id).await?;
                Ok(self.normalizer.device(entry, &info))
            }
        }
    }
}
