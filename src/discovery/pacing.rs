//! Latency-driven pacing between controller calls
//!
//! After each list call the poller measures how long the controller took and
//! backs off before touching it again. Detail calls are spaced by a fixed
//! interval regardless of latency.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maps observed list latency to the pause taken before processing items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Latency above which the controller counts as slow
    #[serde(with = "humantime_serde")]
    pub slow_latency: Duration,
    /// Latency above which the controller counts as overloaded
    #[serde(with = "humantime_serde")]
    pub overloaded_latency: Duration,
    #[serde(with = "humantime_serde")]
    pub normal_pause: Duration,
    #[serde(with = "humantime_serde")]
    pub slow_pause: Duration,
    #[serde(with = "humantime_serde")]
    pub overloaded_pause: Duration,
}

impl BackoffPolicy {
    /// Sensor phase: 60s when overloaded, 5s when slow
    pub fn sensors() -> Self {
        Self {
            slow_latency: Duration::from_millis(1_000),
            overloaded_latency: Duration::from_millis(10_000),
            normal_pause: Duration::from_millis(500),
            slow_pause: Duration::from_millis(5_000),
            overloaded_pause: Duration::from_millis(60_000),
        }
    }

    /// Device phase: 60s when overloaded, 30s when slow
    pub fn devices() -> Self {
        Self {
            slow_pause: Duration::from_millis(30_000),
            ..Self::sensors()
        }
    }

    /// Pause to take after a list call that took `latency`.
    ///
    /// Both thresholds are exclusive: exactly 1s still counts as normal.
    pub fn pause_for(&self, latency: Duration) -> Duration {
        if latency > self.overloaded_latency {
            self.overloaded_pause
        } else if latency > self.slow_latency {
            self.slow_pause
        } else {
            self.normal_pause
        }
    }
}

/// Pacing configuration for one discovery pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Fixed pause after every detail fetch
    #[serde(default = "default_item_delay", with = "humantime_serde")]
    pub item_delay: Duration,
    #[serde(default = "BackoffPolicy::sensors")]
    pub sensors: BackoffPolicy,
    #[serde(default = "BackoffPolicy::devices")]
    pub devices: BackoffPolicy,
}

fn default_item_delay() -> Duration {
    Duration::from_millis(500)
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            item_delay: default_item_delay(),
            sensors: BackoffPolicy::sensors(),
            devices: BackoffPolicy::devices(),
        }
    }
}

/// Cooperative delay used between controller calls
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Pacer backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
