//! Discovery of sensors and devices on the controller
//!
//! This module provides the polling pass that enumerates the controller, the
//! pacing policy that keeps it from being overloaded, and the registration
//! map that deduplicates what is forwarded to the host.

pub mod pacing;
pub mod poller;
pub mod registry;

// Re-export main types for convenience
pub use pacing::{BackoffPolicy, PacingConfig, Pacer, TokioPacer};
pub use poller::{DiscoveryPoller, PassReport, Phase, PhaseReport};
pub use registry::{Admission, DeviceRegistry, RegistrationPolicy};
