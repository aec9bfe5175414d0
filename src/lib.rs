//! TellStick bridge
//!
//! Polls a Telldus TellStick controller's Local API for sensors and
//! switch/dimmer devices, normalizes their bitmask and scale encoded fields
//! into a canonical record, and forwards new records to a host registry.
//! Inbound on/off and dim commands are translated back into controller calls.
//!
//! # Features
//!
//! - Adaptive discovery pacing that backs off from a slow controller
//! - Explicit registration policy (once, on change, every pass)
//! - Ignore list and unit overrides from configuration
//! - Best-effort commands with an explicit outcome

// Core modules
pub mod bridge;
pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod normalizer;

// Test support modules - available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

// Re-export main types for convenience
pub use bridge::TellstickBridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use model::CanonicalDevice;
