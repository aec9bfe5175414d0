//! Common test utilities
//!
//! WireMock-based fake of the TellStick Local API plus shared fixtures.

#![allow(dead_code)]

pub mod test_fixtures;
pub mod tellstick_mock;

pub use tellstick_mock::{MockTellstickServer, TEST_TOKEN};
