//! Mapping between host serial numbers and controller-local ids
//!
//! The host sees every sensor and device under a serial number made of a
//! process-wide base plus the controller-local id. The base is always a whole
//! number of thousands above the host's own base, so the local id can be
//! recovered from the low three digits.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Width of the serial number block reserved for one controller
pub const SERIAL_BLOCK: u64 = 1000;

/// Controller-local id of a sensor or device
pub type LocalId = u64;

/// Globally unique serial number exposed to the host
pub type Serial = u64;

/// Converts between serial numbers and controller-local ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialMapper {
    base_sn: Serial,
}

impl SerialMapper {
    /// Build the mapper from the configured multiplier and the host's base
    pub fn new(multiplier: u64, host_base: Serial) -> Result<Self> {
        let base_sn = multiplier
            .checked_mul(SERIAL_BLOCK)
            .and_then(|offset| offset.checked_add(host_base))
            .ok_or_else(|| {
                BridgeError::config(format!(
                    "Serial base overflows: multiplier {multiplier} with host base {host_base}"
                ))
            })?;
        Ok(Self { base_sn })
    }

    /// Mapper with an already computed base
    pub fn with_base(base_sn: Serial) -> Self {
        Self { base_sn }
    }

    pub fn base_sn(&self) -> Serial {
        self.base_sn
    }

    pub fn to_serial(&self, local_id: LocalId) -> Serial {
        self.base_sn.saturating_add(local_id)
    }

    /// Whether a serial built from `local_id` maps back to the same id
    pub fn is_addressable(local_id: LocalId) -> bool {
        local_id < SERIAL_BLOCK
    }

    /// Recover the local id from a serial this mapper produced.
    ///
    /// Only round-trips when the base is a multiple of [`SERIAL_BLOCK`] and
    /// local ids stay below it; other serials give a meaningless id.
    pub fn to_local_id(&self, serial: Serial) -> LocalId {
        let local_base = (serial / SERIAL_BLOCK) * SERIAL_BLOCK;
        serial - local_base
    }
}
