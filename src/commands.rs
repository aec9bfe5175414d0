//! Inbound commands from the host
//!
//! Commands are best-effort. A failed vendor call is logged and returned as
//! [`CommandOutcome::Rejected`]; whether to surface it is the host's call.

use crate::client::TelldusClient;
use crate::codec::encode_dim_level;
use crate::error::{BridgeError, SanitizedError};
use crate::mapping::{LocalId, Serial, SerialMapper};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a command
#[must_use]
#[derive(Debug)]
pub enum CommandOutcome {
    /// The controller accepted the call
    Issued { local_id: LocalId },
    /// The call failed; nothing was applied
    Rejected {
        local_id: LocalId,
        error: BridgeError,
    },
}

impl CommandOutcome {
    pub fn is_issued(&self) -> bool {
        matches!(self, CommandOutcome::Issued { .. })
    }

    pub fn local_id(&self) -> LocalId {
        match self {
            CommandOutcome::Issued { local_id } | CommandOutcome::Rejected { local_id, .. } => {
                *local_id
            }
        }
    }

    /// Sanitized rejection reason, if any
    pub fn rejection(&self) -> Option<SanitizedError> {
        match self {
            CommandOutcome::Issued { .. } => None,
            CommandOutcome::Rejected { error, .. } => Some(error.sanitized()),
        }
    }

    /// Convert into a `Result` for callers that want `?`
    pub fn into_result(self) -> crate::error::Result<LocalId> {
        match self {
            CommandOutcome::Issued { local_id } => Ok(local_id),
            CommandOutcome::Rejected { error, .. } => Err(error),
        }
    }
}

/// Translates set-value commands into controller calls
#[derive(Clone)]
pub struct CommandDispatcher {
    client: Arc<dyn TelldusClient>,
    mapper: SerialMapper,
}

impl CommandDispatcher {
    pub fn new(client: Arc<dyn TelldusClient>, mapper: SerialMapper) -> Self {
        Self { client, mapper }
    }

    /// `value == 1` turns the device on, anything else turns it off
    pub async fn set_on_off(&self, serial: Serial, value: i64) -> CommandOutcome {
        let local_id = self.mapper.to_local_id(serial);
        let on = value == 1;
        debug!("Turning device {local_id} {}", if on { "on" } else { "off" });

        let result = self.client.set_device(local_id, on).await;
        Self::outcome("on/off", local_id, result)
    }

    /// Set dim level from a percentage, clamped to 0..=100
    pub async fn set_dim(&self, serial: Serial, value: f64) -> CommandOutcome {
        let local_id = self.mapper.to_local_id(serial);
        let level = encode_dim_level(value);
        debug!("Setting dimmer {local_id} to {level}");

        let result = self.client.set_dim_level(local_id, level).await;
        Self::outcome("dim", local_id, result)
    }

    fn outcome(
        command: &str,
        local_id: LocalId,
        result: crate::error::Result<()>,
    ) -> CommandOutcome {
        match result {
            Ok(()) => CommandOutcome::Issued { local_id },
            Err(error) => {
                warn!("{command} command for device {local_id} failed: {error}");
                CommandOutcome::Rejected { local_id, error }
            }
        }
    }
}
