//! Error types for the TellStick bridge
//!
//! Configuration errors are fatal to initialization. Everything raised by the
//! controller client is a transport-level error that the discovery poller and
//! command dispatcher recover from locally.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Error types for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication errors (rejected access token)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The controller answered with an error body
    #[error("Controller error: {0}")]
    Api(String),

    /// Parsing errors for payloads that are valid JSON but not the expected shape
    #[error("Parsing error: {0}")]
    Parsing(String),
}

impl BridgeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a controller error
    pub fn api<S: Into<String>>(msg: S) -> Self {
        Self::Api(msg.into())
    }

    /// Create a parsing error
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        Self::Parsing(msg.into())
    }

    /// Check if error is worth another attempt against the controller
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Connection(_) | BridgeError::Timeout(_) => true,
            BridgeError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if error indicates a rejected access token
    pub fn is_auth_error(&self) -> bool {
        matches!(self, BridgeError::Authentication(_))
    }

    /// Check if error is a configuration problem
    pub fn is_config_error(&self) -> bool {
        matches!(self, BridgeError::Config(_))
    }

    /// Short machine-readable kind, used in logs and rejected command outcomes
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Config(_) => "config",
            BridgeError::Connection(_) => "connection",
            BridgeError::Authentication(_) => "authentication",
            BridgeError::Http(_) => "http",
            BridgeError::Timeout(_) => "timeout",
            BridgeError::Api(_) => "api",
            BridgeError::Parsing(_) => "parsing",
        }
    }

    /// Error summary that never includes the access token or request URL
    pub fn sanitized(&self) -> SanitizedError {
        let message = match self {
            BridgeError::Http(e) if e.is_timeout() => "request timed out".to_string(),
            BridgeError::Http(e) if e.is_connect() => "controller unreachable".to_string(),
            BridgeError::Http(_) => "HTTP request failed".to_string(),
            BridgeError::Authentication(_) => "access token rejected".to_string(),
            other => other.to_string(),
        };

        SanitizedError {
            kind: self.kind(),
            message,
            is_retryable: self.is_retryable(),
        }
    }
}

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        BridgeError::Config(err.to_string())
    }
}

/// Sanitized error for logs and host-facing outcomes
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SanitizedError {
    pub kind: &'static str,
    pub message: String,
    pub is_retryable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BridgeError::connection("refused").is_retryable());
        assert!(BridgeError::timeout("slow").is_retryable());
        assert!(!BridgeError::api("unknown id").is_retryable());
        assert!(!BridgeError::config("missing ip").is_retryable());
    }

    #[test]
    fn test_auth_and_config_classification() {
        assert!(BridgeError::authentication("401").is_auth_error());
        assert!(BridgeError::config("missing token").is_config_error());
        assert!(!BridgeError::parsing("bad").is_config_error());
    }

    #[test]
    fn test_sanitized_hides_auth_detail() {
        let err = BridgeError::authentication("token abc123 expired");
        let sanitized = err.sanitized();
        assert_eq!(sanitized.kind, "authentication");
        assert!(!sanitized.message.contains("abc123"));
    }

    #[test]
    fn test_kinds() {
        let kinds: Vec<_> = [
            BridgeError::config("c"),
            BridgeError::connection("c"),
            BridgeError::authentication("a"),
            BridgeError::timeout("t"),
            BridgeError::api("a"),
            BridgeError::parsing("p"),
            BridgeError::from(config::ConfigError::NotFound("ip".to_string())),
        ]
        .iter()
        .map(BridgeError::kind)
        .collect();
        assert_eq!(
            kinds,
            ["config", "connection", "authentication", "timeout", "api", "parsing", "config"]
        );
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            BridgeError::api("Device not found").to_string(),
            "Controller error: Device not found"
        );
        assert_eq!(
            BridgeError::config("ip missing").to_string(),
            "Configuration error: ip missing"
        );
    }
}
