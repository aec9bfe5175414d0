//! HTTP client for the TellStick Local API
//!
//! Every call is a GET against `http://{ip}/api/...` carrying the local API
//! access token as a bearer token. The controller reports failures either
//! through the HTTP status or through an `error` field in a 200 response.

use crate::client::{RawDeviceInfo, RawListEntry, RawSensorInfo, SystemInfo, TelldusClient};
use crate::codec::ALL_METHODS_MASK;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::mapping::LocalId;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct SensorList {
    #[serde(default)]
    sensor: Vec<RawListEntry>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    device: Vec<RawListEntry>,
}

#[derive(Debug, Deserialize)]
struct CommandStatus {
    #[serde(default)]
    status: Option<String>,
}

/// HTTP client for the TellStick Local API
pub struct TelldusHttpClient {
    /// HTTP client instance
    client: Client,

    /// Base URL, always ending in `/api/`
    base_url: Url,

    /// Extra attempts for retryable failures
    max_retries: u32,
}

impl TelldusHttpClient {
    /// Create a new client from validated configuration
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let base_url = config.api_url()?;

        let auth_header = format!("Bearer {}", config.access_token);
        let mut default_headers = reqwest::header::HeaderMap::new();
        let mut header_value = reqwest::header::HeaderValue::from_str(&auth_header)
            .map_err(|e| BridgeError::config(format!("Invalid access token: {e}")))?;
        header_value.set_sensitive(true);
        default_headers.insert(reqwest::header::AUTHORIZATION, header_value);

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(format!("tellstick-bridge/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .build()
            .map_err(|e| BridgeError::connection(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            max_retries: config.max_retries,
        })
    }

    /// Build URL for API endpoint
    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| BridgeError::config(format!("Invalid URL path {path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Execute a GET request, retrying transport failures
    async fn execute_request(&self, url: &Url) -> Result<Value> {
        let attempts = self.max_retries + 1;
        let mut attempt = 1;

        loop {
            debug!("HTTP request attempt {attempt} to {}", url.path());

            match self.send_once(url).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = Duration::from_millis(100 * u64::from(attempt));
                    warn!("Request to {} failed ({e}), retrying in {delay:?}", url.path());
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, url: &Url) -> Result<Value> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                BridgeError::timeout(format!("HTTP request failed: {e}"))
            } else if e.is_connect() {
                BridgeError::connection(format!("HTTP request failed: {e}"))
            } else {
                BridgeError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error_msg = format!("HTTP error {status}: {body}");
            return Err(match status.as_u16() {
                401 | 403 => BridgeError::authentication(error_msg),
                404 => BridgeError::api(format!("Endpoint not found: {}", url.path())),
                500..=599 => BridgeError::connection(format!("Server error: {error_msg}")),
                _ => BridgeError::api(error_msg),
            });
        }

        let value: Value = response.json().await?;
        Self::check_error(value)
    }

    /// Turn an `{"error": "..."}` body into an error
    fn check_error(value: Value) -> Result<Value> {
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            return Err(BridgeError::api(error));
        }
        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.build_url(path, query)?;
        let value = self.execute_request(&url).await?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::parsing(format!("Unexpected payload from {path}: {e}")))
    }

    async fn command(&self, path: &str, query: &[(&str, String)]) -> Result<()> {
        let status: CommandStatus = self.get_json(path, query).await?;
        match status.status.as_deref() {
            Some("success") | None => Ok(()),
            Some(other) => Err(BridgeError::api(format!("{path} returned status {other}"))),
        }
    }
}

#[async_trait]
impl TelldusClient for TelldusHttpClient {
    async fn list_sensors(&self) -> Result<Vec<RawListEntry>> {
        let list: SensorList = self.get_json("sensors/list", &[]).await?;
        Ok(list.sensor)
    }

    async fn list_devices(&self) -> Result<Vec<RawListEntry>> {
        let list: DeviceList = self
            .get_json(
                "devices/list",
                &[("supportedMethods", ALL_METHODS_MASK.to_string())],
            )
            .await?;
        Ok(list.device)
    }

    async fn sensor_info(&self, id: LocalId) -> Result<RawSensorInfo> {
        self.get_json("sensor/info", &[("id", id.to_string())]).await
    }

    async fn device_info(&self, id: LocalId) -> Result<RawDeviceInfo> {
        self.get_json(
            "device/info",
            &[
                ("id", id.to_string()),
                ("supportedMethods", ALL_METHODS_MASK.to_string()),
            ],
        )
        .await
    }

    async fn set_device(&self, id: LocalId, on: bool) -> Result<()> {
        let path = if on { "device/turnOn" } else { "device/turnOff" };
        self.command(path, &[("id", id.to_string())]).await
    }

    async fn set_dim_level(&self, id: LocalId, level: u8) -> Result<()> {
        self.command(
            "device/dim",
            &[("id", id.to_string()), ("level", level.to_string())],
        )
        .await
    }

    async fn system_info(&self) -> Result<SystemInfo> {
        self.get_json("system/info", &[]).await
    }
}
