//! Configuration management for the TellStick bridge
//!
//! Configuration comes from the host as JSON (`from_json`), from a TOML file
//! layered with `TELLSTICK_*` environment variables (`load`), or from the
//! environment alone (`from_env`). Key names from the older plugin config
//! (`access_token`, `sn_x1000`, `ignore_id_list`) are accepted as aliases.

use crate::discovery::{PacingConfig, RegistrationPolicy};
use crate::error::{BridgeError, Result};
use crate::mapping::{LocalId, SERIAL_BLOCK};
use semver::VersionReq;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::{env, time::Duration};
use url::Url;

/// Bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Controller address, e.g. "192.168.1.20" or "http://tellstick.local"
    #[serde(default)]
    pub ip: String,

    /// Local API access token
    #[serde(default, alias = "accessToken")]
    pub access_token: String,

    /// Serial block of this bridge, in thousands above the host base
    #[serde(default, alias = "sn_x1000", alias = "baseSnMultiplier")]
    pub base_sn_multiplier: u64,

    /// Controller-local ids never registered
    #[serde(default, alias = "ignore_id_list", alias = "ignoreList")]
    pub ignore_list: Vec<LocalId>,

    /// When already registered records are forwarded again
    #[serde(default)]
    pub registration_policy: RegistrationPolicy,

    /// Channel name to unit, replacing or extending the built-in units
    #[serde(default)]
    pub unit_overrides: HashMap<String, String>,

    /// Product name to supported firmware versions
    #[serde(default = "default_supported_products")]
    pub supported_products: HashMap<String, VersionReq>,

    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Extra attempts for connection failures and timeouts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pacing of controller calls during discovery
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Interval between discovery passes when running standalone
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_supported_products() -> HashMap<String, VersionReq> {
    let mut products = HashMap::new();
    if let Ok(req) = VersionReq::parse("^1.1.1") {
        products.insert("tellstick-znet-lite-v2".to_string(), req);
    }
    products
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_retries() -> u32 {
    1
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ip: String::new(),
            access_token: String::new(),
            base_sn_multiplier: 0,
            ignore_list: Vec::new(),
            registration_policy: RegistrationPolicy::default(),
            unit_overrides: HashMap::new(),
            supported_products: default_supported_products(),
            timeout: default_timeout(),
            max_retries: default_max_retries(),
            pacing: PacingConfig::default(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl BridgeConfig {
    /// Parse the platform configuration object handed over by the host
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| BridgeError::config(format!("Invalid platform configuration: {e}")))
    }

    /// Load a TOML file, then apply `TELLSTICK_*` environment overrides.
    ///
    /// Nested keys use a double underscore: `TELLSTICK_PACING__ITEM_DELAY`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TELLSTICK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ignore_list"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(ip) = env::var("TELLSTICK_IP") {
            config.ip = ip;
        }

        if let Ok(token) = env::var("TELLSTICK_ACCESS_TOKEN") {
            config.access_token = token;
        }

        if let Ok(multiplier) = env::var("TELLSTICK_SN_MULTIPLIER") {
            config.base_sn_multiplier = multiplier.parse().map_err(|e| {
                BridgeError::config(format!("Invalid TELLSTICK_SN_MULTIPLIER: {e}"))
            })?;
        }

        if let Ok(list) = env::var("TELLSTICK_IGNORE_LIST") {
            config.ignore_list = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse().map_err(|e| {
                        BridgeError::config(format!("Invalid id {s:?} in TELLSTICK_IGNORE_LIST: {e}"))
                    })
                })
                .collect::<Result<_>>()?;
        }

        if let Ok(policy) = env::var("TELLSTICK_REGISTRATION_POLICY") {
            config.registration_policy = match policy.to_lowercase().as_str() {
                "once" => RegistrationPolicy::Once,
                "changed" => RegistrationPolicy::Changed,
                "always" => RegistrationPolicy::Always,
                _ => {
                    return Err(BridgeError::config(format!(
                        "Invalid TELLSTICK_REGISTRATION_POLICY: {policy}. Use 'once', 'changed' or 'always'"
                    )));
                }
            };
        }

        if let Ok(timeout) = env::var("TELLSTICK_TIMEOUT") {
            config.timeout = Duration::from_secs(
                timeout
                    .parse()
                    .map_err(|e| BridgeError::config(format!("Invalid TELLSTICK_TIMEOUT: {e}")))?,
            );
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ip.trim().is_empty() || self.access_token.trim().is_empty() {
            return Err(BridgeError::config(
                "No config for Telldus! Please include \"ip\" = \"<TELLSTICK_IP_ADDRESS>\" and \
                 \"access_token\" = \"<TELLSTICK_LOCAL_API_SECRET>\"",
            ));
        }

        if self.base_sn_multiplier.checked_mul(SERIAL_BLOCK).is_none() {
            return Err(BridgeError::config(format!(
                "base_sn_multiplier {} is too large",
                self.base_sn_multiplier
            )));
        }

        if self.timeout.is_zero() {
            return Err(BridgeError::config("Timeout must be greater than zero"));
        }

        self.api_url()?;
        Ok(())
    }

    /// Base URL of the Local API, always ending in `/api/`
    pub fn api_url(&self) -> Result<Url> {
        let host = self.ip.trim().trim_end_matches('/');
        let url_str = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}/api/")
        } else {
            format!("http://{host}/api/")
        };
        let url: Url = url_str
            .parse()
            .map_err(|e| BridgeError::config(format!("Invalid controller address {host:?}: {e}")))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(BridgeError::config(format!("Invalid controller address {host:?}")));
        }
        Ok(url)
    }
}
