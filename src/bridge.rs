//! Bridge lifecycle: initialization, discovery passes and commands
//!
//! `initialize` validates configuration, identifies the controller, runs the
//! first discovery pass and then announces the bridge to the host as a
//! platform. Each later `run` is one more discovery pass.

use crate::client::{SystemInfo, TelldusClient, TelldusHttpClient};
use crate::codec::UnitTable;
use crate::commands::{CommandDispatcher, CommandOutcome};
use crate::config::BridgeConfig;
use crate::discovery::{DeviceRegistry, DiscoveryPoller, Pacer, PassReport, TokioPacer};
use crate::error::Result;
use crate::host::{HostServices, PlatformInfo};
use crate::mapping::{Serial, SerialMapper};
use crate::normalizer::Normalizer;
use semver::{Version, VersionReq};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How the connected controller compares to the supported products list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductSupport {
    Supported,
    /// Product missing from the response or not on the list
    UnknownProduct(Option<String>),
    /// Known product, firmware outside the supported range
    UnsupportedVersion { product: String, version: String },
}

/// Check controller identification against the supported products list
pub fn check_product(supported: &HashMap<String, VersionReq>, info: &SystemInfo) -> ProductSupport {
    let Some(product) = info.product.as_deref() else {
        return ProductSupport::UnknownProduct(None);
    };
    let Some(requirement) = supported.get(product) else {
        return ProductSupport::UnknownProduct(Some(product.to_string()));
    };

    let version = info.version.as_deref().unwrap_or_default();
    match Version::parse(version.trim_start_matches('v')) {
        Ok(parsed) if requirement.matches(&parsed) => ProductSupport::Supported,
        _ => ProductSupport::UnsupportedVersion {
            product: product.to_string(),
            version: version.to_string(),
        },
    }
}

/// Bridge between one TellStick controller and the host registry
pub struct TellstickBridge {
    poller: DiscoveryPoller,
    commands: CommandDispatcher,
    mapper: SerialMapper,
    system: Option<SystemInfo>,
}

impl TellstickBridge {
    /// Connect to the controller over HTTP and initialize
    pub async fn connect(config: BridgeConfig, host: Arc<dyn HostServices>) -> Result<Self> {
        config.validate().inspect_err(|e| error!("{e}"))?;
        let client = Arc::new(TelldusHttpClient::new(&config)?);
        Self::start(config, client, host, Arc::new(TokioPacer)).await
    }

    /// Initialize with an existing controller client
    pub async fn initialize(
        config: BridgeConfig,
        client: Arc<dyn TelldusClient>,
        host: Arc<dyn HostServices>,
    ) -> Result<Self> {
        Self::initialize_with_pacer(config, client, host, Arc::new(TokioPacer)).await
    }

    /// Initialize with a custom pacer
    pub async fn initialize_with_pacer(
        config: BridgeConfig,
        client: Arc<dyn TelldusClient>,
        host: Arc<dyn HostServices>,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self> {
        config.validate().inspect_err(|e| error!("{e}"))?;
        Self::start(config, client, host, pacer).await
    }

    /// Everything after validation: identify, discover, announce
    async fn start(
        config: BridgeConfig,
        client: Arc<dyn TelldusClient>,
        host: Arc<dyn HostServices>,
        pacer: Arc<dyn Pacer>,
    ) -> Result<Self> {
        debug!(
            "Initializing for controller {} (ignoring {:?}, policy {:?})",
            config.ip, config.ignore_list, config.registration_policy
        );

        let mapper = SerialMapper::new(config.base_sn_multiplier, host.base_sn())
            .inspect_err(|e| error!("{e}"))?;
        debug!("Serial base is {}", mapper.base_sn());

        let system = match client.system_info().await {
            Ok(system) => {
                match check_product(&config.supported_products, &system) {
                    ProductSupport::Supported => {
                        debug!("Controller {:?} {:?} is supported", system.product, system.version)
                    }
                    ProductSupport::UnknownProduct(product) => {
                        warn!("{product:?} is not in the supported products list")
                    }
                    ProductSupport::UnsupportedVersion { product, version } => {
                        warn!("{product} firmware {version} is outside the supported range")
                    }
                }
                Some(system)
            }
            Err(e) => {
                warn!("Could not read controller system info: {e}");
                None
            }
        };

        let normalizer = Normalizer::new(mapper, UnitTable::with_overrides(&config.unit_overrides));
        let poller = DiscoveryPoller::new(client.clone(), host.clone(), normalizer)
            .with_ignore_list(config.ignore_list.iter().copied())
            .with_policy(config.registration_policy)
            .with_pacing(config.pacing.clone())
            .with_pacer(pacer);

        let mut bridge = Self {
            poller,
            commands: CommandDispatcher::new(client, mapper),
            mapper,
            system,
        };

        bridge.run().await;

        host.register_platform(PlatformInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            product: bridge.system.as_ref().and_then(|s| s.product.clone()),
            base_sn: mapper.base_sn(),
        });
        info!("TellStick bridge initialized at serial base {}", mapper.base_sn());

        Ok(bridge)
    }

    /// Run one discovery pass
    pub async fn run(&mut self) -> PassReport {
        debug!("*** Running discovery");
        let report = self.poller.run_pass().await;
        debug!("*** End discovery");
        report
    }

    /// Cloneable command handle, usable while a pass is running
    pub fn commands(&self) -> CommandDispatcher {
        self.commands.clone()
    }

    pub async fn set_on_off(&self, serial: Serial, value: i64) -> CommandOutcome {
        self.commands.set_on_off(serial, value).await
    }

    pub async fn set_dim(&self, serial: Serial, value: f64) -> CommandOutcome {
        self.commands.set_dim(serial, value).await
    }

    pub fn base_sn(&self) -> Serial {
        self.mapper.base_sn()
    }

    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system.as_ref()
    }

    pub fn registry(&self) -> &DeviceRegistry {
        self.poller.registry()
    }
}
