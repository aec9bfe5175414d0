//! TellStick bridge - standalone entry point
//!
//! Runs the bridge against a controller and prints every host event as a JSON
//! line on stdout. Discovery repeats every `poll_interval` until Ctrl-C.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tellstick_bridge::host::{ChannelHost, HostEvent};
use tellstick_bridge::logging::{init_logging, LogConfig};
use tellstick_bridge::{BridgeConfig, TellstickBridge};
use tracing::{info, warn, Level};

/// TellStick bridge configuration
#[derive(Parser, Debug)]
#[command(name = "tellstick-bridge")]
#[command(about = "Discover TellStick sensors and devices and forward them to a host registry")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Controller address
    #[arg(long, env = "TELLSTICK_IP")]
    ip: Option<String>,

    /// Local API access token
    #[arg(long, env = "TELLSTICK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Host base serial number
    #[arg(long, default_value_t = 0)]
    host_base_sn: u64,

    /// Run a single discovery pass and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    init_logging(LogConfig::from_env().with_level(level))
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => BridgeConfig::from_env().context("Failed to read configuration from environment")?,
    };
    if let Some(ip) = cli.ip {
        config.ip = ip;
    }
    if let Some(token) = cli.access_token {
        config.access_token = token;
    }
    let poll_interval = config.poll_interval;

    let (host, mut events) = ChannelHost::new(cli.host_base_sn);
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!("Could not serialize host event: {e}"),
            }
            if let HostEvent::RegisterPlatform(info) = &event {
                info!("Platform registered at serial base {}", info.base_sn);
            }
        }
    });

    let mut bridge = TellstickBridge::connect(config, Arc::new(host))
        .await
        .context("Bridge initialization failed")?;

    if !cli.once {
        let mut ticker = tokio::time::interval(poll_interval);
        // A pass can outlast the interval when the controller is slow
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; initialization already ran a pass
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = bridge.run().await;
                    info!(
                        "Pass: {} sensors, {} devices seen, {} registered",
                        report.sensors.seen,
                        report.devices.seen,
                        report.registered()
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    break;
                }
            }
        }
    }

    drop(bridge);
    printer.await.context("Event printer task failed")?;
    Ok(())
}
