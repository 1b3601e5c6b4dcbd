//! spoolman-vars binary entrypoint.
//!
//! Wires one `SyncController` to Moonraker: the websocket listener feeds host
//! events into a single queue, the controller drains it in order, and G-code is
//! sent back through Moonraker's HTTP API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use spoolman_vars::{
    BridgeConfig, MoonrakerClient, NotificationListener, SpoolmanClient, SyncController,
    WarningLog,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::prelude::*;

const EVENT_QUEUE_DEPTH: usize = 32;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spoolman-vars",
    about = "Mirror the active Spoolman spool into Klipper gcode_macro variables",
    version
)]
struct Opts {
    /// TOML config file; flags below override its values
    #[arg(long, short, env = "SPOOLMAN_VARS_CONFIG")]
    config: Option<PathBuf>,

    /// Spoolman server URL (e.g., http://spoolman.local:7912)
    #[arg(long, env = "SPOOLMAN_VARS_SPOOLMAN_URL")]
    spoolman_url: Option<String>,

    /// Moonraker address
    #[arg(long, env = "SPOOLMAN_VARS_MOONRAKER_HOST")]
    moonraker_host: Option<String>,

    /// Moonraker port
    #[arg(long, env = "SPOOLMAN_VARS_MOONRAKER_PORT")]
    moonraker_port: Option<u16>,

    /// gcode_macro holding the variables
    #[arg(long = "macro", env = "SPOOLMAN_VARS_MACRO")]
    macro_name: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "SPOOLMAN_VARS_LOG_JSON", default_value_t = false)]
    log_json: bool,
}

impl Opts {
    fn resolve_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => {
                let url = self
                    .spoolman_url
                    .clone()
                    .context("no Spoolman URL: pass --spoolman-url or --config")?;
                BridgeConfig::new(url)
            }
        };

        if let Some(url) = &self.spoolman_url {
            config.spoolman_url = url.clone();
        }
        if let Some(host) = &self.moonraker_host {
            config.moonraker_host = host.clone();
        }
        if let Some(port) = self.moonraker_port {
            config.moonraker_port = port;
        }
        if let Some(name) = &self.macro_name {
            config.macro_name = name.clone();
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    init_tracing(opts.log_json);
    let config = opts.resolve_config()?;

    let moonraker = MoonrakerClient::new(config.moonraker_url(), config.request_timeout())
        .context("failed to build Moonraker client")?;
    let spoolman = SpoolmanClient::new(config.spoolman_base_url(), config.request_timeout())
        .context("failed to build Spoolman client")?;
    let shared_moonraker = Arc::new(moonraker.clone());

    let controller = SyncController::new(
        shared_moonraker.clone(),
        Arc::new(spoolman),
        shared_moonraker,
        Arc::new(WarningLog::new()),
        &config.macro_name,
    );

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let listener =
        NotificationListener::new(config.websocket_url(), moonraker, config.reconnect_delay());
    tokio::spawn(listener.run(tx));

    info!(
        spoolman = %config.spoolman_base_url(),
        moonraker = %config.moonraker_url(),
        macro_name = %config.macro_name,
        "Component loaded"
    );

    tokio::select! {
        _ = controller.run(rx) => {}
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }
    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};
    // Default to info but keep HTTP internals quiet unless overridden by RUST_LOG
    let default_filter = "info,hyper=warn,reqwest=warn,tungstenite=warn";
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
}
