//! Bridge configuration, loaded from TOML and overridable from the command line.
//!
//! ```toml
//! spoolman_url = "http://spoolman.local:7912/"
//! moonraker_host = "127.0.0.1"
//! moonraker_port = 7125
//! macro_name = "SPOOLMAN_VARS"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{BridgeError, Result};
use crate::klipper::DEFAULT_MACRO;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BridgeConfig {
    /// Spoolman server URL; trailing slashes are ignored.
    pub spoolman_url: String,

    #[serde(default = "default_moonraker_host")]
    pub moonraker_host: String,

    #[serde(default = "default_moonraker_port")]
    pub moonraker_port: u16,

    /// Name of the `gcode_macro` holding the variables.
    #[serde(default = "default_macro_name")]
    pub macro_name: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay before reconnecting a dropped Moonraker websocket.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_moonraker_host() -> String {
    "127.0.0.1".to_string()
}

fn default_moonraker_port() -> u16 {
    7125
}

fn default_macro_name() -> String {
    DEFAULT_MACRO.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

impl BridgeConfig {
    /// Config with defaults for everything but the Spoolman URL.
    pub fn new(spoolman_url: impl Into<String>) -> Self {
        Self {
            spoolman_url: spoolman_url.into(),
            moonraker_host: default_moonraker_host(),
            moonraker_port: default_moonraker_port(),
            macro_name: default_macro_name(),
            request_timeout_secs: default_request_timeout_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(self.spoolman_base_url())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BridgeError::Config(format!(
                "spoolman_url must be http(s), got {}",
                url.scheme()
            )));
        }
        if self.moonraker_host.trim().is_empty() {
            return Err(BridgeError::Config("moonraker_host is empty".into()));
        }
        if self.macro_name.is_empty() || self.macro_name.contains(char::is_whitespace) {
            return Err(BridgeError::Config(format!(
                "invalid macro_name {:?}",
                self.macro_name
            )));
        }
        Ok(())
    }

    /// Spoolman URL with trailing slashes stripped.
    pub fn spoolman_base_url(&self) -> &str {
        self.spoolman_url.trim_end_matches('/')
    }

    pub fn moonraker_url(&self) -> String {
        format!("http://{}:{}", self.moonraker_host, self.moonraker_port)
    }

    pub fn websocket_url(&self) -> String {
        format!("ws://{}:{}/websocket", self.moonraker_host, self.moonraker_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
