//! spoolman-vars - mirror the active Spoolman spool into Klipper
//!
//! Listens for Moonraker's `notify_active_spool_set` and `notify_klippy_ready`
//! notifications and keeps the variables of a `gcode_macro` (by default
//! `SPOOLMAN_VARS`) in sync with the selected spool's filament:
//!
//! - `id`, `hotend_temp`, `bed_temp`, `material`, `name`, `vendor`
//!
//! The Klipper side only needs a macro declaring those variables:
//!
//! ```text
//! [gcode_macro SPOOLMAN_VARS]
//! variable_id: None
//! variable_hotend_temp: None
//! variable_bed_temp: None
//! variable_material: None
//! variable_name: None
//! variable_vendor: None
//! gcode:
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use spoolman_vars::{MoonrakerClient, SpoolmanClient, SyncController, WarningLog};
//!
//! # async fn run() -> spoolman_vars::Result<()> {
//! let moonraker = Arc::new(MoonrakerClient::new("http://127.0.0.1:7125", Duration::from_secs(10))?);
//! let spoolman = Arc::new(SpoolmanClient::new("http://spoolman.local:7912", Duration::from_secs(10))?);
//! let mut controller = SyncController::new(
//!     moonraker.clone(),
//!     spoolman,
//!     moonraker,
//!     Arc::new(WarningLog::new()),
//!     "SPOOLMAN_VARS",
//! );
//! controller.on_firmware_ready().await;
//! controller.on_active_spool_changed(Some(3)).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod escape;
pub mod klipper;
pub mod moonraker;
pub mod probe;
pub mod spoolman;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::BridgeConfig;
pub use controller::SyncController;
pub use diagnostics::{Diagnostics, WarningLog};
pub use error::{BridgeError, Result};
pub use escape::{NONE_MARKER, escape};
pub use klipper::{DEFAULT_MACRO, GcodeExecutor, KlipperVars};
pub use moonraker::{ActiveSpoolStatus, MoonrakerClient, NotificationListener, parse_notification};
pub use probe::{CapabilityProbe, CapabilityState, ProbeErrorKind, classify_probe_error};
pub use spoolman::{SpoolSource, SpoolmanClient};
pub use types::{HostEvent, NormalizedSpool, TrackedVariable};
