//! Synchronization controller: sequences probe → fetch → bridge per host event.
//!
//! The controller owns the only mutable state of the bridge (the active spool
//! and, through the probe, the capability flag). Every entry point takes
//! `&mut self`, and [`SyncController::run`] drains a single event queue, so two
//! six-command write passes can never interleave.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::diagnostics::{COMPONENT_NAME, Diagnostics};
use crate::error::Result;
use crate::klipper::{GcodeExecutor, KlipperVars};
use crate::moonraker::ActiveSpoolStatus;
use crate::probe::{CapabilityProbe, CapabilityState};
use crate::spoolman::SpoolSource;
use crate::types::{HostEvent, NormalizedSpool};

pub struct SyncController {
    probe: CapabilityProbe,
    vars: KlipperVars,
    spools: Arc<dyn SpoolSource>,
    status: Arc<dyn ActiveSpoolStatus>,
    diagnostics: Arc<dyn Diagnostics>,
    current_spool: Option<NormalizedSpool>,
}

impl SyncController {
    pub fn new(
        executor: Arc<dyn GcodeExecutor>,
        spools: Arc<dyn SpoolSource>,
        status: Arc<dyn ActiveSpoolStatus>,
        diagnostics: Arc<dyn Diagnostics>,
        macro_name: &str,
    ) -> Self {
        Self {
            probe: CapabilityProbe::new(executor.clone(), diagnostics.clone(), macro_name),
            vars: KlipperVars::new(executor, macro_name),
            spools,
            status,
            diagnostics,
            current_spool: None,
        }
    }

    /// Spool last mirrored into Klipper, if any.
    pub fn current_spool(&self) -> Option<&NormalizedSpool> {
        self.current_spool.as_ref()
    }

    pub fn capability(&self) -> CapabilityState {
        self.probe.state()
    }

    /// Process host events one at a time until every sender is dropped.
    pub async fn run(mut self, mut events: mpsc::Receiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!("host event queue closed");
    }

    pub async fn handle(&mut self, event: HostEvent) {
        match event {
            HostEvent::FirmwareReady => self.on_firmware_ready().await,
            HostEvent::ActiveSpoolSet { spool_id } => self.on_active_spool_changed(spool_id).await,
        }
    }

    /// Klipper became ready: probe once, then reconcile with the host's active spool.
    pub async fn on_firmware_ready(&mut self) {
        info!(macro_name = %self.vars.macro_name(), "Klippy ready, searching for gcode_macro");
        if !self.probe.ensure_available().await {
            return;
        }
        info!("Performing initial spool load...");
        if let Err(err) = self.load_initial_spool().await {
            warn!(
                error = %err,
                "Initial spool load failed. Spoolman may not be ready yet."
            );
        }
    }

    /// Spoolman's active spool changed. Ignored until the probe found the macro.
    pub async fn on_active_spool_changed(&mut self, spool_id: Option<i64>) {
        if !self.probe.is_available() {
            debug!(?spool_id, capability = ?self.probe.state(), "ignoring spool change");
            return;
        }

        match spool_id {
            Some(spool_id) => self.sync_spool(spool_id).await,
            None => {
                info!("Active spool cleared, resetting Klipper variables");
                self.current_spool = None;
                self.clear_vars().await;
            }
        }
    }

    async fn load_initial_spool(&mut self) -> Result<()> {
        match self.status.active_spool_id().await? {
            Some(spool_id) => self.sync_spool(spool_id).await,
            None => {
                info!("No active spool on initial load");
                self.current_spool = None;
                self.clear_vars().await;
            }
        }
        Ok(())
    }

    /// Fetch the spool and mirror it. Fetch failures leave the firmware untouched.
    async fn sync_spool(&mut self, spool_id: i64) {
        match self.spools.fetch(spool_id).await {
            Ok(Some(spool)) => {
                let spool = self.current_spool.insert(spool);
                if let Err(err) = self.vars.update(spool).await {
                    debug!(spool_id, error = %err, "variable update incomplete");
                }
            }
            Ok(None) => {
                warn!(spool_id, "No filament data found for spool");
                self.current_spool = None;
                self.clear_vars().await;
            }
            Err(err) => {
                self.current_spool = None;
                self.diagnostics.warning(&format!(
                    "{COMPONENT_NAME}: Failed to query filament {spool_id}: {err}"
                ));
                warn!(spool_id, error = %err, "Failed to query filament");
            }
        }
    }

    async fn clear_vars(&self) {
        if let Err(err) = self.vars.clear().await {
            debug!(error = %err, "variable clear incomplete");
        }
    }
}
