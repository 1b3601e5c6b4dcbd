//! One-shot detection of the `gcode_macro` that holds the mirrored variables.

use std::sync::Arc;

use tracing::{info, warn};

use crate::diagnostics::{COMPONENT_NAME, Diagnostics};
use crate::error::BridgeError;
use crate::escape::NONE_MARKER;
use crate::klipper::{GcodeExecutor, set_variable_command};
use crate::types::TrackedVariable;

/// Whether the target macro exists. Leaves `Unchecked` once and never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityState {
    #[default]
    Unchecked,
    Available,
    Unavailable,
}

/// How a failed probe command should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeErrorKind {
    /// The macro exists but does not declare the probed variable.
    AttributeMissing,
    /// The macro itself is not defined.
    GroupMissing,
    Other,
}

/// Classify a probe error message.
///
/// Klipper reports an unknown variable as `Unknown gcode_macro variable 'id'`
/// and an unknown macro as `The value 'SPOOLMAN_VARS' is not valid for MACRO`,
/// so the quoted attribute name is checked first.
pub fn classify_probe_error(message: &str, attribute: &str, macro_name: &str) -> ProbeErrorKind {
    let message = message.to_lowercase();
    if message.contains(&format!("'{}'", attribute.to_lowercase())) {
        ProbeErrorKind::AttributeMissing
    } else if message.contains(&macro_name.to_lowercase()) || message.contains("gcode_macro") {
        ProbeErrorKind::GroupMissing
    } else {
        ProbeErrorKind::Other
    }
}

/// Memoized probe: the first call writes `id` once, later calls return the cached answer.
pub struct CapabilityProbe {
    executor: Arc<dyn GcodeExecutor>,
    diagnostics: Arc<dyn Diagnostics>,
    macro_name: String,
    state: CapabilityState,
}

impl CapabilityProbe {
    pub fn new(
        executor: Arc<dyn GcodeExecutor>,
        diagnostics: Arc<dyn Diagnostics>,
        macro_name: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            diagnostics,
            macro_name: macro_name.into(),
            state: CapabilityState::Unchecked,
        }
    }

    pub fn state(&self) -> CapabilityState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == CapabilityState::Available
    }

    /// Resolve the capability on first use and return whether syncing may proceed.
    pub async fn ensure_available(&mut self) -> bool {
        match self.state {
            CapabilityState::Available => return true,
            CapabilityState::Unavailable => return false,
            CapabilityState::Unchecked => {}
        }

        let attribute = TrackedVariable::Id.as_str();
        let script = set_variable_command(
            &self.macro_name,
            attribute,
            &format!("\"{NONE_MARKER}\""),
        );

        self.state = match self.executor.run_gcode(&script).await {
            Ok(()) => {
                info!(macro_name = %self.macro_name, "gcode_macro detected");
                CapabilityState::Available
            }
            Err(err) => {
                let message = match &err {
                    BridgeError::Gcode { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                match classify_probe_error(&message, attribute, &self.macro_name) {
                    ProbeErrorKind::AttributeMissing => {
                        info!(
                            macro_name = %self.macro_name,
                            "gcode_macro detected, but missing valid variable/s"
                        );
                        CapabilityState::Available
                    }
                    kind => {
                        self.diagnostics.warning(&format!(
                            "{COMPONENT_NAME}: gcode_macro {} not found. \
                             Spool details will not be pulled from Spoolman.",
                            self.macro_name
                        ));
                        warn!(
                            macro_name = %self.macro_name,
                            ?kind,
                            error = %message,
                            "Failed sanity check for gcode_macro"
                        );
                        CapabilityState::Unavailable
                    }
                }
            }
        };

        self.is_available()
    }
}
