//! Writes spool attributes into Klipper's `gcode_macro` variable store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Result;
use crate::escape::NONE_MARKER;
use crate::types::{NormalizedSpool, TrackedVariable};

/// Default name of the macro holding the mirrored variables.
pub const DEFAULT_MACRO: &str = "SPOOLMAN_VARS";

/// Channel that runs one G-code script at a time on the firmware.
#[async_trait]
pub trait GcodeExecutor: Send + Sync {
    /// Run `script`; an `Err` carries the firmware's error message.
    async fn run_gcode(&self, script: &str) -> Result<()>;
}

/// Build a `SET_GCODE_VARIABLE` command. `value` must already be a valid literal.
pub fn set_variable_command(macro_name: &str, variable: &str, value: &str) -> String {
    format!("SET_GCODE_VARIABLE MACRO={macro_name} VARIABLE={variable} VALUE={value}")
}

/// Pushes the active spool (or its absence) into the macro's variables.
///
/// Both passes write the six tracked variables strictly in
/// [`TrackedVariable::ALL`] order. The first failing command aborts the rest
/// of the pass; variables written before it keep their new value.
#[derive(Clone)]
pub struct KlipperVars {
    executor: Arc<dyn GcodeExecutor>,
    macro_name: String,
}

impl KlipperVars {
    pub fn new(executor: Arc<dyn GcodeExecutor>, macro_name: impl Into<String>) -> Self {
        Self {
            executor,
            macro_name: macro_name.into(),
        }
    }

    pub fn macro_name(&self) -> &str {
        &self.macro_name
    }

    /// Command resetting `variable` to the `None` marker.
    pub fn clear_command(&self, variable: TrackedVariable) -> String {
        set_variable_command(
            &self.macro_name,
            variable.as_str(),
            &format!("\"{NONE_MARKER}\""),
        )
    }

    /// Command storing an already escaped value as a quoted string literal.
    pub fn update_command(&self, variable: TrackedVariable, escaped: &str) -> String {
        set_variable_command(&self.macro_name, variable.as_str(), &format!("'\"{escaped}\"'"))
    }

    /// Reset every tracked variable to `None`.
    pub async fn clear(&self) -> Result<()> {
        let commands = TrackedVariable::ALL.map(|var| (var, self.clear_command(var)));
        self.write_all(&commands).await?;
        info!(macro_name = %self.macro_name, "variables cleared");
        Ok(())
    }

    /// Write the spool's escaped attributes to every tracked variable.
    pub async fn update(&self, spool: &NormalizedSpool) -> Result<()> {
        let commands =
            TrackedVariable::ALL.map(|var| (var, self.update_command(var, &spool.escaped(var))));
        self.write_all(&commands).await?;
        info!(macro_name = %self.macro_name, filament_id = ?spool.id, "variables updated");
        Ok(())
    }

    async fn write_all(&self, commands: &[(TrackedVariable, String)]) -> Result<()> {
        for (written, (variable, script)) in commands.iter().enumerate() {
            if let Err(err) = self.executor.run_gcode(script).await {
                warn!(
                    macro_name = %self.macro_name,
                    variable = variable.as_str(),
                    written,
                    error = %err,
                    "Failed to update variables, aborting remaining writes"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}
