//! Operator-visible warnings, kept apart from regular log output.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Prefix used for every host warning raised by this bridge.
pub const COMPONENT_NAME: &str = "spoolman_vars";

/// Host surface for non-fatal problems an operator should notice.
pub trait Diagnostics: Send + Sync {
    fn warning(&self, message: &str);
}

/// Number of recent warnings a [`WarningLog`] keeps.
pub const RETAINED_WARNINGS: usize = 32;

/// Diagnostics sink that logs each warning and keeps the most recent ones.
#[derive(Debug, Default)]
pub struct WarningLog {
    warnings: Mutex<VecDeque<String>>,
}

impl WarningLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retained warnings, oldest first.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

impl Diagnostics for WarningLog {
    fn warning(&self, message: &str) {
        tracing::warn!(target: "spoolman_vars::diagnostics", "{message}");
        let mut warnings = self.warnings.lock().unwrap_or_else(|e| e.into_inner());
        if warnings.len() == RETAINED_WARNINGS {
            warnings.pop_front();
        }
        warnings.push_back(message.to_string());
    }
}
