//! In-memory fakes for the bridge's external seams.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{BridgeError, Result};
use crate::klipper::GcodeExecutor;
use crate::moonraker::ActiveSpoolStatus;
use crate::spoolman::SpoolSource;
use crate::types::NormalizedSpool;

/// Records every script; fails the ones containing `fail_pattern`.
#[derive(Default)]
pub struct RecordingExecutor {
    scripts: Mutex<Vec<String>>,
    fail_pattern: Option<(String, String)>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(pattern: &str, message: &str) -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            fail_pattern: Some((pattern.to_string(), message.to_string())),
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GcodeExecutor for RecordingExecutor {
    async fn run_gcode(&self, script: &str) -> Result<()> {
        self.scripts.lock().unwrap().push(script.to_string());
        match &self.fail_pattern {
            Some((pattern, message)) if script.contains(pattern.as_str()) => {
                Err(BridgeError::Gcode {
                    script: script.to_string(),
                    message: message.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Canned outcome for one spool id.
#[derive(Clone)]
pub enum FakeSpool {
    Found(NormalizedSpool),
    NoFilament,
    Status(u16),
}

#[derive(Default)]
pub struct FakeSpools {
    spools: HashMap<i64, FakeSpool>,
    calls: AtomicUsize,
}

impl FakeSpools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, spool_id: i64, spool: FakeSpool) -> Self {
        self.spools.insert(spool_id, spool);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpoolSource for FakeSpools {
    async fn fetch(&self, spool_id: i64) -> Result<Option<NormalizedSpool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.spools.get(&spool_id) {
            Some(FakeSpool::Found(spool)) => Ok(Some(spool.clone())),
            Some(FakeSpool::NoFilament) => Ok(None),
            Some(FakeSpool::Status(status)) => Err(BridgeError::Status {
                status: *status,
                url: format!("http://spoolman.test/api/v1/spool/{spool_id}"),
            }),
            None => Err(BridgeError::Status {
                status: 404,
                url: format!("http://spoolman.test/api/v1/spool/{spool_id}"),
            }),
        }
    }
}

/// Host status returning a fixed active spool, or a 503 when `failing`.
pub struct FakeStatus {
    spool_id: Option<i64>,
    failing: bool,
}

impl FakeStatus {
    pub fn active(spool_id: Option<i64>) -> Self {
        Self {
            spool_id,
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            spool_id: None,
            failing: true,
        }
    }
}

#[async_trait]
impl ActiveSpoolStatus for FakeStatus {
    async fn active_spool_id(&self) -> Result<Option<i64>> {
        if self.failing {
            return Err(BridgeError::Status {
                status: 503,
                url: "http://moonraker.test/server/spoolman/spool_id".to_string(),
            });
        }
        Ok(self.spool_id)
    }
}
