//! HTTP client for the Spoolman spool API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::types::{NormalizedSpool, SpoolResponse};

/// Source of filament data for a spool id.
#[async_trait]
pub trait SpoolSource: Send + Sync {
    /// `Ok(None)` when the spool has no filament assigned.
    async fn fetch(&self, spool_id: i64) -> Result<Option<NormalizedSpool>>;
}

/// Spoolman API client.
#[derive(Clone)]
pub struct SpoolmanClient {
    base_url: String,
    http: Client,
}

impl SpoolmanClient {
    /// Create a client for the Spoolman server at `base_url` (trailing `/` is ignored).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BridgeError::Http)?;
        Ok(Self::with_client(base_url, http))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn spool_url(&self, spool_id: i64) -> String {
        format!("{}/api/v1/spool/{spool_id}", self.base_url)
    }
}

#[async_trait]
impl SpoolSource for SpoolmanClient {
    async fn fetch(&self, spool_id: i64) -> Result<Option<NormalizedSpool>> {
        let url = self.spool_url(spool_id);
        info!(spool_id, "Fetching spool info");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: SpoolResponse = response.json().await?;
        let Some(filament) = body.filament_record()? else {
            debug!(spool_id, "spool response has no filament");
            return Ok(None);
        };
        Ok(Some(NormalizedSpool::from_filament(&filament)))
    }
}
