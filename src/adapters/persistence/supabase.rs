//! Supabase Sink - PostgREST Table Insert
//!
//! Inserts one `ObservationRow` per tick through Supabase's REST
//! interface. HTTP and transport errors fail the insert; an empty
//! representation on a 2xx answer is only logged, never retried.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::row::ObservationRow;
use crate::config::PersistenceConfig;
use crate::domain::quote::Observation;
use crate::ports::observation_sink::ObservationSink;

/// Observation sink writing to a Supabase table.
pub struct SupabaseSink {
    http: Client,
    /// `{project}/rest/v1/{table}`.
    insert_url: String,
    api_key: String,
    data_source: String,
    tz: Tz,
}

impl SupabaseSink {
    /// Create a sink for the configured table.
    pub fn new(
        project_url: &str,
        api_key: &str,
        config: &PersistenceConfig,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone: {e}"))?;

        Ok(Self {
            http,
            insert_url: format!(
                "{}/rest/v1/{}",
                project_url.trim_end_matches('/'),
                config.table
            ),
            api_key: api_key.to_string(),
            data_source: config.data_source_label.clone(),
            tz,
        })
    }

    /// Count the rows echoed by a `return=representation` body.
    ///
    /// PostgREST echoes inserted rows as a JSON array. An empty body,
    /// an empty array and `null` all count as zero rows.
    pub fn acknowledged_rows(body: &str) -> Result<usize> {
        if body.trim().is_empty() {
            return Ok(0);
        }
        let value: serde_json::Value =
            serde_json::from_str(body).context("Insert acknowledgment is not JSON")?;

        Ok(value.as_array().map_or(0, Vec::len))
    }
}

#[async_trait]
impl ObservationSink for SupabaseSink {
    #[instrument(skip(self, observation), fields(ts = %observation.timestamp))]
    async fn record(&self, observation: &Observation) -> Result<()> {
        let row = ObservationRow::from_observation(observation, &self.data_source, self.tz);

        let response = self
            .http
            .post(&self.insert_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .context("Supabase insert request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Supabase response")?;

        if !status.is_success() {
            anyhow::bail!("Supabase error {status}: {body}");
        }

        match Self::acknowledged_rows(&body)? {
            0 => warn!(%status, body = %body, "Insert may have failed, empty acknowledgment"),
            rows => debug!(rows, "Observation row inserted"),
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        // Any HTTP answer means the project is reachable.
        self.http
            .head(&self.insert_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .is_ok()
    }
}
