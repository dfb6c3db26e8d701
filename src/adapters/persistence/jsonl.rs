//! JSONL Sink - Append-only Local Observation Log
//!
//! Persists observation rows to daily JSONL files in the format
//! `observations/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record with the same shape as the database row.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::instrument;

use super::row::ObservationRow;
use crate::config::PersistenceConfig;
use crate::domain::quote::Observation;
use crate::ports::observation_sink::ObservationSink;

/// Append-only JSONL observation log with daily file rotation.
///
/// Files are partitioned by the civil date in the configured timezone.
pub struct JsonlSink {
    dir: PathBuf,
    data_source: String,
    tz: Tz,
}

impl JsonlSink {
    /// Create the sink, creating `{data_dir}/observations` if needed.
    pub async fn new(config: &PersistenceConfig) -> Result<Self> {
        let dir = Path::new(&config.data_dir).join("observations");
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create observations directory")?;

        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone: {e}"))?;

        Ok(Self {
            dir,
            data_source: config.data_source_label.clone(),
            tz,
        })
    }

    /// Load every row stored for one civil date (`YYYY-MM-DD`).
    pub async fn load_day(&self, date: &str) -> Result<Vec<ObservationRow>> {
        let path = self.dir.join(format!("{date}.jsonl"));
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path).await?;
        let mut rows = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ObservationRow>(line) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::warn!(
                        file = %path.display(),
                        error = %e,
                        "Skipping malformed observation row"
                    );
                }
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl ObservationSink for JsonlSink {
    #[instrument(skip(self, observation), fields(ts = %observation.timestamp))]
    async fn record(&self, observation: &Observation) -> Result<()> {
        let date = observation
            .timestamp
            .with_timezone(&self.tz)
            .format("%Y-%m-%d")
            .to_string();
        let path = self.dir.join(format!("{date}.jsonl"));

        let row = ObservationRow::from_observation(observation, &self.data_source, self.tz);
        let mut json = serde_json::to_string(&row)
            .context("Failed to serialize observation row")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open observation log file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write observation row")?;

        file.flush().await.context("Failed to flush observation log")?;

        Ok(())
    }

    /// Check if the observations directory is writable.
    async fn is_healthy(&self) -> bool {
        let test_path = self.dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}
