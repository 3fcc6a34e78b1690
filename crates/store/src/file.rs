//! Single-file JSON document store.
//!
//! The whole dataset lives in one JSON file. Every load reads the file and
//! every save rewrites it; there is no journaling, so a crash mid-write can
//! leave the document truncated. A truncated or otherwise unreadable file is
//! treated like an empty store and yields the default dataset.

use crate::backend::DocumentStore;
use crate::seed;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};
use wifinet_core::{Dataset, WifinetResult};

pub struct FileStore {
    path: PathBuf,
    latency: Duration,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            latency: Duration::ZERO,
        }
    }

    /// Delay every load by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, dataset: &Dataset) -> WifinetResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(dataset)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self) -> WifinetResult<Dataset> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No data document found, seeding defaults");
                let dataset = seed::default_dataset();
                self.write(&dataset).await?;
                return Ok(dataset);
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read data document");
                return Ok(seed::default_dataset());
            }
        };

        match serde_json::from_slice::<Dataset>(&bytes) {
            Ok(dataset) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "Data document loaded");
                Ok(dataset)
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Data document is corrupt, using defaults");
                metrics::counter!("store.file.corrupt").increment(1);
                Ok(seed::default_dataset())
            }
        }
    }

    async fn save(&self, dataset: &Dataset) -> WifinetResult<()> {
        self.write(dataset).await?;
        debug!(path = %self.path.display(), "Data document saved");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
