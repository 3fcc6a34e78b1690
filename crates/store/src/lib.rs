//! Persistence for the WiFiNet data document.
//!
//! The dataset is always read and written as one JSON document. Backends:
//! a local file, process memory, or a remote endpoint that falls back to the
//! built-in dataset.

#![warn(clippy::unwrap_used)]

pub mod backend;
pub mod file;
pub mod memory;
pub mod remote;
pub mod repository;
pub mod seed;

pub use backend::DocumentStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use repository::Repository;

use std::sync::Arc;
use std::time::Duration;
use wifinet_core::config::{StoreBackend, StoreConfig};
use wifinet_core::{WifinetError, WifinetResult};

/// Build the backend selected by configuration.
pub fn build_store(config: &StoreConfig) -> WifinetResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::File => Arc::new(
            FileStore::new(&config.path)
                .with_latency(Duration::from_millis(config.simulated_latency_ms)),
        ),
        StoreBackend::Memory => Arc::new(MemoryStore::default()),
        StoreBackend::Remote => {
            let url = config.remote_url.clone().ok_or_else(|| {
                WifinetError::Config("store.remote_url is required for the remote backend".into())
            })?;
            Arc::new(RemoteStore::new(
                url,
                Duration::from_millis(config.remote_timeout_ms),
            )?)
        }
    };
    Ok(store)
}
