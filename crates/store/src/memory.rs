//! Process-local document, used by tests and the `memory` backend.

use crate::backend::DocumentStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use wifinet_core::{Dataset, WifinetResult};

pub struct MemoryStore {
    document: RwLock<Dataset>,
}

impl MemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            document: RwLock::new(dataset),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(crate::seed::default_dataset())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self) -> WifinetResult<Dataset> {
        Ok(self.document.read().clone())
    }

    async fn save(&self, dataset: &Dataset) -> WifinetResult<()> {
        *self.document.write() = dataset.clone();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
