//! Document backend trait.
//!
//! A backend only knows how to load and save the whole [`Dataset`]; table
//! addressing lives in [`crate::Repository`].

use async_trait::async_trait;
use wifinet_core::{Dataset, WifinetResult};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the full document.
    async fn load(&self) -> WifinetResult<Dataset>;

    /// Replace the full document.
    async fn save(&self, dataset: &Dataset) -> WifinetResult<()>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
