//! Remote document endpoint with a static fallback.
//!
//! Loads issue `GET <url>?action=init` with a hard timeout. Any failure
//! (connect error, timeout, non-2xx, bad body) yields the built-in dataset.
//! Saves are logged only; the endpoint has no write contract.

use crate::backend::DocumentStore;
use crate::seed;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use wifinet_core::{Dataset, WifinetError, WifinetResult};

pub struct RemoteStore {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl RemoteStore {
    pub fn new(url: impl Into<String>, timeout: Duration) -> WifinetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WifinetError::Store(format!("failed to build HTTP client: {e}")))?;
        let url = url.into();
        info!(url = %url, timeout_ms = timeout.as_millis() as u64, "Remote document store configured");
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    async fn fetch(&self) -> Result<Dataset, reqwest::Error> {
        self.client
            .get(&self.url)
            .query(&[("action", "init")])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<Dataset>()
            .await
    }
}

#[async_trait]
impl DocumentStore for RemoteStore {
    async fn load(&self) -> WifinetResult<Dataset> {
        match self.fetch().await {
            Ok(dataset) => {
                metrics::counter!("store.remote.fetch_ok").increment(1);
                debug!(url = %self.url, "Remote document fetched");
                Ok(dataset)
            }
            Err(e) => {
                metrics::counter!("store.remote.fallback").increment(1);
                warn!(url = %self.url, error = %e, "Remote fetch failed, serving mock dataset");
                Ok(seed::default_dataset())
            }
        }
    }

    async fn save(&self, dataset: &Dataset) -> WifinetResult<()> {
        info!(
            url = %self.url,
            customers = dataset.customers.len(),
            bills = dataset.bills.len(),
            "Remote write not transmitted"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    #[tokio::test]
    async fn test_fetches_remote_document() {
        let router = Router::new().route(
            "/api",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("action").map(String::as_str), Some("init"));
                let mut ds = seed::default_dataset();
                ds.customers.truncate(1);
                Json(ds)
            }),
        );
        let url = serve(router).await;

        let store = RemoteStore::new(url, Duration::from_secs(1)).unwrap();
        let dataset = store.load().await.unwrap();
        assert_eq!(dataset.customers.len(), 1);
    }

    #[tokio::test]
    async fn test_slow_endpoint_falls_back() {
        let router = Router::new().route(
            "/api",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(Dataset::default())
            }),
        );
        let url = serve(router).await;

        let store = RemoteStore::new(url, Duration::from_millis(100)).unwrap();
        let dataset = store.load().await.unwrap();
        assert_eq!(dataset, seed::default_dataset());
    }

    #[tokio::test]
    async fn test_error_status_falls_back() {
        let router = Router::new().route(
            "/api",
            get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let url = serve(router).await;

        let store = RemoteStore::new(url, Duration::from_secs(1)).unwrap();
        let dataset = store.load().await.unwrap();
        assert_eq!(dataset.packages.len(), 3);
    }
}
