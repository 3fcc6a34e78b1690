//! Table-addressed access to the data document.
//!
//! Reads are served from a cached snapshot. Writes run a full
//! read-modify-write cycle against the backend under a process-wide async
//! lock, then replace the snapshot. The snapshot is also replaced wholesale
//! by [`Repository::refresh`], which the server calls on a timer and which
//! takes the same lock.

use crate::backend::DocumentStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use wifinet_core::{
    AdminProfile, Dataset, PaymentGatewayConfig, Record, WifinetError, WifinetResult,
};

pub struct Repository {
    backend: Arc<dyn DocumentStore>,
    write_lock: Mutex<()>,
    snapshot: RwLock<Arc<Dataset>>,
}

impl Repository {
    /// Load the document once and wrap the backend.
    pub async fn open(backend: Arc<dyn DocumentStore>) -> WifinetResult<Self> {
        let dataset = backend.load().await?;
        info!(
            backend = backend.name(),
            customers = dataset.customers.len(),
            bills = dataset.bills.len(),
            "Repository opened"
        );
        Ok(Self {
            backend,
            write_lock: Mutex::new(()),
            snapshot: RwLock::new(Arc::new(dataset)),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Last known document.
    pub fn snapshot(&self) -> Arc<Dataset> {
        self.snapshot.read().clone()
    }

    /// Reload the document from the backend, overwriting the snapshot.
    ///
    /// Holds the write lock so a load that started before a write can never
    /// publish over that write's result.
    pub async fn refresh(&self) -> WifinetResult<Arc<Dataset>> {
        let _guard = self.write_lock.lock().await;
        let dataset = Arc::new(self.backend.load().await?);
        *self.snapshot.write() = dataset.clone();
        debug!(backend = self.backend.name(), "Snapshot refreshed");
        Ok(dataset)
    }

    /// Run `f` against a freshly loaded document and persist the result.
    ///
    /// Nothing is saved when `f` returns an error.
    pub async fn transact<T, F>(&self, f: F) -> WifinetResult<T>
    where
        F: FnOnce(&mut Dataset) -> WifinetResult<T>,
    {
        let _guard = self.write_lock.lock().await;
        let mut dataset = self.backend.load().await?;
        let out = f(&mut dataset)?;
        self.backend.save(&dataset).await?;
        *self.snapshot.write() = Arc::new(dataset);
        Ok(out)
    }

    // ─── Reads ─────────────────────────────────────────────────────────────

    pub fn get<R: Record>(&self) -> Vec<R> {
        R::rows(&self.snapshot()).clone()
    }

    pub fn find<R: Record>(&self, id: &str) -> Option<R> {
        self.snapshot().find::<R>(id).cloned()
    }

    pub fn admin_profile(&self) -> AdminProfile {
        self.snapshot().admin_profile.clone()
    }

    pub fn gateway_config(&self) -> PaymentGatewayConfig {
        self.snapshot().gateway_config.clone()
    }

    // ─── Writes ────────────────────────────────────────────────────────────

    /// Append a record. Ids are not checked for uniqueness.
    pub async fn insert<R: Record>(&self, record: R) -> WifinetResult<R> {
        self.transact(|ds| {
            R::rows_mut(ds).push(record.clone());
            Ok(record)
        })
        .await
    }

    /// Replace the record with the same id, or append it.
    pub async fn upsert<R: Record>(&self, record: R) -> WifinetResult<R> {
        self.transact(|ds| {
            let rows = R::rows_mut(ds);
            match rows.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => *existing = record.clone(),
                None => rows.push(record.clone()),
            }
            Ok(record)
        })
        .await
    }

    /// Shallow-merge `patch` into the record with `id`.
    pub async fn update<R: Record>(&self, id: &str, patch: Value) -> WifinetResult<R> {
        self.transact(|ds| {
            let row = R::rows_mut(ds)
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| WifinetError::not_found(R::TABLE.as_str(), id))?;
            let merged = merge_patch(row, &patch)?;
            *row = merged.clone();
            Ok(merged)
        })
        .await
    }

    /// Apply the same patch to every listed record that exists.
    /// Returns how many records were touched.
    pub async fn update_many<R: Record>(&self, ids: &[String], patch: Value) -> WifinetResult<usize> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.transact(|ds| {
            let mut touched = 0;
            for row in R::rows_mut(ds).iter_mut() {
                if wanted.contains(row.id()) {
                    *row = merge_patch(row, &patch)?;
                    touched += 1;
                }
            }
            Ok(touched)
        })
        .await
    }

    /// Remove by id. Returns whether a record was removed.
    pub async fn remove<R: Record>(&self, id: &str) -> WifinetResult<bool> {
        self.transact(|ds| {
            let rows = R::rows_mut(ds);
            let before = rows.len();
            rows.retain(|r| r.id() != id);
            Ok(rows.len() != before)
        })
        .await
    }

    /// Remove every listed id. Returns how many records were removed.
    pub async fn bulk_remove<R: Record>(&self, ids: &[String]) -> WifinetResult<usize> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.transact(|ds| {
            let rows = R::rows_mut(ds);
            let before = rows.len();
            rows.retain(|r| !wanted.contains(r.id()));
            Ok(before - rows.len())
        })
        .await
    }

    pub async fn set_admin_profile(&self, profile: AdminProfile) -> WifinetResult<AdminProfile> {
        self.transact(|ds| {
            ds.admin_profile = profile.clone();
            Ok(profile)
        })
        .await
    }

    pub async fn set_gateway_config(
        &self,
        config: PaymentGatewayConfig,
    ) -> WifinetResult<PaymentGatewayConfig> {
        self.transact(|ds| {
            ds.gateway_config = config.clone();
            Ok(config)
        })
        .await
    }
}

/// Overlay the top-level keys of `patch` onto `record`. The id is kept.
pub fn merge_patch<R: Record>(record: &R, patch: &Value) -> WifinetResult<R> {
    let Value::Object(changes) = patch else {
        return Err(WifinetError::Validation("update patch must be a JSON object".into()));
    };
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        for (key, change) in changes {
            if key == "id" {
                continue;
            }
            fields.insert(key.clone(), change.clone());
        }
    }
    serde_json::from_value(value).map_err(|e| WifinetError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use wifinet_core::{Bill, Customer, CustomerStatus, Package};

    async fn repo() -> Repository {
        Repository::open(Arc::new(MemoryStore::default())).await.unwrap()
    }

    #[tokio::test]
    async fn test_update_is_shallow_merge() {
        let repo = repo().await;
        let updated: Customer = repo
            .update("CUST002", json!({ "status": "Active", "id": "HIJACK" }))
            .await
            .unwrap();
        assert_eq!(updated.id, "CUST002");
        assert_eq!(updated.status, CustomerStatus::Active);
        assert_eq!(updated.name, "Siti Aminah");
        assert_eq!(repo.find::<Customer>("CUST002").unwrap().status, CustomerStatus::Active);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let repo = repo().await;
        let err = repo
            .update::<Package>("nope", json!({ "price": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, WifinetError::NotFound { table: "packages", .. }));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_field_type() {
        let repo = repo().await;
        let err = repo
            .update::<Package>("PKG001", json!({ "price": "free" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WifinetError::Validation(_)));
        assert_eq!(repo.find::<Package>("PKG001").unwrap().price, 150_000);
    }

    #[tokio::test]
    async fn test_bulk_remove_and_upsert() {
        let repo = repo().await;
        let removed = repo
            .bulk_remove::<Bill>(&["BILL001".into(), "BILL003".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(repo.get::<Bill>().len(), 1);

        let mut pkg = repo.find::<Package>("PKG003").unwrap();
        pkg.price = 450_000;
        repo.upsert(pkg).await.unwrap();
        assert_eq!(repo.find::<Package>("PKG003").unwrap().price, 450_000);
        assert_eq!(repo.get::<Package>().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_transaction_does_not_save() {
        let repo = repo().await;
        let result: WifinetResult<()> = repo
            .transact(|ds| {
                ds.customers.clear();
                Err(WifinetError::Validation("abort".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(repo.refresh().await.unwrap().customers.len(), 3);
    }

    /// Returns the document as of the call, then stalls once.
    struct StallingStore {
        inner: MemoryStore,
        stall_next: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for StallingStore {
        async fn load(&self) -> WifinetResult<Dataset> {
            let dataset = self.inner.load().await?;
            if self.stall_next.swap(false, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(dataset)
        }

        async fn save(&self, dataset: &Dataset) -> WifinetResult<()> {
            self.inner.save(dataset).await
        }

        fn name(&self) -> &'static str {
            "stalling"
        }
    }

    #[tokio::test]
    async fn test_refresh_never_publishes_over_a_newer_write() {
        let store = Arc::new(StallingStore {
            inner: MemoryStore::default(),
            stall_next: AtomicBool::new(false),
        });
        let repo = Repository::open(store.clone()).await.unwrap();
        store.stall_next.store(true, Ordering::SeqCst);

        let (refreshed, written) = tokio::join!(repo.refresh(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            repo.remove::<Customer>("CUST003").await
        });
        refreshed.unwrap();
        assert!(written.unwrap());

        assert_eq!(repo.snapshot().customers.len(), 2);
        assert!(repo.find::<Customer>("CUST003").is_none());
    }

    #[tokio::test]
    async fn test_update_many_counts_existing() {
        let repo = repo().await;
        let touched = repo
            .update_many::<Customer>(
                &["CUST001".into(), "CUST003".into(), "GHOST".into()],
                json!({ "status": "Suspended" }),
            )
            .await
            .unwrap();
        assert_eq!(touched, 2);
        assert!(repo
            .get::<Customer>()
            .iter()
            .all(|c| c.status == CustomerStatus::Suspended));
    }
}
