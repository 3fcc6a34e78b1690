//! RouterOS user provisioning.
//!
//! The device protocol is behind [`RouterGateway`]. [`SimulatedGateway`]
//! stands in for a real RouterOS API client and fails a configurable share
//! of calls; tests use [`StaticGateway`].

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use wifinet_core::config::ProvisioningConfig;
use wifinet_core::{ids, MikrotikUser, Router, RouterStatus, WifinetError, WifinetResult};
use wifinet_store::Repository;

#[async_trait]
pub trait RouterGateway: Send + Sync {
    async fn test_connection(&self, router: &Router) -> WifinetResult<()>;

    async fn sync_user(&self, router: &Router, user: &MikrotikUser) -> WifinetResult<()>;

    fn name(&self) -> &'static str;
}

/// Placeholder for a RouterOS client: waits `latency`, then succeeds with
/// probability `success_rate`.
pub struct SimulatedGateway {
    success_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(success_rate: f64, latency: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self::new(config.success_rate, Duration::from_millis(config.latency_ms))
    }

    async fn roll(&self) -> WifinetResult<()> {
        tokio::time::sleep(self.latency).await;
        let ok = rand::thread_rng().gen_bool(self.success_rate);
        if ok {
            Ok(())
        } else {
            Err(WifinetError::Provisioning("Connection Timeout".into()))
        }
    }
}

#[async_trait]
impl RouterGateway for SimulatedGateway {
    async fn test_connection(&self, _router: &Router) -> WifinetResult<()> {
        self.roll().await
    }

    async fn sync_user(&self, _router: &Router, _user: &MikrotikUser) -> WifinetResult<()> {
        self.roll().await
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

/// Always answers the same way.
pub struct StaticGateway {
    succeed: bool,
}

impl StaticGateway {
    pub fn succeeding() -> Self {
        Self { succeed: true }
    }

    pub fn failing() -> Self {
        Self { succeed: false }
    }

    fn answer(&self) -> WifinetResult<()> {
        if self.succeed {
            Ok(())
        } else {
            Err(WifinetError::Provisioning("Connection refused".into()))
        }
    }
}

#[async_trait]
impl RouterGateway for StaticGateway {
    async fn test_connection(&self, _router: &Router) -> WifinetResult<()> {
        self.answer()
    }

    async fn sync_user(&self, _router: &Router, _user: &MikrotikUser) -> WifinetResult<()> {
        self.answer()
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

// ─── Sync status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub state: SyncState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    updated: Instant,
}

/// Per-customer sync outcome. Finished entries disappear after `ttl`;
/// in-flight ones stay until they finish.
pub struct SyncStatusBoard {
    entries: DashMap<String, SyncStatus>,
    ttl: Duration,
}

impl SyncStatusBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn set(&self, customer_id: &str, state: SyncState, message: Option<&str>) {
        self.entries.insert(
            customer_id.to_string(),
            SyncStatus {
                state,
                message: message.map(str::to_string),
                updated: Instant::now(),
            },
        );
    }

    fn expired(&self, status: &SyncStatus) -> bool {
        status.state != SyncState::Loading && status.updated.elapsed() >= self.ttl
    }

    pub fn get(&self, customer_id: &str) -> Option<SyncStatus> {
        self.entries.remove_if(customer_id, |_, s| self.expired(s));
        self.entries.get(customer_id).map(|s| s.clone())
    }

    /// Live entries keyed by customer id.
    pub fn all(&self) -> Vec<(String, SyncStatus)> {
        self.entries.retain(|_, s| !self.expired(s));
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

// ─── Service ───────────────────────────────────────────────────────────────

pub struct ProvisioningService {
    repo: Arc<Repository>,
    gateway: Arc<dyn RouterGateway>,
    board: SyncStatusBoard,
}

impl ProvisioningService {
    pub fn new(repo: Arc<Repository>, gateway: Arc<dyn RouterGateway>, status_ttl: Duration) -> Self {
        info!(gateway = gateway.name(), "Provisioning service ready");
        Self {
            repo,
            gateway,
            board: SyncStatusBoard::new(status_ttl),
        }
    }

    pub fn board(&self) -> &SyncStatusBoard {
        &self.board
    }

    fn router(&self, router_id: &str) -> WifinetResult<Router> {
        self.repo
            .find::<Router>(router_id)
            .ok_or_else(|| WifinetError::not_found("routers", router_id))
    }

    async fn set_router_status(&self, router_id: &str, status: RouterStatus) -> WifinetResult<Router> {
        self.repo
            .update::<Router>(router_id, serde_json::json!({ "status": status }))
            .await
    }

    /// Probe a router and record Online or Offline.
    pub async fn test_router(&self, router_id: &str) -> WifinetResult<Router> {
        let router = self.router(router_id)?;
        self.set_router_status(router_id, RouterStatus::Testing).await?;

        let status = match self.gateway.test_connection(&router).await {
            Ok(()) => RouterStatus::Online,
            Err(e) => {
                warn!(router_id, host = %router.host, error = %e, "Router connection test failed");
                RouterStatus::Offline
            }
        };
        info!(router_id, ?status, "Router tested");
        self.set_router_status(router_id, status).await
    }

    /// Push a customer's account to a router.
    ///
    /// On success the MikrotikUser for this customer and router is created,
    /// or refreshed if one exists. On failure nothing is written and the
    /// status board shows the error until it expires.
    pub async fn sync_user(&self, customer_id: &str, router_id: &str) -> WifinetResult<MikrotikUser> {
        let dataset = self.repo.snapshot();
        let customer = dataset
            .customer(customer_id)
            .ok_or_else(|| WifinetError::not_found("customers", customer_id))?;
        let router = self.router(router_id)?;

        let existing = dataset
            .mikrotik_users
            .iter()
            .find(|u| u.customer_id == customer.id && u.router_id == router.id);
        let user = MikrotikUser {
            id: existing.map_or_else(ids::record_id, |u| u.id.clone()),
            customer_id: customer.id.clone(),
            router_id: router.id.clone(),
            username: customer.id.clone(),
            profile: dataset
                .package(&customer.package_id)
                .map_or_else(|| "default".to_string(), |p| p.name.clone()),
            enabled: customer.is_active(),
            last_synced: Utc::now(),
        };

        self.board.set(customer_id, SyncState::Loading, None);
        if let Err(e) = self.gateway.sync_user(&router, &user).await {
            metrics::counter!("provisioning.sync_failed").increment(1);
            warn!(customer_id, router_id, error = %e, "User sync failed");
            self.board.set(customer_id, SyncState::Error, Some("Failed"));
            return Err(e);
        }

        let user = match self.repo.upsert(user).await {
            Ok(user) => user,
            Err(e) => {
                self.board.set(customer_id, SyncState::Error, Some("Failed"));
                return Err(e);
            }
        };
        metrics::counter!("provisioning.sync_ok").increment(1);
        info!(customer_id, router_id, username = %user.username, "User synced");
        self.board.set(customer_id, SyncState::Success, Some("Synced"));
        Ok(user)
    }

    pub async fn remove_user(&self, user_id: &str) -> WifinetResult<()> {
        if self.repo.remove::<MikrotikUser>(user_id).await? {
            info!(user_id, "Router user removed");
            Ok(())
        } else {
            Err(WifinetError::not_found("mikrotikUsers", user_id))
        }
    }
}
