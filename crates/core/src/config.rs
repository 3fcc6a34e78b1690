use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `WIFINET__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Which document backend holds the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    File,
    Memory,
    Remote,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "remote" => Ok(Self::Remote),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
    /// Artificial delay applied to every document load.
    #[serde(default)]
    pub simulated_latency_ms: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_due_day")]
    pub due_day: u32,
    #[serde(default = "default_late_penalty")]
    pub late_penalty: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    #[serde(default = "default_admin_password")]
    pub default_admin_password: String,
    #[serde(default = "default_collector_password")]
    pub default_collector_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    /// Probability in `[0, 1]` that a simulated router call succeeds.
    #[serde(default = "default_success_rate")]
    pub success_rate: f64,
    #[serde(default = "default_provisioning_latency_ms")]
    pub latency_ms: u64,
    /// How long a sync status badge stays visible before it is cleared.
    #[serde(default = "default_status_clear_secs")]
    pub status_clear_secs: u64,
}

// Default functions
fn default_node_id() -> String {
    "wifinet-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_store_backend() -> StoreBackend {
    StoreBackend::File
}
fn default_store_path() -> String {
    "data/wifinet_db_v1.json".to_string()
}
fn default_remote_timeout_ms() -> u64 {
    1000
}
fn default_refresh_interval_secs() -> u64 {
    30
}
fn default_due_day() -> u32 {
    10
}
fn default_late_penalty() -> i64 {
    10_000
}
fn default_session_ttl_hours() -> i64 {
    24
}
fn default_admin_password() -> String {
    "admin123".to_string()
}
fn default_collector_password() -> String {
    "123456".to_string()
}
fn default_success_rate() -> f64 {
    0.7
}
fn default_provisioning_latency_ms() -> u64 {
    1500
}
fn default_status_clear_secs() -> u64 {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
            remote_url: None,
            remote_timeout_ms: default_remote_timeout_ms(),
            simulated_latency_ms: 0,
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            due_day: default_due_day(),
            late_penalty: default_late_penalty(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            default_admin_password: default_admin_password(),
            default_collector_password: default_collector_password(),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            success_rate: default_success_rate(),
            latency_ms: default_provisioning_latency_ms(),
            status_clear_secs: default_status_clear_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            store: StoreConfig::default(),
            billing: BillingConfig::default(),
            auth: AuthConfig::default(),
            provisioning: ProvisioningConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("WIFINET")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Reject settings the billing engine cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=28).contains(&self.billing.due_day) {
            return Err(format!(
                "billing.due_day must be within 1..=28, got {}",
                self.billing.due_day
            ));
        }
        if self.billing.late_penalty < 0 {
            return Err("billing.late_penalty must not be negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.provisioning.success_rate) {
            return Err("provisioning.success_rate must be within [0, 1]".to_string());
        }
        if self.store.backend == StoreBackend::Remote && self.store.remote_url.is_none() {
            return Err("store.remote_url is required for the remote backend".to_string());
        }
        Ok(())
    }
}
