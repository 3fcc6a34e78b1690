//! Request and response bodies for the management API.
//!
//! Update requests serialize only the fields that were sent, so they can be
//! applied to a stored record as a shallow JSON patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wifinet_billing::provisioning::SyncStatus;
use wifinet_core::{
    Bill, Collector, CollectorStatus, Customer, CustomerStatus, GatewayProvider, Package,
    PaymentAccount, PaymentType, Rupiah,
};

// ─── Auth ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Collector,
    Customer,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub subject_id: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
    /// Bills created by automatic billing on this login, admin only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_bills: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

// ─── Customers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub package_id: String,
    #[serde(default = "default_customer_status")]
    pub status: CustomerStatus,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_customer_status() -> CustomerStatus {
    CustomerStatus::Active
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<String>,
    pub status: CustomerStatus,
}

/// Customer as shown to clients; the password never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,
    pub has_password: bool,
}

impl From<Customer> for CustomerView {
    fn from(mut customer: Customer) -> Self {
        let has_password = customer.password.take().is_some();
        Self {
            customer,
            has_password,
        }
    }
}

// ─── Packages ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackageRequest {
    pub name: String,
    pub speed: String,
    pub price: Rupiah,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePackageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Rupiah>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ─── Bills ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillListParams {
    pub month: Option<String>,
    pub year: Option<i32>,
    #[serde(default)]
    pub filter: wifinet_billing::BillFilter,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateBillsRequest {
    pub month: String,
    pub year: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidRequest {
    #[serde(default)]
    pub penalty_amount: Option<Rupiah>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkIdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignCollectorRequest {
    pub ids: Vec<String>,
    pub collector_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBillsResponse {
    pub period: String,
    pub count: usize,
    pub bills: Vec<Bill>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyResponse {
    pub bill_id: String,
    pub suggested_penalty: Rupiah,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderResponse {
    pub message: String,
    pub link: String,
}

// ─── Collectors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCollectorRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_collector_status")]
    pub status: CollectorStatus,
}

fn default_collector_status() -> CollectorStatus {
    CollectorStatus::Active
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCollectorRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectorStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorView {
    #[serde(flatten)]
    pub collector: Collector,
    pub has_password: bool,
}

impl From<Collector> for CollectorView {
    fn from(mut collector: Collector) -> Self {
        let has_password = collector.password.take().is_some();
        Self {
            collector,
            has_password,
        }
    }
}

/// Collector editing their own profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorProfileRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

// ─── Routers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRouterRequest {
    pub name: String,
    pub host: String,
    #[serde(default = "default_router_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_router_port() -> u16 {
    8728
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRouterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub customer_id: String,
    #[serde(flatten)]
    pub status: SyncStatus,
}

// ─── Payment settings ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentAccountRequest {
    #[serde(rename = "type")]
    pub kind: PaymentType,
    pub provider_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentAccountRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,
}

/// What a customer needs to pay: transfer targets and the public part of
/// the gateway settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOptions {
    pub accounts: Vec<PaymentAccount>,
    pub gateway_provider: GatewayProvider,
    pub gateway_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    pub is_sandbox: bool,
}

// ─── Admin profile ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_billing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_day: Option<u32>,
}

// ─── Customer portal ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalOverview {
    pub customer: CustomerView,
    pub package: Option<Package>,
    pub unpaid_total: Rupiah,
    pub open_bills: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPaymentRequest {
    /// Payment account the customer transferred to.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Free-form method label, used when no account is given.
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: Option<String>,
    pub new_password: String,
    pub confirm_password: String,
}
