//! Domain records held in the WiFiNet data document.
//!
//! Field names serialize as camelCase so a document written by one backend
//! can be read by any other, including the remote `?action=init` endpoint.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WifinetError, WifinetResult};

/// Whole Indonesian Rupiah.
pub type Rupiah = i64;

/// Format used for `createdAt` and `paidAt` stamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Keep only ASCII digits, used to compare phone numbers typed in any format.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

// ─── Tables ────────────────────────────────────────────────────────────────

/// A named collection inside the data document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Customers,
    Packages,
    Bills,
    Collectors,
    Routers,
    MikrotikUsers,
    PaymentAccounts,
}

impl Table {
    pub const ALL: [Table; 7] = [
        Table::Customers,
        Table::Packages,
        Table::Bills,
        Table::Collectors,
        Table::Routers,
        Table::MikrotikUsers,
        Table::PaymentAccounts,
    ];

    /// Key under which the table is stored in the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Packages => "packages",
            Table::Bills => "bills",
            Table::Collectors => "collectors",
            Table::Routers => "routers",
            Table::MikrotikUsers => "mikrotikUsers",
            Table::PaymentAccounts => "paymentAccounts",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Table {
    type Err = WifinetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| WifinetError::Validation(format!("unknown table '{s}'")))
    }
}

/// A record addressable by id inside one table of the [`Dataset`].
pub trait Record: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> &str;
    fn rows(dataset: &Dataset) -> &Vec<Self>;
    fn rows_mut(dataset: &mut Dataset) -> &mut Vec<Self>;
}

macro_rules! impl_record {
    ($ty:ty, $table:expr, $field:ident) => {
        impl Record for $ty {
            const TABLE: Table = $table;

            fn id(&self) -> &str {
                &self.id
            }

            fn rows(dataset: &Dataset) -> &Vec<Self> {
                &dataset.$field
            }

            fn rows_mut(dataset: &mut Dataset) -> &mut Vec<Self> {
                &mut dataset.$field
            }
        }
    };
}

// ─── Catalog ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    pub speed: String,
    pub price: Rupiah,
    #[serde(default)]
    pub description: String,
}

// ─── Subscribers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub package_id: String,
    pub status: CustomerStatus,
    #[serde(with = "local_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }
}

// ─── Bills ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillStatus {
    Unpaid,
    Pending,
    Paid,
}

impl BillStatus {
    /// Whether a single-bill transition from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Unpaid, BillStatus::Pending)
                | (BillStatus::Unpaid, BillStatus::Paid)
                | (BillStatus::Pending, BillStatus::Paid)
                | (BillStatus::Pending, BillStatus::Unpaid)
        )
    }
}

/// A calendar month that bills are issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub fn new(month: u32, year: i32) -> WifinetResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(WifinetError::Validation(format!(
                "month must be within 1..=12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Parse the unpadded month string used in persisted bills.
    pub fn parse(month: &str, year: i32) -> WifinetResult<Self> {
        let month = month
            .trim()
            .parse::<u32>()
            .map_err(|_| WifinetError::Validation(format!("invalid month '{month}'")))?;
        Self::new(month, year)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month as stored on a bill: `"1"` through `"12"`, never zero padded.
    pub fn month_key(&self) -> String {
        self.month.to_string()
    }

    /// Due date for bills of this period, on `day` of the month.
    pub fn due_date(&self, day: u32) -> WifinetResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day).ok_or_else(|| {
            WifinetError::Validation(format!("day {day} does not exist in {self}"))
        })
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: String,
    pub customer_id: String,
    pub month: String,
    pub year: i32,
    /// Package price at generation time. Never recomputed.
    pub amount: Rupiah,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty_amount: Option<Rupiah>,
    pub status: BillStatus,
    pub due_date: NaiveDate,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "local_timestamp::option"
    )]
    pub paid_at: Option<NaiveDateTime>,
    /// Empty until a payment is claimed or confirmed.
    #[serde(default)]
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_id: Option<String>,
}

impl Bill {
    pub fn penalty(&self) -> Rupiah {
        self.penalty_amount.unwrap_or(0)
    }

    /// Amount plus any recorded penalty.
    pub fn total_payable(&self) -> Rupiah {
        self.amount + self.penalty()
    }

    pub fn is_for(&self, customer_id: &str, period: BillingPeriod) -> bool {
        self.customer_id == customer_id
            && self.year == period.year
            && self.month == period.month_key()
    }

    pub fn in_period(&self, period: BillingPeriod) -> bool {
        self.year == period.year && self.month == period.month_key()
    }

    /// Unpaid and past its due date. Pending bills are never overdue.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == BillStatus::Unpaid && self.due_date < today
    }

    pub fn month_number(&self) -> Option<u32> {
        self.month.parse().ok()
    }
}

// ─── Collectors ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectorStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collector {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub status: CollectorStatus,
    pub joined_at: NaiveDate,
}

// ─── Network ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouterStatus {
    Online,
    Offline,
    Testing,
}

/// A RouterOS device subscribers are provisioned on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    pub id: String,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub status: RouterStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MikrotikUser {
    pub id: String,
    pub customer_id: String,
    pub router_id: String,
    pub username: String,
    pub profile: String,
    pub enabled: bool,
    pub last_synced: DateTime<Utc>,
}

// ─── Payment settings ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    #[serde(rename = "BANK")]
    Bank,
    #[serde(rename = "E-WALLET")]
    EWallet,
    #[serde(rename = "QRIS")]
    Qris,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Bank => "BANK",
            PaymentType::EWallet => "E-WALLET",
            PaymentType::Qris => "QRIS",
        }
    }
}

/// A manual transfer target shown to customers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAccount {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PaymentType,
    pub provider_name: String,
    pub account_number: String,
    pub account_holder: String,
}

impl PaymentAccount {
    /// Payment method label recorded on a bill paid through this account.
    pub fn method_label(&self) -> String {
        format!("{} - {}", self.kind.as_str(), self.provider_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GatewayProvider {
    Manual,
    Midtrans,
    Xendit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGatewayConfig {
    pub provider: GatewayProvider,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_key: Option<String>,
    pub is_sandbox: bool,
}

impl Default for PaymentGatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::Manual,
            is_active: false,
            merchant_id: None,
            client_key: None,
            server_key: None,
            is_sandbox: true,
        }
    }
}

// ─── Admin ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub name: String,
    pub business_name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_billing_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_day: Option<u32>,
}

impl AdminProfile {
    pub fn auto_billing(&self) -> bool {
        self.auto_billing_enabled.unwrap_or(false)
    }

    /// Day of month from which automatic generation may run.
    pub fn billing_day(&self) -> u32 {
        self.billing_day.unwrap_or(1)
    }
}

impl Default for AdminProfile {
    fn default() -> Self {
        Self {
            name: "Super Admin".to_string(),
            business_name: "WIFINET".to_string(),
            username: "admin".to_string(),
            password: Some("admin123".to_string()),
            auto_billing_enabled: Some(true),
            billing_day: Some(1),
        }
    }
}

// ─── Document ──────────────────────────────────────────────────────────────

/// The whole persisted document: one array per table plus two singletons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub admin_profile: AdminProfile,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub collectors: Vec<Collector>,
    #[serde(default)]
    pub routers: Vec<Router>,
    #[serde(default)]
    pub mikrotik_users: Vec<MikrotikUser>,
    #[serde(default)]
    pub payment_accounts: Vec<PaymentAccount>,
    #[serde(default)]
    pub gateway_config: PaymentGatewayConfig,
}

impl_record!(Customer, Table::Customers, customers);
impl_record!(Package, Table::Packages, packages);
impl_record!(Bill, Table::Bills, bills);
impl_record!(Collector, Table::Collectors, collectors);
impl_record!(Router, Table::Routers, routers);
impl_record!(MikrotikUser, Table::MikrotikUsers, mikrotik_users);
impl_record!(PaymentAccount, Table::PaymentAccounts, payment_accounts);

impl Dataset {
    pub fn find<R: Record>(&self, id: &str) -> Option<&R> {
        R::rows(self).iter().find(|r| r.id() == id)
    }

    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.find::<Customer>(id)
    }

    pub fn package(&self, id: &str) -> Option<&Package> {
        self.find::<Package>(id)
    }

    pub fn bill(&self, id: &str) -> Option<&Bill> {
        self.find::<Bill>(id)
    }

    pub fn collector(&self, id: &str) -> Option<&Collector> {
        self.find::<Collector>(id)
    }

    /// Current price of the customer's package, 0 when the package is gone.
    pub fn package_price_for(&self, customer: &Customer) -> Rupiah {
        self.package(&customer.package_id)
            .map(|p| p.price)
            .unwrap_or(0)
    }
}

// ─── Serde helpers ─────────────────────────────────────────────────────────

/// `YYYY-MM-DD HH:MM:SS` local timestamps.
pub mod local_timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Accepts the stored format as well as ISO `T`-separated stamps.
    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, super::TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            match raw.as_deref() {
                None | Some("") => Ok(None),
                Some(s) => super::parse(s).map(Some).map_err(serde::de::Error::custom),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bill_document_shape() {
        let raw = json!({
            "id": "BILL001",
            "customerId": "CUST001",
            "month": "10",
            "year": 2024,
            "amount": 150000,
            "status": "Paid",
            "dueDate": "2024-10-10",
            "paidAt": "2024-10-03 08:15:00"
        });
        let bill: Bill = serde_json::from_value(raw).unwrap();
        assert_eq!(bill.status, BillStatus::Paid);
        assert_eq!(bill.due_date, NaiveDate::from_ymd_opt(2024, 10, 10).unwrap());
        assert!(bill.payment_method.is_empty());

        let back = serde_json::to_value(&bill).unwrap();
        assert_eq!(back["customerId"], "CUST001");
        assert_eq!(back["paidAt"], "2024-10-03 08:15:00");
        assert_eq!(back["paymentMethod"], "");
        assert!(back.get("penaltyAmount").is_none());
    }

    #[test]
    fn test_period_month_key_is_unpadded() {
        let period = BillingPeriod::new(3, 2025).unwrap();
        assert_eq!(period.month_key(), "3");
        assert_eq!(
            period.due_date(10).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(BillingPeriod::new(13, 2025).is_err());
        assert!(BillingPeriod::parse("0", 2025).is_err());
        assert_eq!(BillingPeriod::parse("11", 2025).unwrap().month, 11);
    }

    #[test]
    fn test_status_transitions() {
        assert!(BillStatus::Unpaid.can_transition_to(BillStatus::Pending));
        assert!(BillStatus::Unpaid.can_transition_to(BillStatus::Paid));
        assert!(BillStatus::Pending.can_transition_to(BillStatus::Unpaid));
        assert!(!BillStatus::Paid.can_transition_to(BillStatus::Unpaid));
        assert!(!BillStatus::Paid.can_transition_to(BillStatus::Pending));
        assert!(!BillStatus::Unpaid.can_transition_to(BillStatus::Unpaid));
    }

    #[test]
    fn test_payment_type_wire_names() {
        let account: PaymentAccount = serde_json::from_value(json!({
            "id": "ACC002",
            "type": "E-WALLET",
            "providerName": "DANA",
            "accountNumber": "081234567890",
            "accountHolder": "WIFINET"
        }))
        .unwrap();
        assert_eq!(account.kind, PaymentType::EWallet);
        assert_eq!(account.method_label(), "E-WALLET - DANA");
    }

    #[test]
    fn test_table_names_round_trip() {
        for table in Table::ALL {
            assert_eq!(table.as_str().parse::<Table>().unwrap(), table);
        }
        assert!("mikrotik_users".parse::<Table>().is_err());
    }

    #[test]
    fn test_missing_keys_default() {
        let ds: Dataset = serde_json::from_value(json!({ "customers": [] })).unwrap();
        assert!(ds.bills.is_empty());
        assert_eq!(ds.gateway_config.provider, GatewayProvider::Manual);
        assert_eq!(ds.admin_profile.username, "admin");
    }
}
