//! Billing cycle for WiFiNet.
//!
//! Bill generation, the Unpaid → Pending → Paid lifecycle, collector
//! assignment, reminders, dashboard figures and router provisioning. The
//! modules below the service layer are pure functions over
//! [`wifinet_core::Dataset`] values; [`BillingService`] and
//! [`ProvisioningService`] persist their results through the repository.

#![warn(clippy::unwrap_used)]

pub mod assignment;
pub mod generator;
pub mod lifecycle;
pub mod provisioning;
pub mod query;
pub mod reminder;
pub mod schedule;
pub mod service;
pub mod summary;

pub use assignment::CollectorStats;
pub use lifecycle::Actor;
pub use provisioning::{ProvisioningService, RouterGateway, SimulatedGateway, StaticGateway};
pub use query::{BillFilter, BillQuery};
pub use service::BillingService;
pub use summary::DashboardSummary;
