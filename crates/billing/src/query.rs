//! Bill listing filters used by the admin and collector views.

use chrono::NaiveDate;
use serde::Deserialize;
use wifinet_core::{Bill, BillStatus, BillingPeriod, Dataset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillFilter {
    #[default]
    All,
    Pending,
    Overdue,
    Unpaid,
    Paid,
}

impl BillFilter {
    pub fn matches(&self, bill: &Bill, today: NaiveDate) -> bool {
        match self {
            BillFilter::All => true,
            BillFilter::Pending => bill.status == BillStatus::Pending,
            BillFilter::Overdue => bill.is_overdue(today),
            BillFilter::Unpaid => bill.status == BillStatus::Unpaid,
            BillFilter::Paid => bill.status == BillStatus::Paid,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BillQuery {
    pub period: Option<BillingPeriod>,
    pub filter: BillFilter,
    /// Case-insensitive match on customer name or bill id.
    pub search: Option<String>,
    pub collector_id: Option<String>,
}

/// Bills matching `query`, in document order.
pub fn filter_bills(dataset: &Dataset, query: &BillQuery, today: NaiveDate) -> Vec<Bill> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    dataset
        .bills
        .iter()
        .filter(|b| query.period.map_or(true, |p| b.in_period(p)))
        .filter(|b| query.filter.matches(b, today))
        .filter(|b| {
            query
                .collector_id
                .as_deref()
                .map_or(true, |id| b.collector_id.as_deref() == Some(id))
        })
        .filter(|b| match &needle {
            None => true,
            Some(needle) => {
                b.id.to_lowercase().contains(needle)
                    || dataset
                        .customer(&b.customer_id)
                        .is_some_and(|c| c.name.to_lowercase().contains(needle))
            }
        })
        .cloned()
        .collect()
}

/// All bills of one customer, newest period first.
pub fn customer_history(dataset: &Dataset, customer_id: &str) -> Vec<Bill> {
    let mut bills: Vec<Bill> = dataset
        .bills
        .iter()
        .filter(|b| b.customer_id == customer_id)
        .cloned()
        .collect();
    bills.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| b.month_number().cmp(&a.month_number()))
    });
    bills
}
