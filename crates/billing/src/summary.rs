//! Dashboard figures for the admin and collector home screens.

use chrono::NaiveDate;
use serde::Serialize;
use wifinet_core::{Bill, BillStatus, Dataset, Rupiah};

use crate::reminder::month_name;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    pub month: u32,
    pub label: String,
    /// Paid amount plus penalty.
    pub paid: Rupiah,
    /// Unpaid amount, Pending bills excluded.
    pub unpaid: Rupiah,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub active_customers: usize,
    pub total_revenue: Rupiah,
    pub overdue_count: usize,
    pub overdue_amount: Rupiah,
    /// Sum of current package prices over Active customers.
    pub potential_monthly: Rupiah,
    pub pending_count: usize,
    pub year: i32,
    pub monthly: Vec<MonthlyTotals>,
}

/// Summary over every bill in the dataset, or only those assigned to
/// `collector_id` when given. The monthly series covers `year` only.
pub fn dashboard_summary(
    dataset: &Dataset,
    collector_id: Option<&str>,
    today: NaiveDate,
    year: i32,
) -> DashboardSummary {
    let bills: Vec<&Bill> = dataset
        .bills
        .iter()
        .filter(|b| collector_id.map_or(true, |id| b.collector_id.as_deref() == Some(id)))
        .collect();

    let active: Vec<_> = dataset.customers.iter().filter(|c| c.is_active()).collect();
    let overdue: Vec<&&Bill> = bills.iter().filter(|b| b.is_overdue(today)).collect();

    let monthly = (1..=12u32)
        .map(|month| {
            let in_month = bills
                .iter()
                .filter(|b| b.year == year && b.month_number() == Some(month));
            let mut totals = MonthlyTotals {
                month,
                label: month_name(month).unwrap_or_default().to_string(),
                paid: 0,
                unpaid: 0,
            };
            for bill in in_month {
                match bill.status {
                    BillStatus::Paid => totals.paid += bill.total_payable(),
                    BillStatus::Unpaid => totals.unpaid += bill.amount,
                    BillStatus::Pending => {}
                }
            }
            totals
        })
        .collect();

    DashboardSummary {
        active_customers: active.len(),
        total_revenue: bills
            .iter()
            .filter(|b| b.status == BillStatus::Paid)
            .map(|b| b.total_payable())
            .sum(),
        overdue_count: overdue.len(),
        overdue_amount: overdue.iter().map(|b| b.amount).sum(),
        potential_monthly: active.iter().map(|c| dataset.package_price_for(c)).sum(),
        pending_count: bills
            .iter()
            .filter(|b| b.status == BillStatus::Pending)
            .count(),
        year,
        monthly,
    }
}
