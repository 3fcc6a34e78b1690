//! Collector assignment and per-collector views.

use serde::Serialize;
use std::collections::HashSet;
use wifinet_core::{Bill, BillStatus, Rupiah};

/// Point every listed bill at `collector_id`, overwriting any previous
/// assignment. Unknown ids are ignored.
pub fn assign_collector(bills: &[Bill], ids: &[String], collector_id: &str) -> Vec<Bill> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    bills
        .iter()
        .map(|b| {
            if wanted.contains(b.id.as_str()) {
                Bill {
                    collector_id: Some(collector_id.to_string()),
                    ..b.clone()
                }
            } else {
                b.clone()
            }
        })
        .collect()
}

/// Bills a collector is responsible for.
pub fn bills_for_collector<'a>(bills: &'a [Bill], collector_id: &str) -> Vec<&'a Bill> {
    bills
        .iter()
        .filter(|b| b.collector_id.as_deref() == Some(collector_id))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    pub collector_id: String,
    pub total_assigned: Rupiah,
    pub total_collected: Rupiah,
    pub count: usize,
    pub paid_count: usize,
}

impl CollectorStats {
    /// Paid share of assigned bills, in percent.
    pub fn progress(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.paid_count as f64 / self.count as f64 * 100.0
        }
    }
}

/// Totals over the bills assigned to `collector_id`. Amounts exclude
/// penalties.
pub fn collector_stats(bills: &[Bill], collector_id: &str) -> CollectorStats {
    let assigned = bills_for_collector(bills, collector_id);
    let paid: Vec<&&Bill> = assigned
        .iter()
        .filter(|b| b.status == BillStatus::Paid)
        .collect();

    CollectorStats {
        collector_id: collector_id.to_string(),
        total_assigned: assigned.iter().map(|b| b.amount).sum(),
        total_collected: paid.iter().map(|b| b.amount).sum(),
        count: assigned.len(),
        paid_count: paid.len(),
    }
}
