//! Automatic generation on admin session entry.
//!
//! There is no background scheduler: the check runs when an admin session
//! opens and decides whether the current month still needs bills.

use chrono::{Datelike, NaiveDate};
use wifinet_core::{BillingPeriod, Dataset};

use crate::generator::customers_missing_bill;

/// The period to generate for, if automatic billing should run `today`.
///
/// Runs when auto billing is enabled, the day of month has reached the
/// profile's billing day, and at least one Active customer has no bill for
/// the current month.
pub fn auto_billing_due(dataset: &Dataset, today: NaiveDate) -> Option<BillingPeriod> {
    let profile = &dataset.admin_profile;
    if !profile.auto_billing() || today.day() < profile.billing_day() {
        return None;
    }
    let period = BillingPeriod::containing(today);
    if customers_missing_bill(dataset, period).is_empty() {
        None
    } else {
        Some(period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifinet_core::{Bill, BillStatus};

    fn dataset(enabled: Option<bool>, day: Option<u32>) -> Dataset {
        let mut ds = wifinet_store::seed::default_dataset();
        ds.admin_profile.auto_billing_enabled = enabled;
        ds.admin_profile.billing_day = day;
        ds
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_disabled_never_runs() {
        assert_eq!(auto_billing_due(&dataset(None, Some(1)), date(20)), None);
        assert_eq!(auto_billing_due(&dataset(Some(false), Some(1)), date(20)), None);
    }

    #[test]
    fn test_waits_for_billing_day() {
        let ds = dataset(Some(true), Some(15));
        assert_eq!(auto_billing_due(&ds, date(14)), None);
        assert_eq!(
            auto_billing_due(&ds, date(15)),
            Some(BillingPeriod::new(6, 2025).unwrap())
        );
    }

    #[test]
    fn test_skips_when_everyone_is_billed() {
        let mut ds = dataset(Some(true), None);
        ds.bills.push(Bill {
            id: "JUN".into(),
            customer_id: "CUST001".into(),
            month: "6".into(),
            year: 2025,
            amount: 150_000,
            penalty_amount: None,
            status: BillStatus::Unpaid,
            due_date: date(10),
            paid_at: None,
            payment_method: String::new(),
            collector_id: None,
        });
        // CUST001 is the only Active customer in the seed.
        assert_eq!(auto_billing_due(&ds, date(2)), None);
    }
}
