//! Billing cycle generation: one bill per Active subscriber per period.

use tracing::debug;
use wifinet_core::{Bill, BillStatus, BillingPeriod, Customer, Dataset, WifinetResult};

/// Active customers that have no bill for `period` in `dataset`.
pub fn customers_missing_bill(dataset: &Dataset, period: BillingPeriod) -> Vec<&Customer> {
    dataset
        .customers
        .iter()
        .filter(|c| c.is_active())
        .filter(|c| !dataset.bills.iter().any(|b| b.is_for(&c.id, period)))
        .collect()
}

/// Build the bills a generation pass over `dataset` would create.
///
/// The amount is the package price at this moment (0 when the package no
/// longer exists). Bills are due on `due_day` of the target month. The
/// dataset is not modified.
pub fn generate_bills(
    dataset: &Dataset,
    period: BillingPeriod,
    due_day: u32,
    mut next_id: impl FnMut() -> String,
) -> WifinetResult<Vec<Bill>> {
    let due_date = period.due_date(due_day)?;

    let bills: Vec<Bill> = customers_missing_bill(dataset, period)
        .into_iter()
        .map(|customer| Bill {
            id: next_id(),
            customer_id: customer.id.clone(),
            month: period.month_key(),
            year: period.year,
            amount: dataset.package_price_for(customer),
            penalty_amount: None,
            status: BillStatus::Unpaid,
            due_date,
            paid_at: None,
            payment_method: String::new(),
            collector_id: None,
        })
        .collect();

    debug!(period = %period, count = bills.len(), "Bills prepared");
    Ok(bills)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wifinet_core::{CustomerStatus, Package};

    fn customer(id: &str, package_id: &str, status: CustomerStatus) -> Customer {
        Customer {
            id: id.into(),
            name: format!("Customer {id}"),
            phone: "0800".into(),
            address: String::new(),
            package_id: package_id.into(),
            status,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            password: None,
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            packages: vec![Package {
                id: "P1".into(),
                name: "Basic".into(),
                speed: "10 Mbps".into(),
                price: 150_000,
                description: String::new(),
            }],
            customers: vec![
                customer("C1", "P1", CustomerStatus::Active),
                customer("C2", "P1", CustomerStatus::Suspended),
                customer("C3", "P1", CustomerStatus::Inactive),
                customer("C4", "GONE", CustomerStatus::Active),
            ],
            ..Dataset::default()
        }
    }

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("B{n}")
        }
    }

    #[test]
    fn test_generates_for_active_customer() {
        let mut ds = dataset();
        ds.customers.truncate(1);
        let period = BillingPeriod::new(11, 2025).unwrap();

        let bills = generate_bills(&ds, period, 10, counter()).unwrap();
        assert_eq!(bills.len(), 1);
        let bill = &bills[0];
        assert_eq!(bill.customer_id, "C1");
        assert_eq!(bill.month, "11");
        assert_eq!(bill.year, 2025);
        assert_eq!(bill.amount, 150_000);
        assert_eq!(bill.status, BillStatus::Unpaid);
        assert_eq!(bill.due_date, NaiveDate::from_ymd_opt(2025, 11, 10).unwrap());
    }

    #[test]
    fn test_skips_non_active_customers() {
        let ds = dataset();
        let period = BillingPeriod::new(1, 2026).unwrap();
        let bills = generate_bills(&ds, period, 10, counter()).unwrap();

        let billed: Vec<&str> = bills.iter().map(|b| b.customer_id.as_str()).collect();
        assert_eq!(billed, vec!["C1", "C4"]);
    }

    #[test]
    fn test_missing_package_bills_zero() {
        let ds = dataset();
        let period = BillingPeriod::new(1, 2026).unwrap();
        let bills = generate_bills(&ds, period, 10, counter()).unwrap();
        let orphan = bills.iter().find(|b| b.customer_id == "C4").unwrap();
        assert_eq!(orphan.amount, 0);
    }

    #[test]
    fn test_second_pass_creates_nothing() {
        let mut ds = dataset();
        let period = BillingPeriod::new(2, 2026).unwrap();

        let first = generate_bills(&ds, period, 10, counter()).unwrap();
        ds.bills.extend(first);
        let second = generate_bills(&ds, period, 10, counter()).unwrap();
        assert!(second.is_empty());

        let other_period = BillingPeriod::new(3, 2026).unwrap();
        assert_eq!(generate_bills(&ds, other_period, 10, counter()).unwrap().len(), 2);
    }

    #[test]
    fn test_month_matching_is_exact() {
        let mut ds = dataset();
        ds.customers.truncate(1);
        let november = BillingPeriod::new(11, 2025).unwrap();
        ds.bills = generate_bills(&ds, november, 10, counter()).unwrap();

        // "1" must not be confused with "11".
        let january = BillingPeriod::new(1, 2025).unwrap();
        assert_eq!(customers_missing_bill(&ds, january).len(), 1);
        assert!(customers_missing_bill(&ds, november).is_empty());
    }
}
