//! Billing operations against the repository.
//!
//! Each operation loads the current document, applies one of the pure
//! functions from this crate and persists the result in a single
//! repository transaction.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{info, warn};
use wifinet_core::config::BillingConfig;
use wifinet_core::{
    ids, Bill, BillStatus, BillingPeriod, Collector, Rupiah, WifinetError, WifinetResult,
};
use wifinet_store::Repository;

use crate::assignment;
use crate::generator::generate_bills;
use crate::lifecycle::{self, Actor};
use crate::schedule::auto_billing_due;

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct BillingService {
    repo: Arc<Repository>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(repo: Arc<Repository>, config: BillingConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &Arc<Repository> {
        &self.repo
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Create bills for every Active customer not yet billed for `period`.
    ///
    /// The missing-bill check and the insert run under the repository write
    /// lock, so concurrent calls never produce duplicates.
    pub async fn generate(&self, period: BillingPeriod) -> WifinetResult<Vec<Bill>> {
        let due_day = self.config.due_day;
        let created = self
            .repo
            .transact(|ds| {
                let fresh = generate_bills(ds, period, due_day, ids::record_id)?;
                ds.bills.extend(fresh.iter().cloned());
                Ok(fresh)
            })
            .await?;

        metrics::counter!("billing.bills_generated").increment(created.len() as u64);
        info!(period = %period, count = created.len(), "Bills generated");
        Ok(created)
    }

    /// Generate the current month's bills if the admin profile asks for it.
    /// Returns `None` when nothing was due.
    pub async fn run_auto_billing(&self, today: NaiveDate) -> WifinetResult<Option<Vec<Bill>>> {
        let Some(period) = auto_billing_due(&self.repo.snapshot(), today) else {
            return Ok(None);
        };
        info!(period = %period, "Automatic billing triggered");
        self.generate(period).await.map(Some)
    }

    /// Apply `f` to one bill after checking `actor` may touch it.
    async fn transition<F>(&self, actor: Actor<'_>, bill_id: &str, f: F) -> WifinetResult<Bill>
    where
        F: FnOnce(&Bill) -> WifinetResult<Bill> + Send,
    {
        self.repo
            .transact(|ds| {
                let slot = ds
                    .bills
                    .iter_mut()
                    .find(|b| b.id == bill_id)
                    .ok_or_else(|| WifinetError::not_found("bills", bill_id))?;
                actor.authorize(slot)?;
                let next = f(slot)?;
                *slot = next.clone();
                Ok(next)
            })
            .await
    }

    /// Customer reports a manual payment.
    pub async fn confirm_payment(
        &self,
        actor: Actor<'_>,
        bill_id: &str,
        method: &str,
    ) -> WifinetResult<Bill> {
        let bill = self
            .transition(actor, bill_id, |b| lifecycle::confirm_payment(b, method))
            .await?;
        metrics::counter!("billing.payments_claimed").increment(1);
        info!(bill_id, method = %bill.payment_method, "Payment claimed");
        Ok(bill)
    }

    /// Admin or assigned collector confirms a payment.
    pub async fn mark_paid(
        &self,
        actor: Actor<'_>,
        bill_id: &str,
        penalty: Option<Rupiah>,
        now: NaiveDateTime,
    ) -> WifinetResult<Bill> {
        if let Actor::Customer(_) = actor {
            return Err(WifinetError::Forbidden("customers cannot confirm payments".into()));
        }
        let bill = self
            .transition(actor, bill_id, |b| lifecycle::mark_paid(b, penalty, now))
            .await?;
        metrics::counter!("billing.bills_paid").increment(1);
        info!(bill_id, penalty = bill.penalty(), actor = ?actor, "Bill marked paid");
        Ok(bill)
    }

    pub async fn reject_payment(&self, actor: Actor<'_>, bill_id: &str) -> WifinetResult<Bill> {
        if actor != Actor::Admin {
            return Err(WifinetError::Forbidden("only the admin can reject payments".into()));
        }
        let bill = self
            .transition(actor, bill_id, lifecycle::reject_payment)
            .await?;
        metrics::counter!("billing.payments_rejected").increment(1);
        info!(bill_id, "Payment rejected");
        Ok(bill)
    }

    /// Mark many bills Paid at once. Unknown and already Paid ids are
    /// skipped; returns the number of bills touched.
    pub async fn bulk_mark_paid(&self, ids: &[String], now: NaiveDateTime) -> WifinetResult<usize> {
        let touched = self
            .repo
            .transact(|ds| {
                let count = ds
                    .bills
                    .iter()
                    .filter(|b| ids.contains(&b.id) && b.status != BillStatus::Paid)
                    .count();
                ds.bills = lifecycle::bulk_mark_paid(&ds.bills, ids, now);
                Ok(count)
            })
            .await?;
        if touched < ids.len() {
            warn!(requested = ids.len(), touched, "Bulk payment skipped unknown or paid bills");
        }
        metrics::counter!("billing.bills_paid").increment(touched as u64);
        info!(count = touched, "Bills bulk marked paid");
        Ok(touched)
    }

    pub async fn delete(&self, bill_id: &str) -> WifinetResult<()> {
        if self.repo.remove::<Bill>(bill_id).await? {
            info!(bill_id, "Bill deleted");
            Ok(())
        } else {
            Err(WifinetError::not_found("bills", bill_id))
        }
    }

    pub async fn bulk_delete(&self, ids: &[String]) -> WifinetResult<usize> {
        let removed = self.repo.bulk_remove::<Bill>(ids).await?;
        info!(requested = ids.len(), removed, "Bills bulk deleted");
        Ok(removed)
    }

    /// Hand bills to a collector. The collector must exist.
    pub async fn assign_collector(&self, ids: &[String], collector_id: &str) -> WifinetResult<usize> {
        let touched = self
            .repo
            .transact(|ds| {
                if ds.collector(collector_id).is_none() {
                    return Err(WifinetError::not_found("collectors", collector_id));
                }
                let count = ds.bills.iter().filter(|b| ids.contains(&b.id)).count();
                ds.bills = assignment::assign_collector(&ds.bills, ids, collector_id);
                Ok(count)
            })
            .await?;
        info!(collector_id, count = touched, "Bills assigned");
        Ok(touched)
    }

    pub fn collector_stats(&self, collector_id: &str) -> WifinetResult<assignment::CollectorStats> {
        let ds = self.repo.snapshot();
        if ds.find::<Collector>(collector_id).is_none() {
            return Err(WifinetError::not_found("collectors", collector_id));
        }
        Ok(assignment::collector_stats(&ds.bills, collector_id))
    }

    pub fn suggested_penalty(&self, bill_id: &str, today: NaiveDate) -> WifinetResult<Rupiah> {
        let bill = self
            .repo
            .find::<Bill>(bill_id)
            .ok_or_else(|| WifinetError::not_found("bills", bill_id))?;
        Ok(lifecycle::suggested_penalty(&bill, today, self.config.late_penalty))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wifinet_core::{BillStatus, Customer, CustomerStatus};
    use wifinet_store::MemoryStore;

    async fn service() -> BillingService {
        let repo = Repository::open(Arc::new(MemoryStore::default())).await.unwrap();
        BillingService::new(Arc::new(repo), BillingConfig::default())
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_is_idempotent() {
        let svc = service().await;
        let period = BillingPeriod::new(12, 2024).unwrap();

        let first = svc.generate(period).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].customer_id, "CUST001");
        assert_eq!(first[0].due_date, NaiveDate::from_ymd_opt(2024, 12, 10).unwrap());

        assert!(svc.generate(period).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_generation_never_duplicates() {
        let svc = Arc::new(service().await);
        let period = BillingPeriod::new(1, 2025).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.generate(period).await.unwrap().len() })
            })
            .collect();
        let mut total = 0;
        for h in handles {
            total += h.await.unwrap();
        }
        assert_eq!(total, 1);

        let bills = svc.repository().get::<Bill>();
        assert_eq!(bills.iter().filter(|b| b.in_period(period)).count(), 1);
    }

    #[tokio::test]
    async fn test_amount_frozen_after_price_change() {
        let svc = service().await;
        let period = BillingPeriod::new(2, 2025).unwrap();
        let bill = svc.generate(period).await.unwrap().remove(0);

        svc.repository()
            .update::<wifinet_core::Package>("PKG001", serde_json::json!({ "price": 999_000 }))
            .await
            .unwrap();
        let stored = svc.repository().find::<Bill>(&bill.id).unwrap();
        assert_eq!(stored.amount, 150_000);
    }

    #[tokio::test]
    async fn test_customer_payment_flow() {
        let svc = service().await;

        let err = svc
            .confirm_payment(Actor::Customer("CUST001"), "BILL002", "BANK - BCA")
            .await
            .unwrap_err();
        assert!(matches!(err, WifinetError::Forbidden(_)));

        let pending = svc
            .confirm_payment(Actor::Customer("CUST001"), "BILL003", "BANK - BCA")
            .await
            .unwrap();
        assert_eq!(pending.status, BillStatus::Pending);

        let rejected = svc.reject_payment(Actor::Admin, "BILL003").await.unwrap();
        assert_eq!(rejected.status, BillStatus::Unpaid);
        assert_eq!(rejected.payment_method, "");

        let paid = svc
            .mark_paid(Actor::Admin, "BILL003", Some(10_000), at(2024, 11, 25))
            .await
            .unwrap();
        assert_eq!(paid.total_payable(), 160_000);
        assert_eq!(
            svc.repository().find::<Bill>("BILL003").unwrap().status,
            BillStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_role_restrictions() {
        let svc = service().await;
        assert!(svc
            .mark_paid(Actor::Customer("CUST001"), "BILL003", None, at(2024, 11, 1))
            .await
            .is_err());
        assert!(svc
            .reject_payment(Actor::Collector("COL1"), "BILL003")
            .await
            .is_err());
        assert!(matches!(
            svc.mark_paid(Actor::Collector("COL1"), "BILL003", None, at(2024, 11, 1))
                .await,
            Err(WifinetError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_transition_persists_nothing() {
        let svc = service().await;
        let before = svc.repository().find::<Bill>("BILL001").unwrap();
        assert!(svc
            .mark_paid(Actor::Admin, "BILL001", None, at(2025, 1, 1))
            .await
            .is_err());
        assert_eq!(svc.repository().find::<Bill>("BILL001").unwrap(), before);
    }

    #[tokio::test]
    async fn test_bulk_operations() {
        let svc = service().await;
        let ids = vec!["BILL002".to_string(), "BILL003".to_string(), "NOPE".to_string()];

        assert_eq!(svc.bulk_mark_paid(&ids, at(2024, 12, 1)).await.unwrap(), 2);
        let bills = svc.repository().get::<Bill>();
        assert!(bills.iter().all(|b| b.status == BillStatus::Paid));

        // BILL001 was already paid: it is skipped and keeps its timestamp.
        let before = svc.repository().find::<Bill>("BILL001").unwrap().paid_at;
        let paid_again = svc
            .bulk_mark_paid(&["BILL001".to_string()], at(2025, 1, 1))
            .await
            .unwrap();
        assert_eq!(paid_again, 0);
        assert_eq!(svc.repository().find::<Bill>("BILL001").unwrap().paid_at, before);

        assert_eq!(svc.bulk_delete(&ids).await.unwrap(), 2);
        assert_eq!(svc.repository().get::<Bill>().len(), 1);
        assert!(svc.delete("BILL002").await.is_err());
    }

    #[tokio::test]
    async fn test_assignment_requires_collector() {
        let svc = service().await;
        let ids = vec!["BILL003".to_string()];
        assert!(svc.assign_collector(&ids, "COLXXXX").await.is_err());

        svc.repository()
            .insert(Collector {
                id: "COLAB12".into(),
                name: "Andi".into(),
                phone: "0811".into(),
                password: None,
                status: wifinet_core::CollectorStatus::Active,
                joined_at: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(svc.assign_collector(&ids, "COLAB12").await.unwrap(), 1);

        let paid = svc
            .mark_paid(Actor::Collector("COLAB12"), "BILL003", None, at(2024, 11, 30))
            .await
            .unwrap();
        assert_eq!(paid.status, BillStatus::Paid);

        let stats = svc.collector_stats("COLAB12").unwrap();
        assert_eq!((stats.count, stats.paid_count), (1, 1));
    }

    #[tokio::test]
    async fn test_auto_billing_runs_once() {
        let svc = service().await;
        svc.repository()
            .insert(Customer {
                id: "NEW001".into(),
                name: "Dewi".into(),
                phone: "0813".into(),
                address: String::new(),
                package_id: "PKG002".into(),
                status: CustomerStatus::Active,
                created_at: at(2025, 3, 1),
                password: None,
            })
            .await
            .unwrap();
        let mut profile = svc.repository().admin_profile();
        profile.auto_billing_enabled = Some(true);
        profile.billing_day = Some(5);
        svc.repository().set_admin_profile(profile).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert!(svc.run_auto_billing(today).await.unwrap().is_none());

        let today = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let created = svc.run_auto_billing(today).await.unwrap().unwrap();
        assert_eq!(created.len(), 2);
        assert!(svc.run_auto_billing(today).await.unwrap().is_none());

        assert_eq!(svc.suggested_penalty(&created[0].id, today).unwrap(), 0);
    }
}
