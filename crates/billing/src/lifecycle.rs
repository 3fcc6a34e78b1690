//! Bill status transitions.
//!
//! Every function takes the current bill(s) and returns the new value; the
//! caller decides where to store it.
//!
//! ```text
//!   Unpaid ──confirm──▶ Pending ──mark_paid──▶ Paid
//!     │  ▲                 │
//!     │  └────reject───────┘
//!     └────────mark_paid──────────────────────▶ Paid
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use wifinet_core::{Bill, BillStatus, Rupiah, WifinetError, WifinetResult};

/// Who is acting on a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor<'a> {
    Admin,
    Collector(&'a str),
    Customer(&'a str),
}

impl Actor<'_> {
    /// Admins may touch any bill; collectors only bills assigned to them;
    /// customers only their own bills.
    pub fn authorize(&self, bill: &Bill) -> WifinetResult<()> {
        let allowed = match self {
            Actor::Admin => true,
            Actor::Collector(id) => bill.collector_id.as_deref() == Some(*id),
            Actor::Customer(id) => bill.customer_id == *id,
        };
        if allowed {
            Ok(())
        } else {
            Err(WifinetError::Forbidden(format!("bill '{}' is not yours", bill.id)))
        }
    }
}

fn ensure_transition(bill: &Bill, next: BillStatus) -> WifinetResult<()> {
    if bill.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(WifinetError::InvalidTransition {
            from: bill.status,
            to: next,
        })
    }
}

/// Customer claims to have paid: Unpaid → Pending with the claimed method.
/// Nothing is verified against a payment provider.
pub fn confirm_payment(bill: &Bill, method: &str) -> WifinetResult<Bill> {
    if bill.status != BillStatus::Unpaid {
        return Err(WifinetError::InvalidTransition {
            from: bill.status,
            to: BillStatus::Pending,
        });
    }
    let method = method.trim();
    if method.is_empty() {
        return Err(WifinetError::Validation("payment method is required".into()));
    }
    Ok(Bill {
        status: BillStatus::Pending,
        payment_method: method.to_string(),
        ..bill.clone()
    })
}

/// Admin or collector confirms payment: any non-Paid bill → Paid.
///
/// `penalty` is recorded on top of the frozen amount. When omitted the
/// bill's existing penalty (or 0) is kept. A penalty may not be negative
/// nor lower than one already recorded, so the total payable never drops.
pub fn mark_paid(
    bill: &Bill,
    penalty: Option<Rupiah>,
    paid_at: NaiveDateTime,
) -> WifinetResult<Bill> {
    ensure_transition(bill, BillStatus::Paid)?;

    let penalty = penalty.unwrap_or_else(|| bill.penalty());
    if penalty < 0 {
        return Err(WifinetError::Validation("penalty must not be negative".into()));
    }
    if penalty < bill.penalty() {
        return Err(WifinetError::Validation(format!(
            "penalty {penalty} is lower than the recorded {}",
            bill.penalty()
        )));
    }

    Ok(Bill {
        status: BillStatus::Paid,
        paid_at: Some(paid_at),
        penalty_amount: Some(penalty),
        ..bill.clone()
    })
}

/// Admin rejects a customer's claim: Pending → Unpaid, method cleared.
pub fn reject_payment(bill: &Bill) -> WifinetResult<Bill> {
    if bill.status != BillStatus::Pending {
        return Err(WifinetError::InvalidTransition {
            from: bill.status,
            to: BillStatus::Unpaid,
        });
    }
    Ok(Bill {
        status: BillStatus::Unpaid,
        payment_method: String::new(),
        ..bill.clone()
    })
}

/// Mark every listed Unpaid or Pending bill Paid with one shared
/// timestamp. Bills already Paid keep their original `paidAt`. Penalties
/// are untouched.
pub fn bulk_mark_paid(bills: &[Bill], ids: &[String], paid_at: NaiveDateTime) -> Vec<Bill> {
    let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
    bills
        .iter()
        .map(|b| {
            if wanted.contains(b.id.as_str()) && b.status != BillStatus::Paid {
                Bill {
                    status: BillStatus::Paid,
                    paid_at: Some(paid_at),
                    ..b.clone()
                }
            } else {
                b.clone()
            }
        })
        .collect()
}

/// Penalty to pre-fill when confirming payment: the configured late fee for
/// overdue bills, otherwise whatever is already recorded.
pub fn suggested_penalty(bill: &Bill, today: NaiveDate, late_penalty: Rupiah) -> Rupiah {
    if bill.is_overdue(today) {
        late_penalty.max(bill.penalty())
    } else {
        bill.penalty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
