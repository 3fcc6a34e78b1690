//! Self-service endpoints for customers and collectors.
//!
//! Every handler here runs behind a role-checked session and only ever sees
//! the records that belong to the session's subject.

use crate::auth::Session;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{bill_query, now, require_text, today, ManagementState};
use crate::models::*;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Datelike;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use wifinet_billing::query::{customer_history, filter_bills};
use wifinet_billing::summary::{dashboard_summary, DashboardSummary};
use wifinet_billing::{Actor, CollectorStats};
use wifinet_core::{Bill, BillStatus, Collector, Package, PaymentAccount, WifinetError};

const MIN_PASSWORD_LEN: usize = 6;

// ─── Customer portal ───────────────────────────────────────────────────────

pub async fn portal_me(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<PortalOverview>> {
    let ds = state.repo.snapshot();
    let customer = ds
        .customer(&session.subject_id)
        .ok_or_else(|| WifinetError::not_found("customers", session.subject_id.as_str()))?;
    let mine = || ds.bills.iter().filter(|b| b.customer_id == customer.id);

    Ok(Json(PortalOverview {
        package: ds.package(&customer.package_id).cloned(),
        unpaid_total: mine()
            .filter(|b| b.status == BillStatus::Unpaid)
            .map(Bill::total_payable)
            .sum(),
        open_bills: mine().filter(|b| b.status != BillStatus::Paid).count(),
        customer: customer.clone().into(),
    }))
}

pub async fn portal_bills(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
) -> Json<Vec<Bill>> {
    Json(customer_history(&state.repo.snapshot(), &session.subject_id))
}

/// Customer reports a transfer. The method label comes from the chosen
/// payment account, or from the free-form `method` field.
pub async fn portal_confirm_payment(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(req): Json<ConfirmPaymentRequest>,
) -> ApiResult<Json<Bill>> {
    let method = match (req.account_id.as_deref(), req.method) {
        (Some(account_id), _) => state
            .repo
            .find::<PaymentAccount>(account_id)
            .map(|a| a.method_label())
            .ok_or_else(|| WifinetError::not_found("paymentAccounts", account_id))?,
        (None, Some(method)) => method,
        (None, None) => return Err(ApiError::validation("accountId or method is required")),
    };

    let bill = state
        .billing
        .confirm_payment(Actor::Customer(&session.subject_id), &id, &method)
        .await?;
    Ok(Json(bill))
}

pub async fn portal_change_password(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    if req.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "new password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.new_password != req.confirm_password {
        return Err(ApiError::validation("password confirmation does not match"));
    }

    let customer_id = session.subject_id.as_str();
    state
        .repo
        .transact(|ds| {
            let customer = ds
                .customers
                .iter_mut()
                .find(|c| c.id == customer_id)
                .ok_or_else(|| WifinetError::not_found("customers", customer_id))?;
            if let Some(current) = &customer.password {
                if req.old_password.as_deref() != Some(current.as_str()) {
                    return Err(WifinetError::Validation("old password is incorrect".into()));
                }
            }
            customer.password = Some(req.new_password);
            Ok(())
        })
        .await?;

    info!(customer_id, "Customer password changed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn portal_packages(State(state): State<ManagementState>) -> Json<Vec<Package>> {
    Json(state.repo.get::<Package>())
}

pub async fn portal_payment_options(State(state): State<ManagementState>) -> Json<PaymentOptions> {
    let gateway = state.repo.gateway_config();
    Json(PaymentOptions {
        accounts: state.repo.get::<PaymentAccount>(),
        gateway_provider: gateway.provider,
        gateway_active: gateway.is_active,
        client_key: gateway.client_key.filter(|k| !k.is_empty()),
        is_sandbox: gateway.is_sandbox,
    })
}

// ─── Collector app ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectorDashboard {
    pub stats: CollectorStats,
    pub progress: f64,
    pub summary: DashboardSummary,
}

fn own_collector(state: &ManagementState, session: &Session) -> ApiResult<Collector> {
    state
        .repo
        .find::<Collector>(&session.subject_id)
        .ok_or_else(|| WifinetError::not_found("collectors", session.subject_id.as_str()).into())
}

pub async fn collector_me(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<CollectorView>> {
    own_collector(&state, &session).map(|c| Json(c.into()))
}

pub async fn collector_update_me(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
    Json(req): Json<CollectorProfileRequest>,
) -> ApiResult<Json<CollectorView>> {
    require_text("name", &req.name)?;
    require_text("phone", &req.phone)?;

    let mut patch = json!({ "name": req.name, "phone": req.phone });
    if let Some(password) = req.new_password.filter(|p| !p.is_empty()) {
        if req.confirm_password.as_deref() != Some(password.as_str()) {
            return Err(ApiError::validation("password confirmation does not match"));
        }
        patch["password"] = json!(password);
    }

    let collector = state
        .repo
        .update::<Collector>(&session.subject_id, patch)
        .await?;
    info!(collector_id = %collector.id, "Collector profile updated");
    Ok(Json(collector.into()))
}

pub async fn collector_bills(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
    Query(params): Query<BillListParams>,
) -> ApiResult<Json<Vec<Bill>>> {
    let mut query = bill_query(params)?;
    query.collector_id = Some(session.subject_id);
    Ok(Json(filter_bills(&state.repo.snapshot(), &query, today())))
}

pub async fn collector_mark_paid(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    body: Option<Json<MarkPaidRequest>>,
) -> ApiResult<Json<Bill>> {
    let penalty = body.and_then(|Json(b)| b.penalty_amount);
    let bill = state
        .billing
        .mark_paid(Actor::Collector(&session.subject_id), &id, penalty, now())
        .await?;
    Ok(Json(bill))
}

pub async fn collector_dashboard(
    State(state): State<ManagementState>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<CollectorDashboard>> {
    let stats = state.billing.collector_stats(&session.subject_id)?;
    let today = today();
    let summary = dashboard_summary(
        &state.repo.snapshot(),
        Some(&session.subject_id),
        today,
        today.year(),
    );
    Ok(Json(CollectorDashboard {
        progress: stats.progress(),
        stats,
        summary,
    }))
}
