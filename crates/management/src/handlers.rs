//! Axum REST handlers for the admin API.

use crate::auth::{self, SessionStore};
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use wifinet_billing::query::{customer_history, filter_bills};
use wifinet_billing::reminder::{reminder_message, whatsapp_link};
use wifinet_billing::summary::{dashboard_summary, DashboardSummary};
use wifinet_billing::{
    Actor, BillQuery, BillingService, CollectorStats, ProvisioningService, RouterGateway,
};
use wifinet_core::config::{AppConfig, AuthConfig};
use wifinet_core::{
    ids, AdminProfile, Bill, BillingPeriod, Collector, Customer, Dataset, MikrotikUser,
    Package, PaymentAccount, PaymentGatewayConfig, Record, Router, RouterStatus, WifinetError,
};
use wifinet_store::Repository;

/// Shared management state.
#[derive(Clone)]
pub struct ManagementState {
    pub repo: Arc<Repository>,
    pub billing: Arc<BillingService>,
    pub provisioning: Arc<ProvisioningService>,
    pub sessions: Arc<SessionStore>,
    pub auth: AuthConfig,
}

impl ManagementState {
    pub fn new(repo: Arc<Repository>, config: &AppConfig, gateway: Arc<dyn RouterGateway>) -> Self {
        let billing = BillingService::new(repo.clone(), config.billing.clone());
        let provisioning = ProvisioningService::new(
            repo.clone(),
            gateway,
            Duration::from_secs(config.provisioning.status_clear_secs),
        );
        Self {
            repo,
            billing: Arc::new(billing),
            provisioning: Arc::new(provisioning),
            sessions: Arc::new(SessionStore::new(config.auth.session_ttl_hours)),
            auth: config.auth.clone(),
        }
    }
}

pub(crate) fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub(crate) fn today() -> NaiveDate {
    now().date()
}

pub(crate) fn patch_of<T: Serialize>(req: &T) -> ApiResult<Value> {
    serde_json::to_value(req).map_err(|e| ApiError(e.into()))
}

pub(crate) fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::validation(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}

async fn remove_record<R: Record>(repo: &Repository, id: &str) -> ApiResult<StatusCode> {
    if repo.remove::<R>(id).await? {
        metrics::counter!("management.records.deleted", "table" => R::TABLE.as_str()).increment(1);
        info!(table = %R::TABLE, id, "Record deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(WifinetError::not_found(R::TABLE.as_str(), id).into())
    }
}

fn find_record<R: Record>(repo: &Repository, id: &str) -> ApiResult<R> {
    repo.find::<R>(id)
        .ok_or_else(|| WifinetError::not_found(R::TABLE.as_str(), id).into())
}

fn ensure_package(dataset: &Dataset, package_id: &str) -> ApiResult<()> {
    if dataset.package(package_id).is_some() {
        Ok(())
    } else {
        Err(ApiError::validation(format!("unknown package '{package_id}'")))
    }
}

// ─── Auth ──────────────────────────────────────────────────────────────────

pub async fn handle_login(
    State(state): State<ManagementState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let principal = match auth::resolve_login(&state.repo.snapshot(), &state.auth, &req) {
        Ok(principal) => principal,
        Err(e) => {
            metrics::counter!("auth.login_failed").increment(1);
            warn!(username = %req.username, "Login rejected");
            return Err(e.into());
        }
    };

    let generated_bills = if principal.role == Role::Admin {
        match state.billing.run_auto_billing(today()).await {
            Ok(created) => Some(created.map_or(0, |bills| bills.len())),
            Err(e) => {
                warn!(error = %e, "Automatic billing failed");
                Some(0)
            }
        }
    } else {
        None
    };

    let session = state.sessions.open(principal);
    metrics::counter!("auth.logins", "role" => format!("{:?}", session.role)).increment(1);
    Ok(Json(LoginResponse {
        token: session.token,
        role: session.role,
        subject_id: session.subject_id,
        name: session.name,
        expires_at: session.expires_at,
        generated_bills,
    }))
}

pub async fn handle_logout(State(state): State<ManagementState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = auth::bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    StatusCode::NO_CONTENT
}

// ─── Overview ──────────────────────────────────────────────────────────────

/// Full document with every stored password removed.
pub async fn get_data(State(state): State<ManagementState>) -> Json<Dataset> {
    let mut dataset = state.repo.snapshot().as_ref().clone();
    dataset.admin_profile.password = None;
    dataset.customers.iter_mut().for_each(|c| c.password = None);
    dataset.collectors.iter_mut().for_each(|c| c.password = None);
    dataset.routers.iter_mut().for_each(|r| r.password = None);
    Json(dataset)
}

pub async fn dashboard(State(state): State<ManagementState>) -> Json<DashboardSummary> {
    let today = today();
    Json(dashboard_summary(&state.repo.snapshot(), None, today, today.year()))
}

// ─── Customers ─────────────────────────────────────────────────────────────

pub async fn list_customers(State(state): State<ManagementState>) -> Json<Vec<CustomerView>> {
    Json(
        state
            .repo
            .get::<Customer>()
            .into_iter()
            .map(CustomerView::from)
            .collect(),
    )
}

pub async fn get_customer(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CustomerView>> {
    find_record::<Customer>(&state.repo, &id).map(|c| Json(c.into()))
}

pub async fn create_customer(
    State(state): State<ManagementState>,
    Json(req): Json<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<CustomerView>)> {
    require_text("name", &req.name)?;
    require_text("phone", &req.phone)?;
    ensure_package(&state.repo.snapshot(), &req.package_id)?;

    let customer = Customer {
        id: ids::customer_id(),
        name: req.name,
        phone: req.phone,
        address: req.address,
        package_id: req.package_id,
        status: req.status,
        created_at: now(),
        password: req.password.filter(|p| !p.is_empty()),
    };
    let customer = state.repo.insert(customer).await?;
    metrics::counter!("management.customers.created").increment(1);
    info!(customer_id = %customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(customer.into())))
}

pub async fn update_customer(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<CustomerView>> {
    req.password = req.password.filter(|p| !p.is_empty());
    if let Some(package_id) = &req.package_id {
        ensure_package(&state.repo.snapshot(), package_id)?;
    }
    let customer = state.repo.update::<Customer>(&id, patch_of(&req)?).await?;
    Ok(Json(customer.into()))
}

pub async fn delete_customer(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    remove_record::<Customer>(&state.repo, &id).await
}

pub async fn bulk_customer_status(
    State(state): State<ManagementState>,
    Json(req): Json<BulkStatusRequest>,
) -> ApiResult<Json<CountResponse>> {
    let count = state
        .repo
        .update_many::<Customer>(&req.ids, json!({ "status": req.status }))
        .await?;
    info!(count, status = ?req.status, "Customer status bulk updated");
    Ok(Json(CountResponse { count }))
}

pub async fn customer_bills(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Bill>>> {
    let ds = state.repo.snapshot();
    if ds.customer(&id).is_none() {
        return Err(WifinetError::not_found("customers", id).into());
    }
    Ok(Json(customer_history(&ds, &id)))
}

// ─── Packages ──────────────────────────────────────────────────────────────

pub async fn list_packages(State(state): State<ManagementState>) -> Json<Vec<Package>> {
    Json(state.repo.get::<Package>())
}

pub async fn create_package(
    State(state): State<ManagementState>,
    Json(req): Json<CreatePackageRequest>,
) -> ApiResult<(StatusCode, Json<Package>)> {
    require_text("name", &req.name)?;
    if req.price < 0 {
        return Err(ApiError::validation("price must not be negative"));
    }
    let package = state
        .repo
        .insert(Package {
            id: ids::record_id(),
            name: req.name,
            speed: req.speed,
            price: req.price,
            description: req.description,
        })
        .await?;
    info!(package_id = %package.id, price = package.price, "Package created");
    Ok((StatusCode::CREATED, Json(package)))
}

pub async fn update_package(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePackageRequest>,
) -> ApiResult<Json<Package>> {
    if req.price.is_some_and(|p| p < 0) {
        return Err(ApiError::validation("price must not be negative"));
    }
    Ok(Json(state.repo.update::<Package>(&id, patch_of(&req)?).await?))
}

pub async fn delete_package(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    remove_record::<Package>(&state.repo, &id).await
}

// ─── Bills ─────────────────────────────────────────────────────────────────

pub(crate) fn bill_query(params: BillListParams) -> ApiResult<BillQuery> {
    let period = match (params.month.as_deref(), params.year) {
        (Some(month), Some(year)) => Some(BillingPeriod::parse(month, year)?),
        (None, None) => None,
        _ => return Err(ApiError::validation("month and year must be given together")),
    };
    Ok(BillQuery {
        period,
        filter: params.filter,
        search: params.search,
        collector_id: None,
    })
}

pub async fn list_bills(
    State(state): State<ManagementState>,
    Query(params): Query<BillListParams>,
) -> ApiResult<Json<Vec<Bill>>> {
    let query = bill_query(params)?;
    Ok(Json(filter_bills(&state.repo.snapshot(), &query, today())))
}

pub async fn generate_bills(
    State(state): State<ManagementState>,
    Json(req): Json<GenerateBillsRequest>,
) -> ApiResult<Json<GenerateBillsResponse>> {
    let period = BillingPeriod::parse(&req.month, req.year)?;
    let bills = state.billing.generate(period).await?;
    Ok(Json(GenerateBillsResponse {
        period: period.to_string(),
        count: bills.len(),
        bills,
    }))
}

pub async fn mark_paid(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
    body: Option<Json<MarkPaidRequest>>,
) -> ApiResult<Json<Bill>> {
    let penalty = body.and_then(|Json(b)| b.penalty_amount);
    let bill = state
        .billing
        .mark_paid(Actor::Admin, &id, penalty, now())
        .await?;
    Ok(Json(bill))
}

pub async fn reject_payment(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Bill>> {
    Ok(Json(state.billing.reject_payment(Actor::Admin, &id).await?))
}

pub async fn delete_bill(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.billing.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_mark_paid(
    State(state): State<ManagementState>,
    Json(req): Json<BulkIdsRequest>,
) -> ApiResult<Json<CountResponse>> {
    let count = state.billing.bulk_mark_paid(&req.ids, now()).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn bulk_delete_bills(
    State(state): State<ManagementState>,
    Json(req): Json<BulkIdsRequest>,
) -> ApiResult<Json<CountResponse>> {
    let count = state.billing.bulk_delete(&req.ids).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn assign_collector(
    State(state): State<ManagementState>,
    Json(req): Json<AssignCollectorRequest>,
) -> ApiResult<Json<CountResponse>> {
    let count = state
        .billing
        .assign_collector(&req.ids, &req.collector_id)
        .await?;
    Ok(Json(CountResponse { count }))
}

pub async fn bill_reminder(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReminderResponse>> {
    let ds = state.repo.snapshot();
    let bill = ds
        .bill(&id)
        .ok_or_else(|| WifinetError::not_found("bills", id.as_str()))?;
    let customer = ds
        .customer(&bill.customer_id)
        .ok_or_else(|| WifinetError::not_found("customers", bill.customer_id.as_str()))?;
    let today = today();
    Ok(Json(ReminderResponse {
        link: whatsapp_link(bill, customer, today)?,
        message: reminder_message(bill, customer, today),
    }))
}

pub async fn suggested_penalty(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<PenaltyResponse>> {
    let suggested_penalty = state.billing.suggested_penalty(&id, today())?;
    Ok(Json(PenaltyResponse {
        bill_id: id,
        suggested_penalty,
    }))
}

// ─── Collectors ────────────────────────────────────────────────────────────

pub async fn list_collectors(State(state): State<ManagementState>) -> Json<Vec<CollectorView>> {
    Json(
        state
            .repo
            .get::<Collector>()
            .into_iter()
            .map(CollectorView::from)
            .collect(),
    )
}

pub async fn create_collector(
    State(state): State<ManagementState>,
    Json(req): Json<CreateCollectorRequest>,
) -> ApiResult<(StatusCode, Json<CollectorView>)> {
    require_text("name", &req.name)?;
    require_text("phone", &req.phone)?;
    let collector = state
        .repo
        .insert(Collector {
            id: ids::collector_id(),
            name: req.name,
            phone: req.phone,
            password: req.password.filter(|p| !p.is_empty()),
            status: req.status,
            joined_at: today(),
        })
        .await?;
    metrics::counter!("management.collectors.created").increment(1);
    info!(collector_id = %collector.id, "Collector created");
    Ok((StatusCode::CREATED, Json(collector.into())))
}

pub async fn update_collector(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateCollectorRequest>,
) -> ApiResult<Json<CollectorView>> {
    req.password = req.password.filter(|p| !p.is_empty());
    let collector = state
        .repo
        .update::<Collector>(&id, patch_of(&req)?)
        .await?;
    Ok(Json(collector.into()))
}

pub async fn delete_collector(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    remove_record::<Collector>(&state.repo, &id).await
}

pub async fn collector_stats(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CollectorStats>> {
    Ok(Json(state.billing.collector_stats(&id)?))
}

// ─── Routers ───────────────────────────────────────────────────────────────

pub async fn list_routers(State(state): State<ManagementState>) -> Json<Vec<Router>> {
    Json(state.repo.get::<Router>())
}

pub async fn create_router(
    State(state): State<ManagementState>,
    Json(req): Json<CreateRouterRequest>,
) -> ApiResult<(StatusCode, Json<Router>)> {
    require_text("name", &req.name)?;
    require_text("host", &req.host)?;
    let router = state
        .repo
        .insert(Router {
            id: ids::record_id(),
            name: req.name,
            host: req.host,
            port: req.port,
            username: req.username,
            password: req.password.filter(|p| !p.is_empty()),
            status: RouterStatus::Offline,
        })
        .await?;
    info!(router_id = %router.id, host = %router.host, "Router added");
    Ok((StatusCode::CREATED, Json(router)))
}

pub async fn update_router(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
    Json(mut req): Json<UpdateRouterRequest>,
) -> ApiResult<Json<Router>> {
    req.password = req.password.filter(|p| !p.is_empty());
    Ok(Json(state.repo.update::<Router>(&id, patch_of(&req)?).await?))
}

pub async fn delete_router(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    remove_record::<Router>(&state.repo, &id).await
}

pub async fn test_router(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Router>> {
    Ok(Json(state.provisioning.test_router(&id).await?))
}

pub async fn sync_router_user(
    State(state): State<ManagementState>,
    Path((router_id, customer_id)): Path<(String, String)>,
) -> ApiResult<Json<MikrotikUser>> {
    Ok(Json(
        state
            .provisioning
            .sync_user(&customer_id, &router_id)
            .await?,
    ))
}

pub async fn sync_statuses(State(state): State<ManagementState>) -> Json<Vec<SyncStatusResponse>> {
    Json(
        state
            .provisioning
            .board()
            .all()
            .into_iter()
            .map(|(customer_id, status)| SyncStatusResponse {
                customer_id,
                status,
            })
            .collect(),
    )
}

pub async fn list_mikrotik_users(State(state): State<ManagementState>) -> Json<Vec<MikrotikUser>> {
    Json(state.repo.get::<MikrotikUser>())
}

pub async fn delete_mikrotik_user(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.provisioning.remove_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Payment settings ──────────────────────────────────────────────────────

pub async fn list_payment_accounts(
    State(state): State<ManagementState>,
) -> Json<Vec<PaymentAccount>> {
    Json(state.repo.get::<PaymentAccount>())
}

pub async fn create_payment_account(
    State(state): State<ManagementState>,
    Json(req): Json<CreatePaymentAccountRequest>,
) -> ApiResult<(StatusCode, Json<PaymentAccount>)> {
    require_text("providerName", &req.provider_name)?;
    require_text("accountNumber", &req.account_number)?;
    let account = state
        .repo
        .insert(PaymentAccount {
            id: ids::record_id(),
            kind: req.kind,
            provider_name: req.provider_name,
            account_number: req.account_number,
            account_holder: req.account_holder,
        })
        .await?;
    info!(account_id = %account.id, method = %account.method_label(), "Payment account added");
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update_payment_account(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentAccountRequest>,
) -> ApiResult<Json<PaymentAccount>> {
    Ok(Json(
        state
            .repo
            .update::<PaymentAccount>(&id, patch_of(&req)?)
            .await?,
    ))
}

pub async fn delete_payment_account(
    State(state): State<ManagementState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    remove_record::<PaymentAccount>(&state.repo, &id).await
}

pub async fn get_gateway(State(state): State<ManagementState>) -> Json<PaymentGatewayConfig> {
    Json(state.repo.gateway_config())
}

pub async fn update_gateway(
    State(state): State<ManagementState>,
    Json(config): Json<PaymentGatewayConfig>,
) -> ApiResult<Json<PaymentGatewayConfig>> {
    let config = state.repo.set_gateway_config(config).await?;
    info!(provider = ?config.provider, active = config.is_active, "Gateway settings saved");
    Ok(Json(config))
}

// ─── Admin profile ─────────────────────────────────────────────────────────

fn public_profile(mut profile: AdminProfile) -> AdminProfile {
    profile.password = None;
    profile
}

pub async fn get_profile(State(state): State<ManagementState>) -> Json<AdminProfile> {
    Json(public_profile(state.repo.admin_profile()))
}

pub async fn update_profile(
    State(state): State<ManagementState>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<AdminProfile>> {
    if let Some(username) = &req.username {
        require_text("username", username)?;
    }
    if let Some(day) = req.billing_day {
        if !(1..=28).contains(&day) {
            return Err(ApiError::validation("billingDay must be within 1..=28"));
        }
    }

    let profile = state
        .repo
        .transact(|ds| {
            let p = &mut ds.admin_profile;
            if let Some(name) = req.name {
                p.name = name;
            }
            if let Some(business_name) = req.business_name {
                p.business_name = business_name;
            }
            if let Some(username) = req.username {
                p.username = username;
            }
            if let Some(password) = req.password.filter(|s| !s.is_empty()) {
                p.password = Some(password);
            }
            if req.auto_billing_enabled.is_some() {
                p.auto_billing_enabled = req.auto_billing_enabled;
            }
            if req.billing_day.is_some() {
                p.billing_day = req.billing_day;
            }
            Ok(p.clone())
        })
        .await?;
    info!(
        auto_billing = profile.auto_billing(),
        billing_day = profile.billing_day(),
        "Admin profile updated"
    );
    Ok(Json(public_profile(profile)))
}
