//! Management API router: public auth routes plus the admin, collector and
//! customer groups under /api/v1, each behind its own role check.

use crate::auth;
use crate::handlers::{self, ManagementState};
use crate::portal;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;

/// Build the management router with all endpoints.
/// Returns a Router that should be merged into the main app.
pub fn management_router(state: ManagementState) -> Router {
    let admin = Router::new()
        .route("/data", get(handlers::get_data))
        .route("/dashboard", get(handlers::dashboard))
        // Customers
        .route("/customers", get(handlers::list_customers).post(handlers::create_customer))
        .route("/customers/bulk-status", post(handlers::bulk_customer_status))
        .route("/customers/:id", get(handlers::get_customer).put(handlers::update_customer).delete(handlers::delete_customer))
        .route("/customers/:id/bills", get(handlers::customer_bills))
        // Packages
        .route("/packages", get(handlers::list_packages).post(handlers::create_package))
        .route("/packages/:id", put(handlers::update_package).delete(handlers::delete_package))
        // Bills
        .route("/bills", get(handlers::list_bills))
        .route("/bills/generate", post(handlers::generate_bills))
        .route("/bills/bulk-pay", post(handlers::bulk_mark_paid))
        .route("/bills/bulk-delete", post(handlers::bulk_delete_bills))
        .route("/bills/assign", post(handlers::assign_collector))
        .route("/bills/:id", delete(handlers::delete_bill))
        .route("/bills/:id/pay", post(handlers::mark_paid))
        .route("/bills/:id/reject", post(handlers::reject_payment))
        .route("/bills/:id/reminder", get(handlers::bill_reminder))
        .route("/bills/:id/penalty", get(handlers::suggested_penalty))
        // Collectors
        .route("/collectors", get(handlers::list_collectors).post(handlers::create_collector))
        .route("/collectors/:id", put(handlers::update_collector).delete(handlers::delete_collector))
        .route("/collectors/:id/stats", get(handlers::collector_stats))
        // Routers
        .route("/routers", get(handlers::list_routers).post(handlers::create_router))
        .route("/routers/sync-status", get(handlers::sync_statuses))
        .route("/routers/:id", put(handlers::update_router).delete(handlers::delete_router))
        .route("/routers/:id/test", post(handlers::test_router))
        .route("/routers/:id/sync/:customer_id", post(handlers::sync_router_user))
        .route("/mikrotik-users", get(handlers::list_mikrotik_users))
        .route("/mikrotik-users/:id", delete(handlers::delete_mikrotik_user))
        // Payment settings
        .route("/payment-accounts", get(handlers::list_payment_accounts).post(handlers::create_payment_account))
        .route("/payment-accounts/:id", put(handlers::update_payment_account).delete(handlers::delete_payment_account))
        .route("/gateway", get(handlers::get_gateway).put(handlers::update_gateway))
        // Profile
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    let collector = Router::new()
        .route("/me", get(portal::collector_me).put(portal::collector_update_me))
        .route("/bills", get(portal::collector_bills))
        .route("/bills/:id/pay", post(portal::collector_mark_paid))
        .route("/dashboard", get(portal::collector_dashboard))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_collector));

    let customer = Router::new()
        .route("/me", get(portal::portal_me))
        .route("/bills", get(portal::portal_bills))
        .route("/bills/:id/confirm", post(portal::portal_confirm_payment))
        .route("/password", post(portal::portal_change_password))
        .route("/packages", get(portal::portal_packages))
        .route("/payment-options", get(portal::portal_payment_options))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_customer));

    Router::new()
        .route("/api/v1/auth/login", post(handlers::handle_login))
        .route("/api/v1/auth/logout", post(handlers::handle_logout))
        .nest("/api/v1/admin", admin)
        .nest("/api/v1/collector", collector)
        .nest("/api/v1/portal", customer)
        .with_state(state)
}
