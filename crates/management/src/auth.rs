//! Login resolution and bearer-token sessions.
//!
//! One login form serves all three roles. Credentials are tried against the
//! admin profile first, then collectors, then customers; the first match
//! wins. A session token carries exactly one role.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use tracing::{debug, info};
use wifinet_core::config::AuthConfig;
use wifinet_core::{digits_only, Dataset, WifinetError, WifinetResult};

use crate::error::ApiError;
use crate::handlers::ManagementState;
use crate::models::{LoginRequest, Role};

const TOKEN_PREFIX: &str = "wn_";

/// Who a set of credentials belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub role: Role,
    pub subject_id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub subject_id: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

fn same_phone(stored: &str, given: &str) -> bool {
    let stored = digits_only(stored);
    !stored.is_empty() && stored == digits_only(given)
}

/// A blank stored password counts as unset, so the default applies.
fn stored_password(password: &Option<String>) -> Option<&str> {
    password.as_deref().filter(|p| !p.is_empty())
}

/// Match credentials against the dataset.
pub fn resolve_login(
    dataset: &Dataset,
    config: &AuthConfig,
    req: &LoginRequest,
) -> WifinetResult<Principal> {
    let username = req.username.trim();

    let admin = &dataset.admin_profile;
    let admin_password =
        stored_password(&admin.password).unwrap_or(&config.default_admin_password);
    if username == admin.username && req.password == admin_password {
        return Ok(Principal {
            role: Role::Admin,
            subject_id: admin.username.clone(),
            name: admin.name.clone(),
        });
    }

    let upper = username.to_uppercase();
    let collector = dataset.collectors.iter().find(|c| {
        let matches = same_phone(&c.phone, username) || c.id == upper;
        let password =
            stored_password(&c.password).unwrap_or(&config.default_collector_password);
        matches && req.password == password
    });
    if let Some(c) = collector {
        return Ok(Principal {
            role: Role::Collector,
            subject_id: c.id.clone(),
            name: c.name.clone(),
        });
    }

    let customer = dataset.customers.iter().find(|c| {
        let matches = c.id.to_uppercase() == upper || same_phone(&c.phone, username);
        let password_ok = match stored_password(&c.password) {
            Some(password) => password == req.password,
            None => same_phone(&c.phone, &req.password),
        };
        matches && password_ok
    });
    if let Some(c) = customer {
        return Ok(Principal {
            role: Role::Customer,
            subject_id: c.id.clone(),
            name: c.name.clone(),
        });
    }

    Err(WifinetError::Auth("Invalid credentials".to_string()))
}

/// Generate a random bearer token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    format!(
        "{}{}",
        TOKEN_PREFIX,
        bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
    )
}

// ─── Sessions ──────────────────────────────────────────────────────────────

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn open(&self, principal: Principal) -> Session {
        let session = Session {
            token: generate_token(),
            role: principal.role,
            subject_id: principal.subject_id,
            name: principal.name,
            expires_at: Utc::now() + self.ttl,
        };
        self.sessions.insert(session.token.clone(), session.clone());
        info!(role = ?session.role, subject = %session.subject_id, "Session opened");
        session
    }

    /// Live session for `token`. Expired sessions are dropped on lookup.
    pub fn get(&self, token: &str) -> Option<Session> {
        let now = Utc::now();
        self.sessions.remove_if(token, |_, s| s.expires_at <= now);
        self.sessions.get(token).map(|s| s.clone())
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ─── Middleware ────────────────────────────────────────────────────────────

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| t.starts_with(TOKEN_PREFIX))
}

async fn require_role(state: ManagementState, role: Role, mut req: Request, next: Next) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::unauthorized("Authorization header with Bearer token required")
            .into_response();
    };
    let Some(session) = state.sessions.get(token) else {
        return ApiError::unauthorized("Invalid or expired bearer token").into_response();
    };
    if session.role != role {
        debug!(expected = ?role, actual = ?session.role, "Session role rejected");
        return ApiError(WifinetError::Forbidden(format!(
            "this endpoint requires a {role:?} session"
        )))
        .into_response();
    }
    req.extensions_mut().insert(session);
    next.run(req).await
}

pub async fn require_admin(State(state): State<ManagementState>, req: Request, next: Next) -> Response {
    require_role(state, Role::Admin, req, next).await
}

pub async fn require_collector(
    State(state): State<ManagementState>,
    req: Request,
    next: Next,
) -> Response {
    require_role(state, Role::Collector, req, next).await
}

pub async fn require_customer(
    State(state): State<ManagementState>,
    req: Request,
    next: Next,
) -> Response {
    require_role(state, Role::Customer, req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wifinet_core::{Collector, CollectorStatus};
    use wifinet_store::seed::default_dataset;

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    fn dataset() -> Dataset {
        let mut ds = default_dataset();
        ds.collectors.push(Collector {
            id: "COLA1B2".into(),
            name: "Andi".into(),
            phone: "0811-2222-3333".into(),
            password: None,
            status: CollectorStatus::Active,
            joined_at: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        });
        ds
    }

    #[test]
    fn test_admin_default_password() {
        let mut ds = dataset();
        ds.admin_profile.password = None;
        let p = resolve_login(&ds, &AuthConfig::default(), &login("admin", "admin123")).unwrap();
        assert_eq!(p.role, Role::Admin);
        assert!(resolve_login(&ds, &AuthConfig::default(), &login("admin", "nope")).is_err());
    }

    #[test]
    fn test_collector_by_phone_or_id() {
        let ds = dataset();
        let cfg = AuthConfig::default();
        let by_phone = resolve_login(&ds, &cfg, &login("081122223333", "123456")).unwrap();
        assert_eq!(by_phone.role, Role::Collector);
        let by_id = resolve_login(&ds, &cfg, &login("cola1b2", "123456")).unwrap();
        assert_eq!(by_id.subject_id, "COLA1B2");
    }

    #[test]
    fn test_customer_password_or_phone() {
        let ds = dataset();
        let cfg = AuthConfig::default();

        // CUST001 has a password set in the default dataset.
        let p = resolve_login(&ds, &cfg, &login("cust001", "123")).unwrap();
        assert_eq!((p.role, p.subject_id.as_str()), (Role::Customer, "CUST001"));

        // CUST002 has none, so the phone number doubles as the password.
        let siti = ds.customer("CUST002").unwrap();
        let phone = digits_only(&siti.phone);
        let p = resolve_login(&ds, &cfg, &login(&phone, &phone)).unwrap();
        assert_eq!(p.subject_id, "CUST002");

        assert!(resolve_login(&ds, &cfg, &login("CUST002", "wrong")).is_err());
    }

    #[test]
    fn test_empty_phone_never_matches() {
        let mut ds = dataset();
        ds.customers[1].phone = String::new();
        assert!(resolve_login(&ds, &AuthConfig::default(), &login("CUST002", "")).is_err());
    }

    #[test]
    fn test_blank_password_falls_back_to_default() {
        let mut ds = dataset();
        ds.collectors[0].password = Some(String::new());
        ds.customers[0].password = Some(String::new());
        let cfg = AuthConfig::default();

        assert!(resolve_login(&ds, &cfg, &login("COLA1B2", "")).is_err());
        assert!(resolve_login(&ds, &cfg, &login("COLA1B2", "123456")).is_ok());
        assert!(resolve_login(&ds, &cfg, &login("CUST001", "")).is_err());
        let p = resolve_login(&ds, &cfg, &login("CUST001", "081234567890")).unwrap();
        assert_eq!(p.subject_id, "CUST001");
    }

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new(24);
        let session = store.open(Principal {
            role: Role::Customer,
            subject_id: "CUST001".into(),
            name: "Budi".into(),
        });
        assert!(session.token.starts_with(TOKEN_PREFIX));
        assert_eq!(session.token.len(), TOKEN_PREFIX.len() + 64);
        assert!(store.get(&session.token).is_some());
        assert!(store.revoke(&session.token));
        assert!(store.get(&session.token).is_none());

        let expired = SessionStore::new(0);
        let s = expired.open(Principal {
            role: Role::Admin,
            subject_id: "admin".into(),
            name: "Admin".into(),
        });
        assert!(expired.get(&s.token).is_none());
        assert!(expired.is_empty());
    }
}
