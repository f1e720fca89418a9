//! Test utilities and fixtures for integration tests

#![allow(dead_code)]

use axum::extract::connect_info::MockConnectInfo;
use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::net::SocketAddr;

pub use braintree_bridge::db::{
    init_audit_db, init_db, queries, AppState, ConfigCache, ConfigScope, DbPool,
};
pub use braintree_bridge::ens::IpAllowlist;
pub use braintree_bridge::handlers;
pub use braintree_bridge::migration::paths;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// In-memory pool with the main schema. Capped at one connection so
/// every checkout sees the same in-memory database.
pub fn test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    pool
}

/// In-memory pool with the audit schema.
pub fn test_audit_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_audit_db(&conn).unwrap();
    }
    pool
}

/// Application state backed by in-memory databases. The ENS allowlist
/// trusts loopback only, matching the mock peer used by webhook tests.
pub fn test_state() -> AppState {
    AppState {
        db: test_pool(),
        audit: test_audit_pool(),
        audit_log_enabled: true,
        config_cache: ConfigCache::new(),
        admin_api_key: TEST_ADMIN_KEY.to_string(),
        ens_allowlist: IpAllowlist::from_cidrs("127.0.0.1/32,::1/128").unwrap(),
        http_client: reqwest::Client::new(),
    }
}

/// Router serving the admin API with auth wired in.
pub fn admin_app(state: AppState) -> Router {
    handlers::admin::router(state.clone()).with_state(state)
}

/// Router serving the webhook endpoint, with the peer address injected
/// (the real server supplies it via connect info).
pub fn webhook_app(state: AppState, peer: SocketAddr) -> Router {
    Router::new()
        .merge(handlers::webhooks::router())
        .layer(MockConnectInfo(peer))
        .with_state(state)
}

pub fn trusted_peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 41000))
}

pub fn untrusted_peer() -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 9], 41000))
}

/// Seed the default scope with a legacy extension still holding live
/// production credentials. Leaves the new extension unconfigured so the
/// migration gate opens.
pub fn seed_legacy_config(state: &AppState) {
    let conn = state.db.get().unwrap();
    queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_ENVIRONMENT_PATH, "production")
        .unwrap();
    queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_MERCHANT_ID_PATH, "legacy_merchant")
        .unwrap();
    queries::set_config(
        &conn,
        ConfigScope::Default,
        "payment/legacy_braintree/public_key",
        "legacy_public",
    )
    .unwrap();
    queries::set_config(
        &conn,
        ConfigScope::Default,
        "payment/legacy_braintree/private_key",
        "legacy_private",
    )
    .unwrap();
    queries::register_module(&conn, "legacy_braintree", true).unwrap();
}

/// Register a merchant id the ENS pipeline will accept.
pub fn seed_known_merchant(state: &AppState, merchant_id: &str) {
    let conn = state.db.get().unwrap();
    queries::set_config(&conn, ConfigScope::Default, paths::NEW_MERCHANT_ID_PATH, merchant_id)
        .unwrap();
}

pub fn create_test_store(state: &AppState, code: &str) -> i64 {
    let conn = state.db.get().unwrap();
    queries::create_store(&conn, code, &format!("Test Store {code}")).unwrap()
}

/// Customer with an optional legacy gateway reference.
pub fn create_test_customer(state: &AppState, email: &str, legacy_ref: Option<&str>) -> i64 {
    let conn = state.db.get().unwrap();
    let id = queries::create_customer(&conn, email, None).unwrap();
    if let Some(gateway_id) = legacy_ref {
        queries::set_legacy_customer_ref(&conn, id, gateway_id).unwrap();
    }
    id
}

/// Order in the given state with one payment row.
pub fn create_test_order(
    state: &AppState,
    increment_id: &str,
    store_id: i64,
    order_state: &str,
    method: &str,
    cc_trans_id: Option<&str>,
) -> i64 {
    let conn = state.db.get().unwrap();
    let id = queries::create_order(&conn, increment_id, store_id, order_state).unwrap();
    queries::create_order_payment(&conn, id, method, cc_trans_id, Some("1111"), Some("VI"), None)
        .unwrap();
    id
}

pub fn order_state(state: &AppState, order_id: i64) -> String {
    let conn = state.db.get().unwrap();
    queries::get_order_by_id(&conn, order_id).unwrap().unwrap().state
}

pub fn audit_count(state: &AppState, action: &str) -> i64 {
    let conn = state.audit.get().unwrap();
    queries::count_audit_logs(&conn, action).unwrap()
}
