mod schema;
pub mod queries;

pub use schema::{init_audit_db, init_db};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::ens::IpAllowlist;
use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Configuration scope: the hierarchy level a value is stored at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    Default,
    Store(i64),
}

impl ConfigScope {
    pub fn as_parts(&self) -> (&'static str, i64) {
        match self {
            ConfigScope::Default => ("default", 0),
            ConfigScope::Store(id) => ("stores", *id),
        }
    }
}

/// Process-local read cache in front of config_data.
///
/// Migration writes bypass the cache and invalidate it afterwards so
/// subsequent reads observe new values immediately.
#[derive(Clone, Default)]
pub struct ConfigCache {
    inner: Arc<RwLock<HashMap<(ConfigScope, String), Option<String>>>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a config value at the given scope, falling back to the
    /// default scope, caching the result either way.
    pub fn resolve(
        &self,
        conn: &Connection,
        scope: ConfigScope,
        path: &str,
    ) -> Result<Option<String>> {
        let key = (scope, path.to_string());
        if let Some(hit) = self.inner.read().expect("config cache poisoned").get(&key) {
            return Ok(hit.clone());
        }
        let value = queries::resolve_config(conn, scope, path)?;
        self.inner
            .write()
            .expect("config cache poisoned")
            .insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self) {
        self.inner.write().expect("config cache poisoned").clear();
    }
}

/// Application state holding database pools and configuration
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (config, stores, customers, orders)
    pub db: DbPool,
    /// Audit log database pool (separate file to isolate growth)
    pub audit: DbPool,
    pub audit_log_enabled: bool,
    pub config_cache: ConfigCache,
    /// Bearer key for /admin routes
    pub admin_api_key: String,
    /// Source ranges trusted to deliver ENS batches
    pub ens_allowlist: IpAllowlist,
    /// Shared outbound client for Braintree calls (timeout set at build)
    pub http_client: reqwest::Client,
}

pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager).map_err(Into::into)
}
