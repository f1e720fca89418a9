//! Process-wide predicate deciding whether the migration surface is
//! available at all.

use rusqlite::Connection;

use crate::db::{queries, ConfigCache, ConfigScope};
use crate::error::Result;

use super::paths::{
    LEGACY_MERCHANT_ID_PATH, LEGACY_MODULE_CODES, MIGRATION_COMPLETE_PATH, NEW_MERCHANT_ID_PATH,
    NEW_SANDBOX_MERCHANT_ID_PATH,
};

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// True iff the legacy extension is detected, the new extension has no
/// live credentials yet, and the completion flag is unset.
///
/// Called on every admin status render, so reads go through the config
/// cache. No side effects.
pub fn can_run(conn: &Connection, cache: &ConfigCache) -> Result<bool> {
    if is_complete(conn, cache)? {
        return Ok(false);
    }

    let legacy_config = cache.resolve(conn, ConfigScope::Default, LEGACY_MERCHANT_ID_PATH)?;
    let legacy_module = LEGACY_MODULE_CODES
        .iter()
        .try_fold(false, |found, code| -> Result<bool> {
            Ok(found || queries::module_registered(conn, code)?)
        })?;
    if !is_set(&legacy_config) && !legacy_module {
        return Ok(false);
    }

    let merchant = cache.resolve(conn, ConfigScope::Default, NEW_MERCHANT_ID_PATH)?;
    let sandbox_merchant =
        cache.resolve(conn, ConfigScope::Default, NEW_SANDBOX_MERCHANT_ID_PATH)?;
    Ok(!is_set(&merchant) && !is_set(&sandbox_merchant))
}

/// Whether the one-shot completion flag has been latched.
pub fn is_complete(conn: &Connection, cache: &ConfigCache) -> Result<bool> {
    let flag = cache.resolve(conn, ConfigScope::Default, MIGRATION_COMPLETE_PATH)?;
    Ok(flag.as_deref() == Some("1"))
}

/// Latch the completion flag. Store-wide state: once set, the migration
/// UI must never reappear.
pub fn mark_complete(conn: &Connection, cache: &ConfigCache) -> Result<()> {
    queries::set_config(conn, ConfigScope::Default, MIGRATION_COMPLETE_PATH, "1")?;
    cache.invalidate();
    Ok(())
}
