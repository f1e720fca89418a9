//! The four migration step implementations. Each returns a debug
//! payload for the step report; errors are caught by the orchestrator
//! and recorded as a failed step.

use rusqlite::Connection;
use serde_json::{json, Value};

use crate::db::{queries, ConfigScope};
use crate::error::Result;

use super::paths::{
    ConfigPathMapping, PathEnvironment, CONFIG_PATH_MAPPINGS, LEGACY_ENVIRONMENT_PATH,
    LEGACY_METHOD_CODES, LEGACY_MODULE_CODES,
};
use super::MigrationSelection;

pub struct StepContext<'a> {
    pub conn: &'a Connection,
    pub selection: &'a MigrationSelection,
}

fn scope_label(scope: ConfigScope) -> String {
    match scope {
        ConfigScope::Default => "default".to_string(),
        ConfigScope::Store(id) => format!("store:{id}"),
    }
}

fn all_scopes(conn: &Connection) -> Result<Vec<ConfigScope>> {
    let mut scopes = vec![ConfigScope::Default];
    scopes.extend(queries::list_store_ids(conn)?.into_iter().map(ConfigScope::Store));
    Ok(scopes)
}

fn mapping_applies(mapping: &ConfigPathMapping, sandbox: bool) -> bool {
    match mapping.environment {
        PathEnvironment::Any => true,
        PathEnvironment::Production => !sandbox,
        PathEnvironment::Sandbox => sandbox,
    }
}

/// Configuration transfer: for every mapping row in
/// the environment-appropriate set, at the default scope and each store
/// scope, copy the resolved legacy value when the resolved new value
/// differs. Resolution includes inheritance, so a store that would
/// inherit the freshly written default is not given a spurious override.
pub fn transfer_configuration(ctx: &StepContext) -> Result<Value> {
    let legacy_env = queries::resolve_config(ctx.conn, ConfigScope::Default, LEGACY_ENVIRONMENT_PATH)?
        .unwrap_or_else(|| "production".to_string());
    let sandbox = legacy_env == "sandbox";

    let scopes = all_scopes(ctx.conn)?;
    let mut transferred: Vec<Value> = Vec::new();

    for mapping in CONFIG_PATH_MAPPINGS {
        if !mapping_applies(mapping, sandbox) {
            continue;
        }
        for &scope in &scopes {
            let legacy_value = match queries::resolve_config(ctx.conn, scope, mapping.legacy)? {
                Some(v) if !v.is_empty() => v,
                _ => continue,
            };
            let current = queries::resolve_config(ctx.conn, scope, mapping.new)?;
            if current.as_deref() == Some(legacy_value.as_str()) {
                continue;
            }
            queries::set_config(ctx.conn, scope, mapping.new, &legacy_value)?;
            tracing::debug!(
                path = mapping.new,
                scope = %scope_label(scope),
                "transferred legacy config value"
            );
            transferred.push(json!({
                "path": mapping.new,
                "scope": scope_label(scope),
            }));
        }
    }

    Ok(json!({
        "environment": legacy_env,
        "paths_transferred": transferred.len(),
        "paths": transferred,
    }))
}

/// Customer-data transfer: copy the legacy gateway customer id into
/// `braintree_customer_id` for every customer lacking one. Safe to
/// re-run; populated rows are never overwritten even when the legacy
/// value differs.
pub fn transfer_customer_data(ctx: &StepContext) -> Result<Value> {
    let pending = queries::customers_pending_migration(ctx.conn)?;
    let mut migrated = 0usize;

    for (customer_id, gateway_customer_id) in &pending {
        if queries::set_customer_payment_ref_if_absent(ctx.conn, *customer_id, gateway_customer_id)? {
            migrated += 1;
        }
    }

    Ok(json!({
        "customers_examined": pending.len(),
        "customers_migrated": migrated,
    }))
}

/// Legacy disable/remove. Disablement clears the legacy methods'
/// `active` flags at the default scope and drops any store overrides so
/// checkout stops offering them everywhere. Removal deregisters the
/// legacy module and is only attempted once disablement has succeeded.
pub fn disable_legacy(ctx: &StepContext) -> Result<Value> {
    let scopes = all_scopes(ctx.conn)?;
    let mut methods_disabled: Vec<String> = Vec::new();

    for code in LEGACY_METHOD_CODES {
        let active_path = format!("payment/{code}/active");
        queries::set_config(ctx.conn, ConfigScope::Default, &active_path, "0")?;
        for &scope in &scopes {
            if let ConfigScope::Store(_) = scope {
                queries::delete_config(ctx.conn, scope, &active_path)?;
            }
        }
        methods_disabled.push((*code).to_string());
    }

    let mut modules_removed: Vec<String> = Vec::new();
    if ctx.selection.remove_legacy {
        for code in LEGACY_MODULE_CODES {
            if queries::remove_module(ctx.conn, code)? {
                modules_removed.push((*code).to_string());
            }
        }
    }

    Ok(json!({
        "methods_disabled": methods_disabled,
        "modules_removed": modules_removed,
    }))
}

/// Keys the new extension's info blocks read from additional_information.
const INFO_TRANSACTION_ID: &str = "transaction_id";
const INFO_CC_LAST4: &str = "cc_last4";
const INFO_CC_TYPE: &str = "cc_type";
const INFO_SOURCE_METHOD: &str = "migrated_from";

/// Order-transaction-info backfill: copy the legacy payment columns into
/// the additional_information JSON the new extension renders, so
/// historical order views keep showing payment details after cutover.
/// Rows already carrying the transaction key are left untouched.
pub fn backfill_order_transaction_info(ctx: &StepContext) -> Result<Value> {
    let payments = queries::legacy_order_payments(ctx.conn, LEGACY_METHOD_CODES)?;
    let mut backfilled = 0usize;
    let mut skipped = 0usize;

    for payment in &payments {
        let mut info = payment.info();
        if info.contains_key(INFO_TRANSACTION_ID) {
            skipped += 1;
            continue;
        }
        let Some(trans_id) = payment.cc_trans_id.as_deref() else {
            skipped += 1;
            continue;
        };

        info.insert(INFO_TRANSACTION_ID.into(), json!(trans_id));
        if let Some(last4) = payment.cc_last4.as_deref() {
            info.insert(INFO_CC_LAST4.into(), json!(last4));
        }
        if let Some(cc_type) = payment.cc_type.as_deref() {
            info.insert(INFO_CC_TYPE.into(), json!(cc_type));
        }
        info.insert(INFO_SOURCE_METHOD.into(), json!(payment.method));

        let serialized = serde_json::to_string(&Value::Object(info))?;
        queries::set_payment_additional_information(ctx.conn, payment.order_id, &serialized)?;
        backfilled += 1;
    }

    Ok(json!({
        "payments_backfilled": backfilled,
        "payments_skipped": skipped,
    }))
}
