use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ActorType, Customer, Order, OrderPayment};

use super::ConfigScope;

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Scoped configuration
// ---------------------------------------------------------------------------

/// Read the explicit value stored at exactly this scope (no inheritance).
pub fn get_config_at(conn: &Connection, scope: ConfigScope, path: &str) -> Result<Option<String>> {
    let (scope_name, scope_id) = scope.as_parts();
    conn.query_row(
        "SELECT value FROM config_data WHERE scope = ?1 AND scope_id = ?2 AND path = ?3",
        params![scope_name, scope_id, path],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()
    .map(Option::flatten)
    .map_err(Into::into)
}

/// Resolve a value at a scope with inheritance: an explicit row at the
/// scope wins, otherwise the default-scope row applies.
pub fn resolve_config(conn: &Connection, scope: ConfigScope, path: &str) -> Result<Option<String>> {
    if let ConfigScope::Store(_) = scope {
        let (scope_name, scope_id) = scope.as_parts();
        let explicit: Option<Option<String>> = conn
            .query_row(
                "SELECT value FROM config_data WHERE scope = ?1 AND scope_id = ?2 AND path = ?3",
                params![scope_name, scope_id, path],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(value) = explicit {
            return Ok(value);
        }
    }
    get_config_at(conn, ConfigScope::Default, path)
}

/// Upsert a value at an explicit scope.
pub fn set_config(conn: &Connection, scope: ConfigScope, path: &str, value: &str) -> Result<()> {
    let (scope_name, scope_id) = scope.as_parts();
    conn.execute(
        "INSERT INTO config_data (scope, scope_id, path, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (scope, scope_id, path) DO UPDATE SET value = excluded.value",
        params![scope_name, scope_id, path, value],
    )?;
    Ok(())
}

/// Delete the explicit row at a scope (store reverts to inheriting).
pub fn delete_config(conn: &Connection, scope: ConfigScope, path: &str) -> Result<bool> {
    let (scope_name, scope_id) = scope.as_parts();
    let affected = conn.execute(
        "DELETE FROM config_data WHERE scope = ?1 AND scope_id = ?2 AND path = ?3",
        params![scope_name, scope_id, path],
    )?;
    Ok(affected > 0)
}

/// All merchant ids configured anywhere (production or sandbox key, any
/// scope). Used to validate the merchant attribute on ENS batches.
pub fn list_configured_merchant_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT value FROM config_data
         WHERE path IN ('payment/braintree/merchant_id', 'payment/braintree/sandbox_merchant_id')
           AND value IS NOT NULL AND value != ''",
    )?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

pub fn create_store(conn: &Connection, code: &str, name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO stores (code, name) VALUES (?1, ?2)",
        params![code, name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_store_ids(conn: &Connection) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM stores ORDER BY id")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Customers and legacy payment references
// ---------------------------------------------------------------------------

pub fn create_customer(
    conn: &Connection,
    email: &str,
    braintree_customer_id: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO customers (email, braintree_customer_id) VALUES (?1, ?2)",
        params![email, braintree_customer_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_customer_by_id(conn: &Connection, id: i64) -> Result<Option<Customer>> {
    conn.query_row(
        "SELECT id, email, braintree_customer_id FROM customers WHERE id = ?1",
        params![id],
        |row| {
            Ok(Customer {
                id: row.get(0)?,
                email: row.get(1)?,
                braintree_customer_id: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

pub fn set_legacy_customer_ref(
    conn: &Connection,
    customer_id: i64,
    gateway_customer_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO legacy_customer_refs (customer_id, gateway_customer_id) VALUES (?1, ?2)
         ON CONFLICT (customer_id) DO UPDATE SET gateway_customer_id = excluded.gateway_customer_id",
        params![customer_id, gateway_customer_id],
    )?;
    Ok(())
}

/// Customers holding a legacy gateway reference but no new-extension one.
/// These are the only rows the customer-data step may touch.
pub fn customers_pending_migration(conn: &Connection) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, l.gateway_customer_id
         FROM customers c
         JOIN legacy_customer_refs l ON l.customer_id = c.id
         WHERE c.braintree_customer_id IS NULL
         ORDER BY c.id",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Set the processor customer reference only if none is present.
/// Returns false when the row already carried a value (left untouched).
pub fn set_customer_payment_ref_if_absent(
    conn: &Connection,
    customer_id: i64,
    braintree_customer_id: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE customers SET braintree_customer_id = ?2
         WHERE id = ?1 AND braintree_customer_id IS NULL",
        params![customer_id, braintree_customer_id],
    )?;
    Ok(affected > 0)
}

// ---------------------------------------------------------------------------
// Orders and payments
// ---------------------------------------------------------------------------

pub fn create_order(
    conn: &Connection,
    increment_id: &str,
    store_id: i64,
    state: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO orders (increment_id, store_id, state, status, created_at)
         VALUES (?1, ?2, ?3, ?3, ?4)",
        params![increment_id, store_id, state, now()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn create_order_payment(
    conn: &Connection,
    order_id: i64,
    method: &str,
    cc_trans_id: Option<&str>,
    cc_last4: Option<&str>,
    cc_type: Option<&str>,
    additional_information: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO order_payments
         (order_id, method, cc_trans_id, cc_last4, cc_type, additional_information)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![order_id, method, cc_trans_id, cc_last4, cc_type, additional_information],
    )?;
    Ok(())
}

fn order_from_row(row: &rusqlite::Row) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        increment_id: row.get(1)?,
        store_id: row.get(2)?,
        state: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const ORDER_COLS: &str = "id, increment_id, store_id, state, status, created_at";

pub fn get_order_by_id(conn: &Connection, id: i64) -> Result<Option<Order>> {
    conn.query_row(
        &format!("SELECT {ORDER_COLS} FROM orders WHERE id = ?1"),
        params![id],
        order_from_row,
    )
    .optional()
    .map_err(Into::into)
}

pub fn get_order_by_increment_id(conn: &Connection, increment_id: &str) -> Result<Option<Order>> {
    conn.query_row(
        &format!("SELECT {ORDER_COLS} FROM orders WHERE increment_id = ?1"),
        params![increment_id],
        order_from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Locate an order via the processor transaction id on its payment row.
pub fn get_order_by_transaction_id(conn: &Connection, transaction_id: &str) -> Result<Option<Order>> {
    conn.query_row(
        "SELECT o.id, o.increment_id, o.store_id, o.state, o.status, o.created_at
         FROM orders o
         JOIN order_payments p ON p.order_id = o.id
         WHERE p.cc_trans_id = ?1",
        params![transaction_id],
        order_from_row,
    )
    .optional()
    .map_err(Into::into)
}

pub fn cancel_order(conn: &Connection, order_id: i64) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE orders SET state = 'canceled', status = 'canceled'
         WHERE id = ?1 AND state != 'canceled'",
        params![order_id],
    )?;
    Ok(affected > 0)
}

pub fn get_order_payment(conn: &Connection, order_id: i64) -> Result<Option<OrderPayment>> {
    conn.query_row(
        "SELECT order_id, method, cc_trans_id, cc_last4, cc_type, additional_information
         FROM order_payments WHERE order_id = ?1",
        params![order_id],
        |row| {
            Ok(OrderPayment {
                order_id: row.get(0)?,
                method: row.get(1)?,
                cc_trans_id: row.get(2)?,
                cc_last4: row.get(3)?,
                cc_type: row.get(4)?,
                additional_information: row.get(5)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Payment rows created by the legacy methods, candidates for the
/// transaction-info backfill.
pub fn legacy_order_payments(conn: &Connection, legacy_methods: &[&str]) -> Result<Vec<OrderPayment>> {
    let placeholders = legacy_methods
        .iter()
        .enumerate()
        .map(|(i, _)| format!("?{}", i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT order_id, method, cc_trans_id, cc_last4, cc_type, additional_information
         FROM order_payments WHERE method IN ({placeholders}) ORDER BY order_id"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(legacy_methods.iter()), |row| {
            Ok(OrderPayment {
                order_id: row.get(0)?,
                method: row.get(1)?,
                cc_trans_id: row.get(2)?,
                cc_last4: row.get(3)?,
                cc_type: row.get(4)?,
                additional_information: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn set_payment_additional_information(
    conn: &Connection,
    order_id: i64,
    additional_information: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE order_payments SET additional_information = ?2 WHERE order_id = ?1",
        params![order_id, additional_information],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Module registry
// ---------------------------------------------------------------------------

pub fn register_module(conn: &Connection, code: &str, active: bool) -> Result<()> {
    conn.execute(
        "INSERT INTO modules (code, active) VALUES (?1, ?2)
         ON CONFLICT (code) DO UPDATE SET active = excluded.active",
        params![code, active],
    )?;
    Ok(())
}

pub fn module_registered(conn: &Connection, code: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM modules WHERE code = ?1",
        params![code],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn remove_module(conn: &Connection, code: &str) -> Result<bool> {
    let affected = conn.execute("DELETE FROM modules WHERE code = ?1", params![code])?;
    Ok(affected > 0)
}

// ---------------------------------------------------------------------------
// Audit log (audit database)
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn create_audit_log(
    conn: &Connection,
    enabled: bool,
    actor_type: ActorType,
    action: &str,
    resource_type: &str,
    resource_id: &str,
    details: Option<&serde_json::Value>,
    ip: Option<&str>,
    user_agent: Option<&str>,
) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    conn.execute(
        "INSERT INTO audit_logs
         (id, actor_type, action, resource_type, resource_id, details, ip, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            gen_id(),
            actor_type.as_ref(),
            action,
            resource_type,
            resource_id,
            details.map(|d| d.to_string()),
            ip,
            user_agent,
            now(),
        ],
    )?;
    Ok(())
}

/// Count audit rows for a given action. Used by tests and the status page.
pub fn count_audit_logs(conn: &Connection, action: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM audit_logs WHERE action = ?1",
        params![action],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
