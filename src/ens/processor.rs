//! Per-event business rules for inbound ENS batches.

use rusqlite::Connection;

use crate::db::queries;
use crate::models::Order;

use super::parser::{EventBatch, EventRecord};
use super::WebhookTally;

/// Event names signalling a fraud/risk outcome that cancels the order.
const CANCEL_EVENTS: &[&str] = &["dispute_lost", "suspected_fraud"];

/// Recognized informational events; no side effect, counted as success.
const NOOP_EVENTS: &[&str] = &["dispute_opened", "dispute_won", "risk_cleared"];

fn resolve_order(conn: &Connection, event: &EventRecord) -> Option<Order> {
    if let Some(increment_id) = event.order_increment_id.as_deref() {
        match queries::get_order_by_increment_id(conn, increment_id) {
            Ok(Some(order)) => return Some(order),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(increment_id, error = %e, "order lookup failed");
                return None;
            }
        }
    }
    if let Some(transaction_id) = event.transaction_id.as_deref() {
        match queries::get_order_by_transaction_id(conn, transaction_id) {
            Ok(order) => return order,
            Err(e) => {
                tracing::error!(transaction_id, error = %e, "transaction lookup failed");
                return None;
            }
        }
    }
    None
}

/// Apply one event. Returns true on success, false on failure; never
/// propagates an error so the batch tally stays accurate.
///
/// An event that references an order which cannot be resolved is a
/// failure, as is an unrecognized event name. Redelivery of a cancel
/// event for an already-canceled order counts as success.
pub fn process_event(conn: &Connection, event: &EventRecord) -> bool {
    let Some(order) = resolve_order(conn, event) else {
        tracing::warn!(
            name = %event.name,
            order = event.order_increment_id.as_deref().unwrap_or("-"),
            transaction = event.transaction_id.as_deref().unwrap_or("-"),
            "event references an unresolvable order"
        );
        return false;
    };

    if CANCEL_EVENTS.contains(&event.name.as_str()) {
        match queries::cancel_order(conn, order.id) {
            Ok(canceled) => {
                tracing::info!(
                    name = %event.name,
                    order = %order.increment_id,
                    reason = event.reason.as_deref().unwrap_or("-"),
                    already_canceled = !canceled,
                    "fraud event canceled order"
                );
                true
            }
            Err(e) => {
                tracing::error!(order = %order.increment_id, error = %e, "order cancellation failed");
                false
            }
        }
    } else if NOOP_EVENTS.contains(&event.name.as_str()) {
        tracing::info!(name = %event.name, order = %order.increment_id, "informational event");
        true
    } else {
        tracing::warn!(name = %event.name, "unrecognized event name");
        false
    }
}

/// Run every event in the batch through [`process_event`], tallying
/// outcomes. One event's failure never aborts the rest.
pub fn process_batch(conn: &Connection, batch: &EventBatch) -> WebhookTally {
    let mut tally = WebhookTally::default();
    for event in &batch.events {
        tally.record(process_event(conn, event));
    }
    tally
}
