//! Boundary handler for inbound event-notification batches.
//!
//! Validation order is strict and terminal on first hard failure:
//! source IP, payload shape, merchant identity, then per-event
//! processing. Validation failures answer 403 (untrusted source) or 400
//! (malformed payload, unknown merchant) with nothing processed; once
//! processing starts the response is always 200 with the XML tally,
//! however many individual events failed.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::db::{queries, AppState};
use crate::ens::{parse_batch, process_batch};
use crate::error::{AppError, Result};
use crate::models::{ActorType, AuditAction};
use crate::util::AuditLogBuilder;

/// Append one request outcome to the audit trail. The full body is kept
/// for forensic replay; audit failure never affects the response.
fn audit_request(
    state: &AppState,
    remote: IpAddr,
    body: &[u8],
    action: AuditAction,
    details: serde_json::Value,
) {
    let audit_conn = match state.audit.get() {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Audit DB connection error: {}", e);
            return;
        }
    };
    let mut details = details;
    if let Some(map) = details.as_object_mut() {
        map.insert(
            "body".to_string(),
            json!(String::from_utf8_lossy(body).to_string()),
        );
    }
    if let Err(e) = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
        .actor(ActorType::Gateway)
        .action(action)
        .resource("webhook", "ens")
        .details(&details)
        .ip(remote.to_string())
        .save()
    {
        tracing::warn!("Failed to write webhook audit log: {}", e);
    }
}

/// POST /webhook/ens
pub async fn handle_ens_webhook(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Result<Response> {
    let remote = addr.ip();

    if !state.ens_allowlist.contains(remote) {
        tracing::warn!(%remote, "ENS request from untrusted address");
        audit_request(
            &state,
            remote,
            &body,
            AuditAction::RejectEnsRequest,
            json!({ "reason": "untrusted source address" }),
        );
        return Err(AppError::Forbidden("untrusted source address".into()));
    }

    let batch = match parse_batch(&body) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::warn!(%remote, error = %e, "ENS payload rejected");
            audit_request(
                &state,
                remote,
                &body,
                AuditAction::RejectEnsRequest,
                json!({ "reason": e.to_string() }),
            );
            return Err(e);
        }
    };

    let conn = state.db.get()?;

    let known_merchants = queries::list_configured_merchant_ids(&conn)?;
    if !known_merchants.contains(&batch.merchant) {
        tracing::warn!(%remote, merchant = %batch.merchant, "ENS merchant not configured");
        audit_request(
            &state,
            remote,
            &body,
            AuditAction::RejectEnsRequest,
            json!({ "reason": "unknown merchant", "merchant": batch.merchant }),
        );
        return Err(AppError::BadRequest("unknown merchant".into()));
    }

    let tally = process_batch(&conn, &batch);

    tracing::info!(
        %remote,
        merchant = %batch.merchant,
        events = batch.events.len(),
        successes = tally.successes(),
        failures = tally.failures(),
        "ENS batch processed"
    );
    audit_request(
        &state,
        remote,
        &body,
        AuditAction::ReceiveEnsBatch,
        json!({
            "merchant": batch.merchant,
            "events": batch.events.len(),
            "successes": tally.successes(),
            "failures": tally.failures(),
        }),
    );

    Ok((
        [(header::CONTENT_TYPE, "text/xml")],
        tally.to_xml(),
    )
        .into_response())
}
