use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::migration::{self, gate, MigrationSelection, StepId};
use crate::models::{ActorType, AuditAction};
use crate::util::AuditLogBuilder;

/// GET /admin/migration/status
/// Gate state for the admin configuration page render.
pub async fn migration_status(State(state): State<AppState>) -> Result<Json<Value>> {
    let conn = state.db.get()?;
    let can_run = gate::can_run(&conn, &state.config_cache)?;
    let complete = gate::is_complete(&conn, &state.config_cache)?;
    Ok(Json(json!({ "can_run": can_run, "complete": complete })))
}

#[derive(Debug, Deserialize)]
pub struct RunMigrationRequest {
    /// Form-style flag map: step name to "on" (or absent).
    #[serde(default)]
    pub migration: HashMap<String, String>,
}

/// POST /admin/migration/run
/// Execute the selected migration steps and return the per-step debug
/// payload merged into the response body.
pub async fn run_migration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RunMigrationRequest>,
) -> Result<Json<Value>> {
    let conn = state.db.get()?;

    if !gate::can_run(&conn, &state.config_cache)? {
        return Err(AppError::Conflict("migration is not available".into()));
    }

    let selection = MigrationSelection::from_form_map(&req.migration);
    if !selection.any() {
        return Err(AppError::BadRequest("no migration steps selected".into()));
    }

    let result = migration::run(&conn, &selection);

    // Writes bypass the cache; drop stale entries before anything else
    // reads the transferred values.
    state.config_cache.invalidate();

    // Completion policy: a successful configuration transfer means the
    // new extension is now configured, so the one-shot gate latches.
    // Explicit cancel is the only other writer of the flag.
    if selection.configuration && result.step_succeeded(StepId::ConfigurationSettings) {
        gate::mark_complete(&conn, &state.config_cache)?;
    }

    let debug = result.debug();

    if let Ok(audit_conn) = state.audit.get() {
        let details = json!({
            "steps_attempted": result.steps().len(),
            "all_succeeded": result.all_succeeded(),
            "debug": debug,
        });
        if let Err(e) = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
            .actor(ActorType::Admin)
            .action(AuditAction::RunMigration)
            .resource("migration", "run")
            .details(&details)
            .request_info(&headers)
            .save()
        {
            tracing::warn!("Failed to write migration audit log: {}", e);
        }
    }

    let mut body = serde_json::Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.extend(debug);
    Ok(Json(Value::Object(body)))
}

/// POST /admin/migration/cancel
/// Dismiss the migration prompt permanently by latching the completion
/// flag. Store-wide: the prompt never reappears for any admin session.
pub async fn cancel_migration(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let conn = state.db.get()?;
    gate::mark_complete(&conn, &state.config_cache)?;

    if let Ok(audit_conn) = state.audit.get() {
        if let Err(e) = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
            .actor(ActorType::Admin)
            .action(AuditAction::CancelMigration)
            .resource("migration", "cancel")
            .request_info(&headers)
            .save()
        {
            tracing::warn!("Failed to write cancel audit log: {}", e);
        }
    }

    Ok(Json(json!({ "success": true })))
}
