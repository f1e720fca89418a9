use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::models::{ActorType, AuditAction};
use crate::payments::{BraintreeClient, BraintreeConfig};
use crate::util::AuditLogBuilder;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ValidateCredentialsRequest {
    #[serde(default = "default_true")]
    pub check_environment: bool,
    #[serde(default = "default_true")]
    pub check_keys: bool,
    #[serde(default)]
    pub merchant_account_id: Option<String>,
}

/// POST /admin/braintree/validate
/// Round-trip the configured credentials against the gateway before the
/// operator saves them. Gateway failures are surfaced as a validation
/// failure string, never retried.
pub async fn validate_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ValidateCredentialsRequest>,
) -> Result<Json<Value>> {
    let conn = state.db.get()?;
    let Some(config) = BraintreeConfig::from_store(&conn, &state.config_cache)? else {
        return Ok(Json(json!({
            "valid": false,
            "error": "Braintree credentials are not configured",
        })));
    };

    let environment = config.environment.as_str();
    let client = BraintreeClient::new(state.http_client.clone(), config);
    let outcome = client
        .validate_credentials(
            req.check_environment,
            req.check_keys,
            req.merchant_account_id.as_deref(),
        )
        .await;

    let body = match outcome {
        Ok(valid) => json!({ "valid": valid, "environment": environment }),
        Err(AppError::Gateway(msg)) => json!({ "valid": false, "error": msg }),
        Err(e) => return Err(e),
    };

    if let Ok(audit_conn) = state.audit.get() {
        if let Err(e) = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
            .actor(ActorType::Admin)
            .action(AuditAction::ValidateCredentials)
            .resource("braintree", environment)
            .details(&body)
            .request_info(&headers)
            .save()
        {
            tracing::warn!("Failed to write credential audit log: {}", e);
        }
    }

    Ok(Json(body))
}

/// GET /admin/braintree/client-token
/// Issue a short-lived browser authorization token. No caching; the
/// gateway rotates them cheaply.
pub async fn generate_client_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let conn = state.db.get()?;
    let Some(config) = BraintreeConfig::from_store(&conn, &state.config_cache)? else {
        return Err(AppError::Conflict(
            "Braintree credentials are not configured".into(),
        ));
    };

    let environment = config.environment.as_str();
    let client = BraintreeClient::new(state.http_client.clone(), config);
    let token = client.generate_client_token().await?;

    if let Ok(audit_conn) = state.audit.get() {
        if let Err(e) = AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
            .actor(ActorType::Admin)
            .action(AuditAction::GenerateClientToken)
            .resource("braintree", environment)
            .request_info(&headers)
            .save()
        {
            tracing::warn!("Failed to write token audit log: {}", e);
        }
    }

    Ok(Json(json!({ "token": token })))
}

/// GET /admin/braintree/transaction/{transaction_id}
/// Fetch the live transaction behind an order payment, for the order
/// detail view.
pub async fn lookup_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Value>> {
    let conn = state.db.get()?;
    let Some(config) = BraintreeConfig::from_store(&conn, &state.config_cache)? else {
        return Err(AppError::Conflict(
            "Braintree credentials are not configured".into(),
        ));
    };

    let client = BraintreeClient::new(state.http_client.clone(), config);
    match client.find_transaction(&transaction_id).await? {
        Some(summary) => Ok(Json(serde_json::to_value(summary)?)),
        None => Err(AppError::NotFound(format!(
            "transaction {transaction_id} not found"
        ))),
    }
}
