//! Shared utility functions.

use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{ActorType, AuditAction};

/// Extract client IP address and user-agent from request headers.
///
/// Tries `x-forwarded-for` first (for proxied requests), then `x-real-ip`,
/// and extracts the `user-agent` header for audit logging.
pub fn extract_request_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    (ip, user_agent)
}

/// Extract a Bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Builder for creating audit log entries.
///
/// # Example
/// ```ignore
/// AuditLogBuilder::new(&audit_conn, state.audit_log_enabled)
///     .actor(ActorType::Admin)
///     .action(AuditAction::RunMigration)
///     .resource("migration", "run")
///     .details(&serde_json::json!({ "steps": 2 }))
///     .save()?;
/// ```
pub struct AuditLogBuilder<'a> {
    conn: &'a Connection,
    enabled: bool,
    actor_type: ActorType,
    action: AuditAction,
    resource_type: &'a str,
    resource_id: &'a str,
    details: Option<&'a serde_json::Value>,
    ip: Option<String>,
    user_agent: Option<String>,
}

impl<'a> AuditLogBuilder<'a> {
    pub fn new(conn: &'a Connection, enabled: bool) -> Self {
        Self {
            conn,
            enabled,
            actor_type: ActorType::System,
            action: AuditAction::RunMigration, // Placeholder, should always be set
            resource_type: "",
            resource_id: "",
            details: None,
            ip: None,
            user_agent: None,
        }
    }

    pub fn actor(mut self, actor_type: ActorType) -> Self {
        self.actor_type = actor_type;
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = action;
        self
    }

    pub fn resource(mut self, resource_type: &'a str, resource_id: &'a str) -> Self {
        self.resource_type = resource_type;
        self.resource_id = resource_id;
        self
    }

    pub fn details(mut self, details: &'a serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Record the remote peer address directly (webhook requests carry
    /// the real socket address rather than proxy headers).
    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    /// Fill ip and user-agent from request headers.
    pub fn request_info(mut self, headers: &HeaderMap) -> Self {
        let (ip, ua) = extract_request_info(headers);
        if ip.is_some() {
            self.ip = ip;
        }
        self.user_agent = ua;
        self
    }

    pub fn save(self) -> Result<()> {
        queries::create_audit_log(
            self.conn,
            self.enabled,
            self.actor_type,
            self.action.as_ref(),
            self.resource_type,
            self.resource_id,
            self.details,
            self.ip.as_deref(),
            self.user_agent.as_deref(),
        )
    }
}
