use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::util::extract_bearer_token;

/// Require the admin bearer key on /admin routes.
///
/// The key is deployment-level configuration, not a per-user credential;
/// comparison is constant-time to avoid leaking prefix matches.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.admin_api_key.is_empty() {
        tracing::error!("ADMIN_API_KEY is not configured; rejecting admin request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = extract_bearer_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    let matches: bool = token
        .as_bytes()
        .ct_eq(state.admin_api_key.as_bytes())
        .into();
    if !matches {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}
