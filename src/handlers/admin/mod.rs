mod braintree;
mod migration;

pub use braintree::*;
pub use migration::*;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::db::AppState;
use crate::middleware::admin_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/migration/status", get(migration_status))
        .route("/admin/migration/run", post(run_migration))
        .route("/admin/migration/cancel", post(cancel_migration))
        .route("/admin/braintree/validate", post(validate_credentials))
        .route("/admin/braintree/client-token", get(generate_client_token))
        .route(
            "/admin/braintree/transaction/{transaction_id}",
            get(lookup_transaction),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth))
}
