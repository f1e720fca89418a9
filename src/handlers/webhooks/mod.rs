mod ens;

pub use ens::handle_ens_webhook;

use axum::{routing::post, Router};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/ens", post(handle_ens_webhook))
}
