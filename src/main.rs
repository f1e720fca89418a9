use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Duration;

use braintree_bridge::config::Config;
use braintree_bridge::db::{create_pool, init_audit_db, init_db, queries, AppState, ConfigCache, ConfigScope};
use braintree_bridge::ens::IpAllowlist;
use braintree_bridge::handlers;
use braintree_bridge::migration::paths;
use braintree_bridge::payments::REQUEST_TIMEOUT_SECS;

#[derive(Parser, Debug)]
#[command(name = "braintree-bridge")]
#[command(about = "Checkout-side Braintree integration: legacy migration and ENS webhooks")]
struct Cli {
    /// Seed the database with dev data (store, legacy config, customers, orders)
    #[arg(long)]
    seed: bool,
}

/// Seeds the database with a store still running the legacy extension,
/// so the migration endpoints have something real to work on.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::list_store_ids(&conn).expect("Failed to list stores");
    if !existing.is_empty() {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("Seeding dev data");

    let store_id = queries::create_store(&conn, "main", "Main Store").expect("Failed to create store");

    // Legacy credentials at default scope, production environment.
    queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_ENVIRONMENT_PATH, "production")
        .expect("Failed to seed config");
    queries::set_config(&conn, ConfigScope::Default, paths::LEGACY_MERCHANT_ID_PATH, "dev_merchant")
        .expect("Failed to seed config");
    queries::set_config(&conn, ConfigScope::Default, "payment/legacy_braintree/public_key", "dev_public")
        .expect("Failed to seed config");
    queries::set_config(&conn, ConfigScope::Default, "payment/legacy_braintree/private_key", "dev_private")
        .expect("Failed to seed config");
    queries::register_module(&conn, "legacy_braintree", true).expect("Failed to register module");

    let customer = queries::create_customer(&conn, "dev@bridge.local", None)
        .expect("Failed to create customer");
    queries::set_legacy_customer_ref(&conn, customer, "legacy-cust-1")
        .expect("Failed to create legacy ref");

    let order = queries::create_order(&conn, "100000001", store_id, "processing")
        .expect("Failed to create order");
    queries::create_order_payment(
        &conn,
        order,
        "legacy_braintree",
        Some("txn-dev-1"),
        Some("1111"),
        Some("VI"),
        None,
    )
    .expect("Failed to create order payment");

    tracing::info!("Dev store id: {}", store_id);
    tracing::info!("Dev order increment id: 100000001 (transaction txn-dev-1)");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "braintree_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    let audit_pool =
        create_pool(&config.audit_database_path).expect("Failed to create audit database pool");

    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }
    {
        let conn = audit_pool.get().expect("Failed to get audit connection");
        init_audit_db(&conn).expect("Failed to initialize audit database");
    }

    let ens_allowlist = IpAllowlist::from_cidrs(&config.ens_trusted_cidrs)
        .expect("Invalid ENS_TRUSTED_CIDRS value");

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client");

    let state = AppState {
        db: db_pool,
        audit: audit_pool,
        audit_log_enabled: config.audit_log_enabled,
        config_cache: ConfigCache::new(),
        admin_api_key: config.admin_api_key.clone(),
        ens_allowlist,
        http_client,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set BRIDGE_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = Router::new()
        // ENS webhook (IP allowlist auth)
        .merge(handlers::webhooks::router())
        // Admin API (bearer key auth)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Braintree bridge listening on {}", addr);

    // Connect info is required so the webhook handler sees the peer address
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
