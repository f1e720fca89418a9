use rusqlite::Connection;

/// Initialize the main database schema (store data plus scoped configuration)
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Hierarchical configuration store.
        -- scope is 'default' (scope_id 0) or 'stores' (scope_id = store id).
        -- A store inherits the default row unless it has its own row.
        CREATE TABLE IF NOT EXISTS config_data (
            scope TEXT NOT NULL CHECK (scope IN ('default', 'stores')),
            scope_id INTEGER NOT NULL DEFAULT 0,
            path TEXT NOT NULL,
            value TEXT,
            PRIMARY KEY (scope, scope_id, path)
        );
        CREATE INDEX IF NOT EXISTS idx_config_path ON config_data(path);

        -- Store views (scope targets for per-store configuration)
        CREATE TABLE IF NOT EXISTS stores (
            id INTEGER PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL
        );

        -- Customers; braintree_customer_id is the processor-issued reference
        -- populated by checkout under the new extension or by migration.
        CREATE TABLE IF NOT EXISTS customers (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            braintree_customer_id TEXT
        );

        -- The legacy extension's equivalent stored identifier, kept in its
        -- own table exactly as the predecessor schema left it.
        CREATE TABLE IF NOT EXISTS legacy_customer_refs (
            customer_id INTEGER PRIMARY KEY REFERENCES customers(id) ON DELETE CASCADE,
            gateway_customer_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY,
            increment_id TEXT NOT NULL UNIQUE,
            store_id INTEGER NOT NULL DEFAULT 0,
            state TEXT NOT NULL,
            status TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_orders_increment ON orders(increment_id);

        -- One payment row per order. The legacy extension stored transaction
        -- metadata in dedicated columns; the new extension reads the
        -- additional_information JSON blob.
        CREATE TABLE IF NOT EXISTS order_payments (
            order_id INTEGER PRIMARY KEY REFERENCES orders(id) ON DELETE CASCADE,
            method TEXT NOT NULL,
            cc_trans_id TEXT,
            cc_last4 TEXT,
            cc_type TEXT,
            additional_information TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_order_payments_trans ON order_payments(cc_trans_id);

        -- Active module registry. Legacy removal deletes rows from here.
        CREATE TABLE IF NOT EXISTS modules (
            code TEXT PRIMARY KEY,
            active INTEGER NOT NULL DEFAULT 1
        );
        "#,
    )
}

/// Initialize the audit database schema (separate file to isolate growth)
pub fn init_audit_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Append-only diagnostic trail. ENS requests are logged here with
        -- the full request body for forensic replay; admin migration
        -- actions record their debug payloads.
        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            actor_type TEXT NOT NULL,
            action TEXT NOT NULL,
            resource_type TEXT NOT NULL,
            resource_id TEXT NOT NULL,
            details TEXT,
            ip TEXT,
            user_agent TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_audit_logs_created ON audit_logs(created_at);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_action ON audit_logs(action);
        "#,
    )
}
