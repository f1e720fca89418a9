use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub audit_database_path: String,
    pub audit_log_enabled: bool,
    /// Bearer key required on all /admin routes.
    pub admin_api_key: String,
    /// Comma-separated CIDR ranges trusted to deliver ENS batches.
    pub ens_trusted_cidrs: String,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("BRIDGE_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "bridge.db".to_string()),
            audit_database_path: env::var("AUDIT_DATABASE_PATH")
                .unwrap_or_else(|_| "bridge_audit.db".to_string()),
            audit_log_enabled: env::var("AUDIT_LOG_ENABLED")
                .map(|v| v != "0" && v != "false")
                .unwrap_or(true),
            admin_api_key: env::var("ADMIN_API_KEY").unwrap_or_else(|_| {
                if dev_mode {
                    "dev-admin-key".to_string()
                } else {
                    String::new()
                }
            }),
            ens_trusted_cidrs: env::var("ENS_TRUSTED_CIDRS")
                .unwrap_or_else(|_| "127.0.0.1/32,::1/128".to_string()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
