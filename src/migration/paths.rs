//! Static mapping between the legacy extension's configuration schema
//! and the new one.

/// Which legacy environment a mapping row applies to. The legacy
/// extension kept one key set plus an environment switch; the new
/// extension keeps separate sandbox-prefixed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEnvironment {
    Any,
    Production,
    Sandbox,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfigPathMapping {
    pub legacy: &'static str,
    pub new: &'static str,
    pub environment: PathEnvironment,
}

/// Ordered transfer table for the configuration step. Production-tagged
/// rows apply when the legacy environment is "production", sandbox rows
/// when it is "sandbox"; `Any` rows always apply.
pub const CONFIG_PATH_MAPPINGS: &[ConfigPathMapping] = &[
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/merchant_id",
        new: "payment/braintree/merchant_id",
        environment: PathEnvironment::Production,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/public_key",
        new: "payment/braintree/public_key",
        environment: PathEnvironment::Production,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/private_key",
        new: "payment/braintree/private_key",
        environment: PathEnvironment::Production,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/merchant_account_id",
        new: "payment/braintree/merchant_account_id",
        environment: PathEnvironment::Production,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/merchant_id",
        new: "payment/braintree/sandbox_merchant_id",
        environment: PathEnvironment::Sandbox,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/public_key",
        new: "payment/braintree/sandbox_public_key",
        environment: PathEnvironment::Sandbox,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/private_key",
        new: "payment/braintree/sandbox_private_key",
        environment: PathEnvironment::Sandbox,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/merchant_account_id",
        new: "payment/braintree/sandbox_merchant_account_id",
        environment: PathEnvironment::Sandbox,
    },
    ConfigPathMapping {
        legacy: "payment/legacy_braintree/form_integration",
        new: "payment/braintree/form_integration",
        environment: PathEnvironment::Any,
    },
];

pub const LEGACY_ENVIRONMENT_PATH: &str = "payment/legacy_braintree/environment";
pub const LEGACY_MERCHANT_ID_PATH: &str = "payment/legacy_braintree/merchant_id";
pub const NEW_MERCHANT_ID_PATH: &str = "payment/braintree/merchant_id";
pub const NEW_SANDBOX_MERCHANT_ID_PATH: &str = "payment/braintree/sandbox_merchant_id";

/// Completion flag: once set to "1" the migration surface never returns.
pub const MIGRATION_COMPLETE_PATH: &str = "migration/complete";

/// Payment method codes registered by the legacy extension.
pub const LEGACY_METHOD_CODES: &[&str] = &["legacy_braintree", "legacy_braintree_paypal"];

/// Module registry codes the legacy extension installs under.
pub const LEGACY_MODULE_CODES: &[&str] = &["legacy_braintree"];
