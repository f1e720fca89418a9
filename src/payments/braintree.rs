//! Thin wrapper over the Braintree server API. The bridge only needs
//! three capabilities: client-token generation, transaction lookup, and
//! a lightweight credential round-trip. Everything else stays with the
//! processor's own client library.

use serde::{Deserialize, Serialize};

use rusqlite::Connection;

use crate::db::{ConfigCache, ConfigScope};
use crate::error::{AppError, Result};

/// Timeout applied to every outbound call. The credential check blocks
/// an admin's browser on the response, so the client must never hang.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraintreeEnvironment {
    Production,
    Sandbox,
}

impl BraintreeEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            BraintreeEnvironment::Production => "https://api.braintreegateway.com",
            BraintreeEnvironment::Sandbox => "https://api.sandbox.braintreegateway.com",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BraintreeEnvironment::Production => "production",
            BraintreeEnvironment::Sandbox => "sandbox",
        }
    }
}

/// Credentials for the active environment, read from the scoped config
/// store at the default scope.
#[derive(Debug, Clone)]
pub struct BraintreeConfig {
    pub environment: BraintreeEnvironment,
    pub merchant_id: String,
    pub public_key: String,
    pub private_key: String,
    pub merchant_account_id: Option<String>,
}

impl BraintreeConfig {
    /// Load the environment-appropriate credential set. Returns `None`
    /// when the extension is not configured yet.
    pub fn from_store(conn: &Connection, cache: &ConfigCache) -> Result<Option<Self>> {
        let environment = match cache
            .resolve(conn, ConfigScope::Default, "payment/braintree/environment")?
            .as_deref()
        {
            Some("sandbox") => BraintreeEnvironment::Sandbox,
            _ => BraintreeEnvironment::Production,
        };

        let prefix = match environment {
            BraintreeEnvironment::Production => "payment/braintree/",
            BraintreeEnvironment::Sandbox => "payment/braintree/sandbox_",
        };
        let read = |key: &str| -> Result<Option<String>> {
            cache.resolve(conn, ConfigScope::Default, &format!("{prefix}{key}"))
        };

        let (merchant_id, public_key, private_key) =
            match (read("merchant_id")?, read("public_key")?, read("private_key")?) {
                (Some(m), Some(p), Some(k)) if !m.is_empty() && !p.is_empty() && !k.is_empty() => {
                    (m, p, k)
                }
                _ => return Ok(None),
            };

        Ok(Some(Self {
            environment,
            merchant_id,
            public_key,
            private_key,
            merchant_account_id: read("merchant_account_id")?.filter(|v| !v.is_empty()),
        }))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename = "client-token")]
struct ClientTokenResponse {
    value: String,
}

/// Minimal transaction view for order detail rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename = "transaction")]
pub struct TransactionSummary {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(rename = "currency-iso-code", default)]
    pub currency_iso_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BraintreeClient {
    client: reqwest::Client,
    config: BraintreeConfig,
}

impl BraintreeClient {
    /// Bind credentials to a shared HTTP client. The client is expected
    /// to carry the global request timeout (set at startup).
    pub fn new(client: reqwest::Client, config: BraintreeConfig) -> Self {
        Self { client, config }
    }

    fn merchant_url(&self, suffix: &str) -> String {
        format!(
            "{}/merchants/{}/{}",
            self.config.environment.base_url(),
            self.config.merchant_id,
            suffix
        )
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.config.public_key, Some(&self.config.private_key))
            .header("Accept", "application/xml")
            .header("X-ApiVersion", "6")
    }

    /// Generate a client-side authorization token for the browser SDK.
    /// No caching: tokens are short-lived and cheap.
    pub async fn generate_client_token(&self) -> Result<String> {
        let response = self
            .request(reqwest::Method::POST, self.merchant_url("client_token"))
            .header("Content-Type", "application/xml")
            .body(r#"<client-token><version type="integer">2</version></client-token>"#)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("client token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "client token request returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("client token response unreadable: {e}")))?;
        let token: ClientTokenResponse = quick_xml::de::from_str(&body)
            .map_err(|e| AppError::Gateway(format!("client token response malformed: {e}")))?;
        Ok(token.value)
    }

    /// Fetch one transaction by processor id. `None` when unknown.
    pub async fn find_transaction(&self, transaction_id: &str) -> Result<Option<TransactionSummary>> {
        let response = self
            .request(
                reqwest::Method::GET,
                self.merchant_url(&format!("transactions/{transaction_id}")),
            )
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("transaction lookup failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Gateway(format!(
                "transaction lookup returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Gateway(format!("transaction response unreadable: {e}")))?;
        let summary: TransactionSummary = quick_xml::de::from_str(&body)
            .map_err(|e| AppError::Gateway(format!("transaction response malformed: {e}")))?;
        Ok(Some(summary))
    }

    /// Round-trip a lightweight call to confirm the configured keys are
    /// live before the operator saves them. Returns false for rejected
    /// credentials; network-level failures surface as gateway errors.
    pub async fn validate_credentials(
        &self,
        check_env: bool,
        check_keys: bool,
        merchant_account_id: Option<&str>,
    ) -> Result<bool> {
        if check_keys || check_env {
            let response = self
                .request(reqwest::Method::POST, self.merchant_url("client_token"))
                .header("Content-Type", "application/xml")
                .body(r#"<client-token><version type="integer">2</version></client-token>"#)
                .send()
                .await
                .map_err(|e| AppError::Gateway(format!("credential check failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                // 401/403 mean rejected keys; the gateway answers 404 for
                // a merchant id that does not exist in this environment.
                if matches!(status.as_u16(), 401 | 403 | 404) {
                    return Ok(false);
                }
                return Err(AppError::Gateway(format!(
                    "credential check returned {status}"
                )));
            }
        }

        if let Some(account_id) = merchant_account_id {
            let response = self
                .request(
                    reqwest::Method::GET,
                    self.merchant_url(&format!("merchant_accounts/{account_id}")),
                )
                .send()
                .await
                .map_err(|e| AppError::Gateway(format!("merchant account check failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                if matches!(status.as_u16(), 401 | 403 | 404) {
                    return Ok(false);
                }
                return Err(AppError::Gateway(format!(
                    "merchant account check returned {status}"
                )));
            }
        }

        Ok(true)
    }
}
