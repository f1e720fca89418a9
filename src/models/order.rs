use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Human-facing order number, the id ENS events reference
    pub increment_id: String,
    pub store_id: i64,
    pub state: String,
    pub status: String,
    pub created_at: i64,
}

impl Order {
    pub fn is_canceled(&self) -> bool {
        self.state == "canceled"
    }
}

/// Payment row for an order. The legacy extension wrote the dedicated
/// cc_* columns; the new extension reads additional_information JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPayment {
    pub order_id: i64,
    pub method: String,
    pub cc_trans_id: Option<String>,
    pub cc_last4: Option<String>,
    pub cc_type: Option<String>,
    pub additional_information: Option<String>,
}

impl OrderPayment {
    /// Parse additional_information as a JSON object, empty when absent.
    pub fn info(&self) -> serde_json::Map<String, serde_json::Value> {
        self.additional_information
            .as_deref()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    }
}
