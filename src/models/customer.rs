use serde::{Deserialize, Serialize};

/// Store customer. `braintree_customer_id` is the processor-issued
/// reference; at most one per customer, populated by checkout under the
/// new extension or copied forward by the customer-data migration step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub braintree_customer_id: Option<String>,
}
