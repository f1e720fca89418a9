//! One-shot migration engine: moves configuration values and customer
//! payment references from the legacy gateway extension's schema into
//! the new one.
//!
//! Steps always execute in a fixed order regardless of which subset is
//! selected, so later steps can assume earlier selected steps already
//! ran within the same invocation. A step failure is recorded and does
//! not abort the remaining selected steps; partial success is a valid
//! terminal state surfaced through [`MigrationResult`].

pub mod gate;
pub mod paths;
mod result;
mod steps;

pub use result::{MigrationResult, StepId, StepReport};
pub use steps::StepContext;

use std::collections::HashMap;

use rusqlite::Connection;

use crate::error::Result;

/// Which steps the operator selected. Decoded once at the HTTP boundary
/// from the submitted form map; the orchestrator only ever sees typed
/// booleans.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationSelection {
    pub configuration: bool,
    pub customer_data: bool,
    pub disable_legacy: bool,
    pub remove_legacy: bool,
    pub order_transaction_info: bool,
}

impl MigrationSelection {
    /// Decode the `"on"`/absent flag map submitted by the admin form.
    /// Removal implies disablement: `remove-legacy` without
    /// `disable-legacy` is dropped rather than run destructively.
    pub fn from_form_map(map: &HashMap<String, String>) -> Self {
        fn on(map: &HashMap<String, String>, key: &str) -> bool {
            map.get(key)
                .map(|v| v == "on" || v == "1" || v == "true")
                .unwrap_or(false)
        }

        let disable_legacy = on(map, "disable-legacy");
        Self {
            configuration: on(map, "configuration-settings"),
            customer_data: on(map, "customer-data"),
            disable_legacy,
            remove_legacy: on(map, "remove-legacy") && disable_legacy,
            order_transaction_info: on(map, "order-transaction-info"),
        }
    }

    pub fn any(&self) -> bool {
        self.configuration
            || self.customer_data
            || self.disable_legacy
            || self.order_transaction_info
    }
}

struct StepDescriptor {
    id: StepId,
    selected: fn(&MigrationSelection) -> bool,
    run: fn(&StepContext) -> Result<serde_json::Value>,
}

/// Fixed execution order. Each entry is guarded by its own selection
/// flag; skipped steps contribute no report entry.
const STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        id: StepId::ConfigurationSettings,
        selected: |s| s.configuration,
        run: steps::transfer_configuration,
    },
    StepDescriptor {
        id: StepId::CustomerData,
        selected: |s| s.customer_data,
        run: steps::transfer_customer_data,
    },
    StepDescriptor {
        id: StepId::LegacyMethods,
        selected: |s| s.disable_legacy,
        run: steps::disable_legacy,
    },
    StepDescriptor {
        id: StepId::OrderTransactionInfo,
        selected: |s| s.order_transaction_info,
        run: steps::backfill_order_transaction_info,
    },
];

/// Execute the selected steps in fixed order, aggregating outcomes.
///
/// Never returns an error: a step's internal failure becomes a failed
/// report entry and later selected steps still run. Callers are
/// responsible for invalidating the config cache afterwards and for any
/// completion-flag policy; the orchestrator itself does not latch the
/// flag.
pub fn run(conn: &Connection, selection: &MigrationSelection) -> MigrationResult {
    let ctx = StepContext { conn, selection };
    let mut result = MigrationResult::new();

    for step in STEPS {
        if !(step.selected)(selection) {
            continue;
        }
        match (step.run)(&ctx) {
            Ok(debug) => {
                tracing::info!(step = step.id.as_ref(), "migration step completed");
                result.record_success(step.id, debug);
            }
            Err(e) => {
                tracing::error!(step = step.id.as_ref(), error = %e, "migration step failed");
                result.record_failure(step.id, e.to_string());
            }
        }
    }

    result
}
