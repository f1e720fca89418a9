//! Inbound event-notification (ENS) processing: origin validation,
//! typed payload decode, and per-event side effects.

mod allowlist;
mod parser;
mod processor;

pub use allowlist::IpAllowlist;
pub use parser::{parse_batch, EventBatch, EventRecord};
pub use processor::{process_batch, process_event};

/// Aggregate success/failure counters for one batch.
///
/// Invariant: `successes + failures` equals the number of events
/// processed; counters never decrease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebhookTally {
    successes: u32,
    failures: u32,
}

impl WebhookTally {
    pub fn record(&mut self, success: bool) {
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn total(&self) -> u32 {
        self.successes + self.failures
    }

    /// The wire-format acknowledgement body.
    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><eventResponse successes="{}" failures="{}"></eventResponse>"#,
            self.successes, self.failures
        )
    }
}
