use serde::Serialize;
use serde_json::{json, Map, Value};
use strum::AsRefStr;

/// Identifier for one migration step, matching the form-flag spelling
/// the admin UI submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum StepId {
    ConfigurationSettings,
    CustomerData,
    LegacyMethods,
    OrderTransactionInfo,
}

/// Outcome of one attempted step. Skipped steps produce no report.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: StepId,
    pub success: bool,
    /// Free-form audit payload: counts, paths touched, or the error message
    pub debug: Value,
}

/// Per-run accumulation of step outcomes. Created fresh for each
/// orchestration, returned to the boundary, never persisted.
#[derive(Debug, Default)]
pub struct MigrationResult {
    steps: Vec<StepReport>,
}

impl MigrationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, step: StepId, debug: Value) {
        self.steps.push(StepReport {
            step,
            success: true,
            debug,
        });
    }

    pub fn record_failure(&mut self, step: StepId, message: String) {
        self.steps.push(StepReport {
            step,
            success: false,
            debug: json!({ "error": message }),
        });
    }

    pub fn steps(&self) -> &[StepReport] {
        &self.steps
    }

    pub fn step_succeeded(&self, step: StepId) -> bool {
        self.steps
            .iter()
            .any(|report| report.step == step && report.success)
    }

    pub fn all_succeeded(&self) -> bool {
        self.steps.iter().all(|report| report.success)
    }

    /// Serializable summary consumed by the HTTP boundary: one object
    /// per attempted step, keyed by step id.
    pub fn debug(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for report in &self.steps {
            let mut entry = Map::new();
            entry.insert("success".to_string(), Value::Bool(report.success));
            if let Value::Object(fields) = &report.debug {
                for (key, value) in fields {
                    entry.insert(key.clone(), value.clone());
                }
            }
            out.insert(report.step.as_ref().to_string(), Value::Object(entry));
        }
        out
    }
}
