use crate::Value;
use serde::{Deserialize, Serialize};

/// Result of evaluating all decisions of a model against a context.
///
/// Part of session state: the latest result per model is marshalled
/// with the session and restored on unmarshalling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub model_name: String,
    pub decision_results: Vec<DecisionResult>,
}

/// Result of a single decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision_name: String,
    pub result: Value,
}

impl ModelResult {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            decision_results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, decision_name: impl Into<String>, result: Value) {
        self.decision_results.push(DecisionResult {
            decision_name: decision_name.into(),
            result,
        });
    }

    pub fn decision_result_by_name(&self, name: &str) -> Option<&DecisionResult> {
        self.decision_results
            .iter()
            .find(|r| r.decision_name == name)
    }
}
