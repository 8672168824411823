//! Object-marshalling strategies
//!
//! Fact objects are written to the wire tagged with the name of the
//! strategy that marshalled them. Unmarshalling resolves the tag
//! against the strategies configured in the session environment; an
//! unknown tag is a type-resolution failure.

use crate::{DecreeError, DecreeResult, FactObject};
use std::sync::Arc;

pub trait MarshallingStrategy: Send + Sync {
    /// Stable name written to the wire as the strategy tag
    fn name(&self) -> &str;

    /// Whether this strategy handles the given fact
    fn accepts(&self, fact: &FactObject) -> bool;

    fn marshal(&self, fact: &FactObject) -> DecreeResult<serde_json::Value>;

    fn unmarshal(&self, payload: &serde_json::Value) -> DecreeResult<FactObject>;
}

/// Default strategy: serde round trip of the whole fact. Accepts
/// everything, so it goes last in a strategy list.
pub struct SerdeStrategy;

impl MarshallingStrategy for SerdeStrategy {
    fn name(&self) -> &str {
        "serde"
    }

    fn accepts(&self, _fact: &FactObject) -> bool {
        true
    }

    fn marshal(&self, fact: &FactObject) -> DecreeResult<serde_json::Value> {
        serde_json::to_value(fact).map_err(|e| DecreeError::Stream(e.to_string()))
    }

    fn unmarshal(&self, payload: &serde_json::Value) -> DecreeResult<FactObject> {
        serde_json::from_value(payload.clone()).map_err(|e| DecreeError::Stream(e.to_string()))
    }
}

/// First strategy accepting the fact, in configuration order
pub(crate) fn strategy_for<'a>(
    strategies: &'a [Arc<dyn MarshallingStrategy>],
    fact: &FactObject,
) -> DecreeResult<&'a Arc<dyn MarshallingStrategy>> {
    strategies
        .iter()
        .find(|s| s.accepts(fact))
        .ok_or_else(|| DecreeError::TypeResolution(fact.type_name.clone()))
}

/// Strategy with the given wire tag
pub(crate) fn resolve<'a>(
    strategies: &'a [Arc<dyn MarshallingStrategy>],
    name: &str,
) -> DecreeResult<&'a Arc<dyn MarshallingStrategy>> {
    strategies
        .iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| DecreeError::TypeResolution(name.to_string()))
}
