//! Decision evaluation
//!
//! Evaluates a model against a context by:
//! 1. Resolving each decision lazily, memoizing per import scope
//! 2. Descending into imported models with the nested context stored
//!    under the import alias
//! 3. Detecting dependency cycles explicitly
//!
//! Imported BKMs and decisions are addressed as `"alias.name"`; chains
//! of aliases compose, so transitive imports evaluate in the scope of
//! the model that owns each decision.

pub mod expression;

use crate::kbase::{imported_model, KnowledgeBase};
use crate::model::{split_qualified, Model};
use crate::{Context, DecreeError, DecreeResult, ModelResult, Value};
use expression::evaluate_expr;
use std::collections::BTreeMap;
use tracing::debug;

/// Evaluates decisions within their model and import scope
#[derive(Default)]
pub struct Evaluator;

/// The model, context and parameter bindings an expression is
/// evaluated in.
///
/// `path` is the alias chain from the evaluation root; it keys the
/// memo cache so that the same decision evaluated under two different
/// aliases stays distinct.
pub(crate) struct Scope<'k> {
    pub model: &'k Model,
    pub context: Context,
    pub params: BTreeMap<String, Value>,
    pub path: String,
}

impl<'k> Scope<'k> {
    fn root(model: &'k Model, context: Context) -> Self {
        Self {
            model,
            context,
            params: BTreeMap::new(),
            path: String::new(),
        }
    }

    pub(crate) fn child(&self, model: &'k Model, context: Context, alias: &str) -> Self {
        let path = if self.path.is_empty() {
            alias.to_string()
        } else {
            format!("{}.{}", self.path, alias)
        };
        Scope {
            model,
            context,
            params: BTreeMap::new(),
            path,
        }
    }
}

/// Memoized results and the in-flight stack for cycle detection,
/// shared across all decisions of one `evaluate_model` call
#[derive(Default)]
pub(crate) struct EvaluationState {
    cache: BTreeMap<(String, String), Value>,
    stack: Vec<(String, String)>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate all decisions of a model, in declaration order
    pub fn evaluate_model(
        &self,
        kbase: &KnowledgeBase,
        namespace: &str,
        name: &str,
        context: &Context,
    ) -> DecreeResult<ModelResult> {
        let model = kbase.model(namespace, name).ok_or_else(|| {
            DecreeError::runtime(format!("model '{}' ({}) not found", name, namespace))
        })?;

        let scope = Scope::root(model, context.clone());
        let mut state = EvaluationState::default();
        let mut result = ModelResult::new(model.name.clone());
        for decision in &model.decisions {
            let value = evaluate_decision(kbase, &scope, &mut state, &decision.name)?;
            result.add_result(decision.name.clone(), value);
        }
        debug!(model = %model.name, decisions = result.decision_results.len(), "evaluated model");
        Ok(result)
    }
}

/// Resolve and evaluate a decision reference, local or alias-qualified
pub(crate) fn evaluate_decision<'k>(
    kbase: &'k KnowledgeBase,
    scope: &Scope<'k>,
    state: &mut EvaluationState,
    name: &str,
) -> DecreeResult<Value> {
    if let Some((alias, rest)) = split_qualified(name) {
        if scope.model.import_by_alias(alias).is_some() {
            let imported = imported_model(scope.model, alias, kbase)?;
            let imported_context = scope
                .context
                .sub_context(alias)
                .cloned()
                .unwrap_or_default();
            let child = scope.child(imported, imported_context, alias);
            return evaluate_decision(kbase, &child, state, rest);
        }
    }

    let key = (scope.path.clone(), name.to_string());
    if let Some(value) = state.cache.get(&key) {
        return Ok(value.clone());
    }
    if state.stack.contains(&key) {
        let chain: Vec<&str> = state.stack.iter().map(|(_, d)| d.as_str()).collect();
        return Err(DecreeError::CircularDependency(format!(
            "{} -> {}",
            chain.join(" -> "),
            name
        )));
    }

    let decision = scope.model.decision(name).ok_or_else(|| {
        DecreeError::runtime(format!(
            "decision '{}' not found in model '{}'",
            name, scope.model.name
        ))
    })?;

    state.stack.push(key.clone());
    let value = evaluate_expr(kbase, scope, state, &decision.expression);
    state.stack.pop();

    let value = value?;
    state.cache.insert(key, value.clone());
    Ok(value)
}
