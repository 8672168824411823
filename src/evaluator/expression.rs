//! Expression evaluation within a [`Scope`](super::Scope)

use super::{evaluate_decision, EvaluationState, Scope};
use crate::kbase::{imported_model, KnowledgeBase};
use crate::model::{split_qualified, BinaryOp, Bkm, Expr};
use crate::{DecreeError, DecreeResult, Value};
use std::collections::BTreeMap;

pub(crate) fn evaluate_expr<'k>(
    kbase: &'k KnowledgeBase,
    scope: &Scope<'k>,
    state: &mut EvaluationState,
    expr: &Expr,
) -> DecreeResult<Value> {
    match expr {
        Expr::Literal { value } => Ok(value.clone()),
        Expr::Input { path } => resolve_input(scope, path),
        Expr::Decision { name } => evaluate_decision(kbase, scope, state, name),
        Expr::Invoke { bkm, args } => invoke_bkm(kbase, scope, state, bkm, args),
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate_expr(kbase, scope, state, lhs)?;
            let rhs = evaluate_expr(kbase, scope, state, rhs)?;
            apply_binary(*op, lhs, rhs)
        }
        Expr::If {
            condition,
            then,
            otherwise,
        } => match evaluate_expr(kbase, scope, state, condition)? {
            Value::Boolean(true) => evaluate_expr(kbase, scope, state, then),
            Value::Boolean(false) => evaluate_expr(kbase, scope, state, otherwise),
            other => Err(DecreeError::runtime(format!(
                "if condition must be boolean, got {}",
                other
            ))),
        },
    }
}

/// Resolve a dotted input path: BKM parameters shadow context entries
fn resolve_input(scope: &Scope<'_>, path: &str) -> DecreeResult<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    if let Some(value) = scope.params.get(segments[0]) {
        if segments.len() == 1 {
            return Ok(value.clone());
        }
        if let Some(inner) = value
            .as_context()
            .and_then(|ctx| ctx.get_path(&segments[1..]))
        {
            return Ok(inner.clone());
        }
    } else if let Some(value) = scope.context.get_path(&segments) {
        return Ok(value.clone());
    }
    Err(DecreeError::runtime(format!(
        "input '{}' is not bound in the context of model '{}'",
        path, scope.model.name
    )))
}

fn invoke_bkm<'k>(
    kbase: &'k KnowledgeBase,
    scope: &Scope<'k>,
    state: &mut EvaluationState,
    reference: &str,
    args: &[Expr],
) -> DecreeResult<Value> {
    // Arguments evaluate in the caller's scope before crossing into the
    // BKM's owning model
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate_expr(kbase, scope, state, arg)?);
    }
    dispatch_bkm(kbase, scope, state, reference, values)
}

/// Descend through alias qualifiers to the BKM's owning model, then
/// bind parameters and evaluate the body there. Resolution follows the
/// same alias-or-local rule as decision references.
fn dispatch_bkm<'k>(
    kbase: &'k KnowledgeBase,
    scope: &Scope<'k>,
    state: &mut EvaluationState,
    reference: &str,
    values: Vec<Value>,
) -> DecreeResult<Value> {
    if let Some((alias, rest)) = split_qualified(reference) {
        if scope.model.import_by_alias(alias).is_some() {
            let imported = imported_model(scope.model, alias, kbase)?;
            let imported_context = scope
                .context
                .sub_context(alias)
                .cloned()
                .unwrap_or_default();
            let child = scope.child(imported, imported_context, alias);
            return dispatch_bkm(kbase, &child, state, rest, values);
        }
    }

    let bkm = find_bkm(scope.model.bkm(reference), reference, &scope.model.name)?;
    let invocation = Scope {
        model: scope.model,
        context: scope.context.clone(),
        params: bind_params(bkm, values, reference)?,
        path: scope.path.clone(),
    };
    evaluate_expr(kbase, &invocation, state, &bkm.body)
}

fn find_bkm<'k>(bkm: Option<&'k Bkm>, reference: &str, model_name: &str) -> DecreeResult<&'k Bkm> {
    bkm.ok_or_else(|| {
        DecreeError::runtime(format!(
            "BKM '{}' not found in model '{}'",
            reference, model_name
        ))
    })
}

fn bind_params(
    bkm: &Bkm,
    values: Vec<Value>,
    reference: &str,
) -> DecreeResult<BTreeMap<String, Value>> {
    if bkm.parameters.len() != values.len() {
        return Err(DecreeError::runtime(format!(
            "BKM '{}' takes {} parameters, got {}",
            reference,
            bkm.parameters.len(),
            values.len()
        )));
    }
    Ok(bkm.parameters.iter().cloned().zip(values).collect())
}

fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> DecreeResult<Value> {
    use BinaryOp::*;
    match op {
        Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{}{}", a, b))),
            (lhs, rhs) => binary_type_error("+", &lhs, &rhs),
        },
        Subtract => numeric(lhs, rhs, "-", |a, b| Ok(a - b)),
        Multiply => numeric(lhs, rhs, "*", |a, b| Ok(a * b)),
        Divide => numeric(lhs, rhs, "/", |a, b| {
            a.checked_div(b)
                .ok_or_else(|| DecreeError::runtime("division by zero"))
        }),
        Equal => Ok(Value::Boolean(lhs == rhs)),
        NotEqual => Ok(Value::Boolean(lhs != rhs)),
        LessThan => ordering(lhs, rhs, "<", |o| o == std::cmp::Ordering::Less),
        LessOrEqual => ordering(lhs, rhs, "<=", |o| o != std::cmp::Ordering::Greater),
        GreaterThan => ordering(lhs, rhs, ">", |o| o == std::cmp::Ordering::Greater),
        GreaterOrEqual => ordering(lhs, rhs, ">=", |o| o != std::cmp::Ordering::Less),
    }
}

fn numeric(
    lhs: Value,
    rhs: Value,
    op: &str,
    f: impl FnOnce(rust_decimal::Decimal, rust_decimal::Decimal) -> DecreeResult<rust_decimal::Decimal>,
) -> DecreeResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => f(a, b).map(Value::Number),
        (lhs, rhs) => binary_type_error(op, &lhs, &rhs),
    }
}

fn ordering(
    lhs: Value,
    rhs: Value,
    op: &str,
    f: impl FnOnce(std::cmp::Ordering) -> bool,
) -> DecreeResult<Value> {
    let ord = match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        _ => return binary_type_error(op, &lhs, &rhs),
    };
    Ok(Value::Boolean(f(ord)))
}

fn binary_type_error(op: &str, lhs: &Value, rhs: &Value) -> DecreeResult<Value> {
    Err(DecreeError::runtime(format!(
        "operator '{}' cannot combine {} and {}",
        op, lhs, rhs
    )))
}
