use crate::model::{split_qualified, Expr, Model};
use crate::{DecreeError, DecreeResult};
use std::collections::{BTreeMap, HashSet};

/// An immutable, validated set of decision models.
///
/// Built once through [`KnowledgeBaseBuilder`]; sessions hold a shared
/// handle to it and marshalling reconstructs sessions against it.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBase {
    models: BTreeMap<String, Model>,
}

impl KnowledgeBase {
    pub fn builder() -> KnowledgeBaseBuilder {
        KnowledgeBaseBuilder::default()
    }

    /// Look up a model by namespace and name
    pub fn model(&self, namespace: &str, name: &str) -> Option<&Model> {
        self.models.get(namespace).filter(|m| m.name == name)
    }

    pub fn model_by_namespace(&self, namespace: &str) -> Option<&Model> {
        self.models.get(namespace)
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.values()
    }
}

/// Collects models, validates them as a whole, and produces a
/// [`KnowledgeBase`].
///
/// Validation runs at `build()` so models may be added in any order
/// regardless of their import relationships.
#[derive(Debug, Default)]
pub struct KnowledgeBaseBuilder {
    models: Vec<Model>,
}

impl KnowledgeBaseBuilder {
    pub fn add_model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    /// Load a model from its JSON document form
    pub fn add_model_json(mut self, json: &str) -> DecreeResult<Self> {
        let model: Model = serde_json::from_str(json)
            .map_err(|e| DecreeError::model(format!("invalid model document: {}", e)))?;
        self.models.push(model);
        Ok(self)
    }

    pub fn build(self) -> DecreeResult<KnowledgeBase> {
        let mut models = BTreeMap::new();
        for model in self.models {
            if models.contains_key(&model.namespace) {
                return Err(DecreeError::model(format!(
                    "duplicate model namespace '{}'",
                    model.namespace
                )));
            }
            models.insert(model.namespace.clone(), model);
        }

        let kbase = KnowledgeBase { models };
        for model in kbase.models.values() {
            validate_model(model, &kbase)?;
        }
        check_reference_cycles(&kbase)?;
        Ok(kbase)
    }
}

fn validate_model(model: &Model, kbase: &KnowledgeBase) -> DecreeResult<()> {
    let mut aliases = HashSet::new();
    for import in &model.imports {
        if !aliases.insert(import.alias.as_str()) {
            return Err(DecreeError::model(format!(
                "model '{}' declares import alias '{}' more than once",
                model.name, import.alias
            )));
        }
        if kbase.model(&import.namespace, &import.name).is_none() {
            return Err(DecreeError::model(format!(
                "model '{}' imports unknown model '{}' ({})",
                model.name, import.name, import.namespace
            )));
        }
    }

    let mut decision_names = HashSet::new();
    for decision in &model.decisions {
        if !decision_names.insert(decision.name.as_str()) {
            return Err(DecreeError::model(format!(
                "model '{}' declares decision '{}' more than once",
                model.name, decision.name
            )));
        }
    }

    for decision in &model.decisions {
        validate_expr(&decision.expression, model, kbase)?;
    }
    for bkm in &model.bkms {
        validate_expr(&bkm.body, model, kbase)?;
    }
    Ok(())
}

/// Check that decision and BKM references resolve, locally or through a
/// declared import alias. A dotted name whose prefix is not a declared
/// alias is looked up locally, the same way evaluation resolves it.
/// Input paths are resolved at evaluation time against the supplied
/// context and are not checked here.
fn validate_expr(expr: &Expr, model: &Model, kbase: &KnowledgeBase) -> DecreeResult<()> {
    match expr {
        Expr::Literal { .. } | Expr::Input { .. } => Ok(()),
        Expr::Decision { name } => {
            let (owner, local) = reference_owner(name, model, kbase);
            if owner.decision(local).is_none() {
                return Err(DecreeError::model(format!(
                    "model '{}' references unknown decision '{}'",
                    model.name, name
                )));
            }
            Ok(())
        }
        Expr::Invoke { bkm, args } => {
            let (owner, local) = reference_owner(bkm, model, kbase);
            let target = owner.bkm(local).ok_or_else(|| {
                DecreeError::model(format!(
                    "model '{}' invokes unknown BKM '{}'",
                    model.name, bkm
                ))
            })?;
            if target.parameters.len() != args.len() {
                return Err(DecreeError::model(format!(
                    "BKM '{}' takes {} parameters, invocation passes {}",
                    bkm,
                    target.parameters.len(),
                    args.len()
                )));
            }
            for arg in args {
                validate_expr(arg, model, kbase)?;
            }
            Ok(())
        }
        Expr::Binary { lhs, rhs, .. } => {
            validate_expr(lhs, model, kbase)?;
            validate_expr(rhs, model, kbase)
        }
        Expr::If {
            condition,
            then,
            otherwise,
        } => {
            validate_expr(condition, model, kbase)?;
            validate_expr(then, model, kbase)?;
            validate_expr(otherwise, model, kbase)
        }
    }
}

/// Resolve a reference to the model that owns it and the local name
/// within that model. Mirrors evaluation: a dotted prefix that matches
/// a declared alias crosses into the imported model, anything else is
/// a local name.
fn reference_owner<'a>(
    reference: &'a str,
    model: &'a Model,
    kbase: &'a KnowledgeBase,
) -> (&'a Model, &'a str) {
    if let Some((alias, rest)) = split_qualified(reference) {
        if let Ok(imported) = imported_model(model, alias, kbase) {
            return reference_owner(rest, imported, kbase);
        }
    }
    (model, reference)
}

/// Reject knowledge bases whose decisions or BKMs depend on
/// themselves, directly or through imports. Evaluation assumes the
/// reference graph is acyclic; an unchecked cycle would recurse
/// without bound.
fn check_reference_cycles(kbase: &KnowledgeBase) -> DecreeResult<()> {
    let graph = reference_graph(kbase);
    let mut visited = HashSet::new();

    for node in graph.keys() {
        if !visited.contains(node) {
            let mut visiting = HashSet::new();
            let mut path = Vec::new();
            if let Some(cycle) = detect_cycle(&graph, node, &mut visiting, &mut visited, &mut path)
            {
                return Err(DecreeError::CircularDependency(cycle.join(" -> ")));
            }
        }
    }
    Ok(())
}

/// One node per decision and per BKM across all models, keyed by
/// namespace so equally named models cannot collide. BKM nodes carry a
/// `()` suffix to keep them apart from decisions of the same name.
fn reference_graph(kbase: &KnowledgeBase) -> BTreeMap<String, HashSet<String>> {
    let mut graph = BTreeMap::new();
    for model in kbase.models.values() {
        for decision in &model.decisions {
            let mut deps = HashSet::new();
            collect_references(&decision.expression, model, kbase, &mut deps);
            graph.insert(node_key(model, &decision.name, false), deps);
        }
        for bkm in &model.bkms {
            let mut deps = HashSet::new();
            collect_references(&bkm.body, model, kbase, &mut deps);
            graph.insert(node_key(model, &bkm.name, true), deps);
        }
    }
    graph
}

fn node_key(model: &Model, name: &str, invocable: bool) -> String {
    if invocable {
        format!("{}#{}()", model.namespace, name)
    } else {
        format!("{}#{}", model.namespace, name)
    }
}

fn collect_references(
    expr: &Expr,
    model: &Model,
    kbase: &KnowledgeBase,
    deps: &mut HashSet<String>,
) {
    match expr {
        Expr::Literal { .. } | Expr::Input { .. } => {}
        Expr::Decision { name } => {
            let (owner, local) = reference_owner(name, model, kbase);
            deps.insert(node_key(owner, local, false));
        }
        Expr::Invoke { bkm, args } => {
            let (owner, local) = reference_owner(bkm, model, kbase);
            deps.insert(node_key(owner, local, true));
            for arg in args {
                collect_references(arg, model, kbase, deps);
            }
        }
        Expr::Binary { lhs, rhs, .. } => {
            collect_references(lhs, model, kbase, deps);
            collect_references(rhs, model, kbase, deps);
        }
        Expr::If {
            condition,
            then,
            otherwise,
        } => {
            collect_references(condition, model, kbase, deps);
            collect_references(then, model, kbase, deps);
            collect_references(otherwise, model, kbase, deps);
        }
    }
}

/// Depth-first cycle search; returns the cycle as the chain of node
/// keys when one exists
fn detect_cycle(
    graph: &BTreeMap<String, HashSet<String>>,
    node: &str,
    visiting: &mut HashSet<String>,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    if visiting.contains(node) {
        let cycle_start = path.iter().position(|n| n == node).unwrap_or(0);
        let mut cycle = path[cycle_start..].to_vec();
        cycle.push(node.to_string());
        return Some(cycle);
    }
    if visited.contains(node) {
        return None;
    }

    visiting.insert(node.to_string());
    path.push(node.to_string());

    if let Some(deps) = graph.get(node) {
        for dep in deps {
            if graph.contains_key(dep) {
                if let Some(cycle) = detect_cycle(graph, dep, visiting, visited, path) {
                    return Some(cycle);
                }
            }
        }
    }

    path.pop();
    visiting.remove(node);
    visited.insert(node.to_string());
    None
}

pub(crate) fn imported_model<'a>(
    model: &Model,
    alias: &str,
    kbase: &'a KnowledgeBase,
) -> DecreeResult<&'a Model> {
    let import = model.import_by_alias(alias).ok_or_else(|| {
        DecreeError::model(format!(
            "model '{}' has no import aliased '{}'",
            model.name, alias
        ))
    })?;
    kbase.model(&import.namespace, &import.name).ok_or_else(|| {
        DecreeError::model(format!(
            "import '{}' of model '{}' does not resolve",
            alias, model.name
        ))
    })
}
