use super::fixtures::{base_model, importer_model, NS_BASE};
use crate::evaluator::Evaluator;
use crate::model::{Bkm, Decision, Expr, Import, Model};
use crate::{Context, DecreeError, KnowledgeBase, Value};

fn empty_model(namespace: &str, name: &str) -> Model {
    Model {
        namespace: namespace.to_string(),
        name: name.to_string(),
        imports: vec![],
        inputs: vec![],
        bkms: vec![],
        decisions: vec![],
    }
}

#[test]
fn test_build_and_lookup() {
    let kbase = KnowledgeBase::builder()
        .add_model(base_model())
        .add_model(importer_model())
        .build()
        .unwrap();

    assert!(kbase.model(NS_BASE, "Saying hello").is_some());
    assert!(kbase.model(NS_BASE, "Wrong name").is_none());
    assert!(kbase.model("https://nowhere", "Saying hello").is_none());
    assert_eq!(kbase.models().count(), 2);
}

#[test]
fn test_add_model_json() {
    let kbase = KnowledgeBase::builder()
        .add_model_json(
            r#"{
                "namespace": "https://decree.test/json",
                "name": "From JSON",
                "inputs": [{ "name": "greeting" }],
                "decisions": [{
                    "name": "echo",
                    "expression": { "expr": "input", "path": "greeting" }
                }]
            }"#,
        )
        .unwrap()
        .build()
        .unwrap();

    let model = kbase.model("https://decree.test/json", "From JSON").unwrap();
    assert_eq!(model.decisions.len(), 1);
    assert_eq!(model.decisions[0].name, "echo");
}

#[test]
fn test_invalid_model_json() {
    let result = KnowledgeBase::builder().add_model_json("{ not json");
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_duplicate_namespace_rejected() {
    let result = KnowledgeBase::builder()
        .add_model(empty_model("https://decree.test/dup", "One"))
        .add_model(empty_model("https://decree.test/dup", "Two"))
        .build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_unknown_import_rejected() {
    let mut model = empty_model("https://decree.test/orphan", "Orphan");
    model.imports.push(Import {
        namespace: "https://decree.test/missing".to_string(),
        name: "Missing".to_string(),
        alias: "gone".to_string(),
    });
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_duplicate_alias_rejected() {
    let mut model = empty_model("https://decree.test/twice", "Twice");
    for _ in 0..2 {
        model.imports.push(Import {
            namespace: NS_BASE.to_string(),
            name: "Saying hello".to_string(),
            alias: "hello".to_string(),
        });
    }
    let result = KnowledgeBase::builder()
        .add_model(base_model())
        .add_model(model)
        .build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_unknown_decision_reference_rejected() {
    let mut model = empty_model("https://decree.test/dangling", "Dangling");
    model.decisions.push(Decision {
        name: "broken".to_string(),
        expression: Expr::decision("no such decision"),
    });
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_unknown_bkm_reference_rejected() {
    let mut model = empty_model("https://decree.test/no-bkm", "No BKM");
    model.decisions.push(Decision {
        name: "broken".to_string(),
        expression: Expr::invoke("vanished", vec![]),
    });
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_bkm_arity_checked() {
    let mut model = base_model();
    model.decisions.push(Decision {
        name: "too many arguments".to_string(),
        expression: Expr::invoke(
            "Say hello",
            vec![
                Expr::literal(Value::text("a")),
                Expr::literal(Value::text("b")),
            ],
        ),
    });
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}

#[test]
fn test_circular_decisions_rejected() {
    let mut model = empty_model("https://decree.test/cycle", "Cycle");
    model.decisions.push(Decision {
        name: "first".to_string(),
        expression: Expr::decision("second"),
    });
    model.decisions.push(Decision {
        name: "second".to_string(),
        expression: Expr::decision("first"),
    });
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::CircularDependency(_))));
}

#[test]
fn test_self_invoking_bkm_rejected() {
    let mut model = empty_model("https://decree.test/recursion", "Recursion");
    model.bkms.push(Bkm {
        name: "loop".to_string(),
        parameters: vec![],
        body: Expr::invoke("loop", vec![]),
    });
    model.decisions.push(Decision {
        name: "runs forever".to_string(),
        expression: Expr::invoke("loop", vec![]),
    });
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::CircularDependency(_))));
}

#[test]
fn test_cycle_through_imports_rejected() {
    let mut a = empty_model("https://decree.test/cycle-a", "A");
    a.imports.push(Import {
        namespace: "https://decree.test/cycle-b".to_string(),
        name: "B".to_string(),
        alias: "b".to_string(),
    });
    a.decisions.push(Decision {
        name: "a decision".to_string(),
        expression: Expr::decision("b.b decision"),
    });

    let mut b = empty_model("https://decree.test/cycle-b", "B");
    b.imports.push(Import {
        namespace: "https://decree.test/cycle-a".to_string(),
        name: "A".to_string(),
        alias: "a".to_string(),
    });
    b.decisions.push(Decision {
        name: "b decision".to_string(),
        expression: Expr::decision("a.a decision"),
    });

    let result = KnowledgeBase::builder().add_model(a).add_model(b).build();
    assert!(matches!(result, Err(DecreeError::CircularDependency(_))));
}

#[test]
fn test_dotted_local_decision_name_resolves() {
    // A dotted name whose prefix is not an import alias is a local
    // name, at build time and at evaluation alike
    let mut model = empty_model("https://decree.test/dotted", "Dotted");
    model.decisions.push(Decision {
        name: "v2.answer".to_string(),
        expression: Expr::literal(Value::number(42)),
    });
    model.decisions.push(Decision {
        name: "relay".to_string(),
        expression: Expr::decision("v2.answer"),
    });
    let kbase = KnowledgeBase::builder().add_model(model).build().unwrap();

    let result = Evaluator::new()
        .evaluate_model(&kbase, "https://decree.test/dotted", "Dotted", &Context::new())
        .unwrap();
    assert_eq!(
        result.decision_result_by_name("relay").unwrap().result,
        Value::number(42)
    );
}

#[test]
fn test_duplicate_decision_name_rejected() {
    let mut model = empty_model("https://decree.test/same-name", "Same Name");
    for _ in 0..2 {
        model.decisions.push(Decision {
            name: "twin".to_string(),
            expression: Expr::literal(Value::Null),
        });
    }
    let result = KnowledgeBase::builder().add_model(model).build();
    assert!(matches!(result, Err(DecreeError::Model(_))));
}
