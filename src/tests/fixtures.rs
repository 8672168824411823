//! Model fixtures shared across test modules.
//!
//! The import chains mirror the shapes real multi-model decision
//! services use: a base greeting model, importers that invoke its
//! BKMs, and transitive importers two and three levels up.

use crate::model::{BinaryOp, Bkm, Decision, Expr, Import, InputData, Model};
use crate::{Environment, KnowledgeBase, SessionConfig, StatefulSession, Value};
use std::sync::Arc;

pub const NS_BASE: &str = "https://decree.test/saying-hello";
pub const NS_IMPORTER: &str = "https://decree.test/do-say-hello";
pub const NS_MODEL_B: &str = "https://decree.test/model-b";
pub const NS_MODEL_B2: &str = "https://decree.test/model-b2";
pub const NS_MODEL_C: &str = "https://decree.test/model-c";
pub const NS_L3: &str = "https://decree.test/l3-do-say-hello";

fn text(s: &str) -> Expr {
    Expr::literal(Value::text(s))
}

fn concat(lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(BinaryOp::Add, lhs, rhs)
}

/// "Saying hello": two BKMs and a greeting decision over its own input
pub fn base_model() -> Model {
    Model {
        namespace: NS_BASE.to_string(),
        name: "Saying hello".to_string(),
        imports: vec![],
        inputs: vec![InputData {
            name: "Person name".to_string(),
        }],
        bkms: vec![
            Bkm {
                name: "Say hello".to_string(),
                parameters: vec!["name".to_string()],
                body: concat(text("Hello, "), Expr::input("name")),
            },
            Bkm {
                name: "Just hello".to_string(),
                parameters: vec![],
                body: text("Hello"),
            },
        ],
        decisions: vec![Decision {
            name: "Greet the person".to_string(),
            expression: Expr::invoke("Say hello", vec![Expr::input("Person name")]),
        }],
    }
}

/// "Do say hello": imports the base model as `hello` and invokes both
/// of its BKMs; also re-exposes greeting as a BKM of its own
pub fn importer_model() -> Model {
    Model {
        namespace: NS_IMPORTER.to_string(),
        name: "Do say hello".to_string(),
        imports: vec![Import {
            namespace: NS_BASE.to_string(),
            name: "Saying hello".to_string(),
            alias: "hello".to_string(),
        }],
        inputs: vec![InputData {
            name: "Person name".to_string(),
        }],
        bkms: vec![Bkm {
            name: "Greet".to_string(),
            parameters: vec!["name".to_string()],
            body: Expr::invoke("hello.Say hello", vec![Expr::input("name")]),
        }],
        decisions: vec![
            Decision {
                name: "Say hello decision".to_string(),
                expression: Expr::invoke("hello.Say hello", vec![Expr::input("Person name")]),
            },
            Decision {
                name: "what about hello".to_string(),
                expression: Expr::invoke("hello.Just hello", vec![]),
            },
        ],
    }
}

/// "Model B": imports the base model as `modelA` and wraps its
/// greeting decision
pub fn model_b(namespace: &str, name: &str, label: &str) -> Model {
    Model {
        namespace: namespace.to_string(),
        name: name.to_string(),
        imports: vec![Import {
            namespace: NS_BASE.to_string(),
            name: "Saying hello".to_string(),
            alias: "modelA".to_string(),
        }],
        inputs: vec![],
        bkms: vec![],
        decisions: vec![Decision {
            name: format!("{} Say Hello", label),
            expression: concat(
                text("Evaluating Say Hello to: "),
                Expr::decision("modelA.Greet the person"),
            ),
        }],
    }
}

/// "Model C": imports two flavors of Model B, each of which imports
/// the base model, and combines their decisions
pub fn model_c() -> Model {
    Model {
        namespace: NS_MODEL_C.to_string(),
        name: "Model C".to_string(),
        imports: vec![
            Import {
                namespace: NS_MODEL_B.to_string(),
                name: "Model B".to_string(),
                alias: "Model B".to_string(),
            },
            Import {
                namespace: NS_MODEL_B2.to_string(),
                name: "Model B2".to_string(),
                alias: "Model B2".to_string(),
            },
        ],
        inputs: vec![],
        bkms: vec![],
        decisions: vec![Decision {
            name: "Model C Decision based on Bs".to_string(),
            expression: concat(
                concat(
                    concat(text("B: "), Expr::decision("Model B.Evaluating Say Hello")),
                    text("; B2: "),
                ),
                Expr::decision("Model B2.Evaluating B2 Say Hello"),
            ),
        }],
    }
}

/// "L3 Do say hello": imports the importer as `L2import`, invoking its
/// re-exposed BKM with local input data and reading its decisions
pub fn l3_model() -> Model {
    Model {
        namespace: NS_L3.to_string(),
        name: "L3 Do say hello".to_string(),
        imports: vec![Import {
            namespace: NS_IMPORTER.to_string(),
            name: "Do say hello".to_string(),
            alias: "L2import".to_string(),
        }],
        inputs: vec![InputData {
            name: "Another Name".to_string(),
        }],
        bkms: vec![],
        decisions: vec![
            Decision {
                name: "L3 decision".to_string(),
                expression: Expr::invoke("L2import.Greet", vec![Expr::input("Another Name")]),
            },
            Decision {
                name: "L3 view on M2".to_string(),
                expression: Expr::decision("L2import.Say hello decision"),
            },
            Decision {
                name: "L3 what about hello".to_string(),
                expression: Expr::decision("L2import.what about hello"),
            },
        ],
    }
}

pub fn greeting_kbase() -> Arc<KnowledgeBase> {
    Arc::new(
        KnowledgeBase::builder()
            .add_model(base_model())
            .build()
            .unwrap(),
    )
}

pub fn import_kbase() -> Arc<KnowledgeBase> {
    Arc::new(
        KnowledgeBase::builder()
            .add_model(base_model())
            .add_model(importer_model())
            .add_model(model_b(NS_MODEL_B, "Model B", "Evaluating"))
            .add_model(model_b(NS_MODEL_B2, "Model B2", "Evaluating B2"))
            .add_model(model_c())
            .add_model(l3_model())
            .build()
            .unwrap(),
    )
}

pub fn new_session(kbase: &Arc<KnowledgeBase>) -> StatefulSession {
    StatefulSession::new(Arc::clone(kbase), SessionConfig::default(), Environment::default())
}
