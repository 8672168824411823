use crate::Value;
use serde::{Deserialize, Serialize};

/// A decision model: inputs, decisions and business knowledge models,
/// plus imports of other models under an alias.
///
/// Models are identified by `(namespace, name)` and are authored as
/// serde documents; `KnowledgeBaseBuilder::add_model_json` loads one
/// from its JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub inputs: Vec<InputData>,
    #[serde(default)]
    pub bkms: Vec<Bkm>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
}

/// An import of another model, visible under `alias` inside the
/// importing model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub namespace: String,
    pub name: String,
    pub alias: String,
}

/// A declared input of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    pub name: String,
}

/// A business knowledge model: a named, parameterized expression that
/// decisions invoke, locally or through an import alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bkm {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Expr,
}

/// A decision: a named expression evaluated against the model's inputs,
/// other decisions and BKMs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub name: String,
    pub expression: Expr,
}

/// The expression language.
///
/// Deliberately small: what decision tables and literal expressions in
/// the supported scenarios need, nothing more. References may be
/// qualified with an import alias (`"alias.name"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    /// A constant value
    Literal { value: Value },
    /// A context input, addressed by dotted path into nested contexts
    Input { path: String },
    /// Another decision, local or `"alias.decision"`
    Decision { name: String },
    /// Invocation of a BKM, local or `"alias.bkm"`
    Invoke { bkm: String, args: Vec<Expr> },
    /// Binary operation; `+` concatenates text operands
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Conditional expression
    If {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl Expr {
    pub fn literal(value: Value) -> Self {
        Expr::Literal { value }
    }

    pub fn input(path: impl Into<String>) -> Self {
        Expr::Input { path: path.into() }
    }

    pub fn decision(name: impl Into<String>) -> Self {
        Expr::Decision { name: name.into() }
    }

    pub fn invoke(bkm: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Invoke {
            bkm: bkm.into(),
            args,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

impl Model {
    pub fn decision(&self, name: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.name == name)
    }

    pub fn bkm(&self, name: &str) -> Option<&Bkm> {
        self.bkms.iter().find(|b| b.name == name)
    }

    pub fn import_by_alias(&self, alias: &str) -> Option<&Import> {
        self.imports.iter().find(|i| i.alias == alias)
    }
}

/// Split a possibly alias-qualified reference into `(alias, name)`
pub(crate) fn split_qualified(reference: &str) -> Option<(&str, &str)> {
    reference.split_once('.')
}
