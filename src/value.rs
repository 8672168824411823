use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A runtime value: decision results, context entries, globals and fact
/// fields are all `Value`s.
///
/// The wire representation is explicitly tagged so that marshalled
/// sessions are unambiguous, and map-shaped values keep their entries
/// ordered so equal state serializes to identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Boolean(bool),
    Number(Decimal),
    Text(String),
    Timestamp(DateTime<Utc>),
    List(Vec<Value>),
    Context(Context),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn number(n: impl Into<Decimal>) -> Self {
        Value::Number(n.into())
    }

    pub fn boolean(b: bool) -> Self {
        Value::Boolean(b)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Value::Context(ctx) => Some(ctx),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Context(ctx) => {
                write!(f, "{{")?;
                for (i, (name, value)) in ctx.entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A named set of input values supplied to an evaluation.
///
/// Imported models read their inputs from a nested context stored under
/// the import alias, so contexts nest arbitrarily deep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    entries: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under a name, replacing any previous binding
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.entries.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Resolve a dotted path, descending through nested contexts
    pub fn get_path(&self, segments: &[&str]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let value = self.entries.get(*first)?;
        if rest.is_empty() {
            return Some(value);
        }
        value.as_context()?.get_path(rest)
    }

    /// The nested context stored under `name`, if any
    pub fn sub_context(&self, name: &str) -> Option<&Context> {
        self.entries.get(name).and_then(Value::as_context)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

/// A dynamically-typed fact inserted into a session.
///
/// Facts carry a type name rather than a Rust type so that marshalling
/// strategies can select on it, and so unmarshalling can fail cleanly
/// when a stream references a type the environment cannot resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactObject {
    pub type_name: String,
    pub fields: BTreeMap<String, Value>,
}

impl FactObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
