//! # Decree Engine
//!
//! **Decision models with verified session marshalling**
//!
//! Decree evaluates decision models - inputs, decisions and business
//! knowledge models, composable through imports - inside stateful
//! sessions, and can marshal a live session to bytes and back with a
//! byte-for-byte determinism guarantee.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use decree::{Context, DecreeResult, Environment, KnowledgeBase, SessionConfig, StatefulSession, Value};
//! use decree::roundtrip::serialized_session;
//! use std::sync::Arc;
//!
//! fn main() -> DecreeResult<()> {
//!     let kbase = Arc::new(
//!         KnowledgeBase::builder()
//!             .add_model_json(r#"{
//!                 "namespace": "https://example.com/greeting",
//!                 "name": "Greeting",
//!                 "inputs": [{ "name": "Person name" }],
//!                 "decisions": [{
//!                     "name": "Say hello",
//!                     "expression": {
//!                         "expr": "binary", "op": "add",
//!                         "lhs": { "expr": "literal", "value": { "kind": "text", "value": "Hello, " } },
//!                         "rhs": { "expr": "input", "path": "Person name" }
//!                     }
//!                 }]
//!             }"#)?
//!             .build()?,
//!     );
//!
//!     let mut session =
//!         StatefulSession::new(kbase.clone(), SessionConfig::default(), Environment::default());
//!     let mut context = Context::new();
//!     context.set("Person name", Value::text("John"));
//!     session.evaluate_all("https://example.com/greeting", "Greeting", &context)?;
//!
//!     // Marshal the session and verify the round trip is exact
//!     let restored = serialized_session(&mut session, None, false, true)?;
//!     assert_eq!(restored.results(), session.results());
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Models
//! A model declares inputs, decisions and BKMs. Models import other
//! models under an alias; imported decisions and BKMs are addressed as
//! `"alias.name"`, and an imported model's inputs are supplied as a
//! nested context under the alias.
//!
//! ### Sessions
//! A [`StatefulSession`] holds globals, inserted facts, a logical
//! clock and the latest evaluation results. Disposal is terminal.
//!
//! ### Marshalling
//! A [`marshal::SessionMarshaller`] converts a session plus a
//! timestamp to bytes and back. [`roundtrip::serialized_session`]
//! verifies that the conversion is deterministic and lossless.

pub mod error;
pub mod evaluator;
pub mod kbase;
pub mod marshal;
pub mod model;
pub mod response;
pub mod roundtrip;
pub mod session;
pub mod value;

pub use error::DecreeError;
pub use kbase::{KnowledgeBase, KnowledgeBaseBuilder};
pub use model::{BinaryOp, Bkm, Decision, Expr, Import, InputData, Model};
pub use response::{DecisionResult, ModelResult};
pub use roundtrip::{serialize_fact, serialize_object, serialized_session};
pub use session::{
    ClockType, Environment, PseudoClock, SessionClock, SessionConfig, StatefulSession,
};
pub use value::{Context, FactObject, Value};

/// Result type for Decree operations
pub type DecreeResult<T> = Result<T, DecreeError>;

#[cfg(test)]
mod tests;
