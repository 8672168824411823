//! Session marshalling
//!
//! A [`SessionMarshaller`] writes a session plus a caller-supplied
//! timestamp to a byte sink and reconstructs a session from a byte
//! source given the original configuration and environment. The
//! timestamp is an argument, never read from a clock here, so callers
//! control exactly which instant every serialization uses.
//!
//! The wire layout is this module's private concern. All map-shaped
//! state is ordered, so equal session state marshals to identical
//! bytes.

mod json;
pub mod strategy;

pub use json::JsonSessionMarshaller;

use crate::kbase::KnowledgeBase;
use crate::session::{Environment, SessionConfig, StatefulSession};
use crate::{DecreeResult, ModelResult, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::Arc;
use strategy::MarshallingStrategy;

/// Codec between a live session and its serialized form
pub trait SessionMarshaller {
    /// Write `session` at logical time `time_ms` to `sink`
    fn marshall(
        &self,
        sink: &mut dyn Write,
        session: &StatefulSession,
        time_ms: i64,
    ) -> DecreeResult<()>;

    /// Reconstruct a session from `source`, reusing the original
    /// session's configuration and environment
    fn unmarshall(
        &self,
        source: &mut dyn Read,
        config: &SessionConfig,
        env: &Environment,
    ) -> DecreeResult<StatefulSession>;
}

/// Build the default marshaller for a knowledge base and the
/// object-marshalling strategies pulled from a session's environment
pub fn new_marshaller(
    kbase: Arc<KnowledgeBase>,
    strategies: &[Arc<dyn MarshallingStrategy>],
) -> JsonSessionMarshaller {
    JsonSessionMarshaller::new(kbase, strategies.to_vec())
}

/// Wire form of a session. Globals come from the environment snapshot
/// slot; sessions that skip the snapshot marshal empty globals.
#[derive(Serialize, Deserialize)]
pub(crate) struct SessionState {
    pub time_ms: i64,
    pub globals: BTreeMap<String, Value>,
    pub facts: Vec<MarshalledFact>,
    pub results: BTreeMap<String, ModelResult>,
}

/// A fact object tagged with the strategy that marshalled it
#[derive(Serialize, Deserialize)]
pub(crate) struct MarshalledFact {
    pub strategy: String,
    pub payload: serde_json::Value,
}
