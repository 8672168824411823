//! Session round-trip verification
//!
//! Serializes a live session, reconstructs a fresh session from the
//! bytes, and optionally asserts that re-serializing the new session
//! reproduces the original bytes. Divergence means the marshalling
//! layer is lossy or non-deterministic.

use crate::kbase::KnowledgeBase;
use crate::marshal::strategy::{resolve, strategy_for, MarshallingStrategy};
use crate::marshal::{new_marshaller, SessionMarshaller};
use crate::session::{Environment, StatefulSession};
use crate::{DecreeError, DecreeResult, FactObject};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Round-trip a session through the marshaller.
///
/// Serializes `session`, unmarshalls a new session from the bytes
/// (reusing the original's configuration and environment) and returns
/// it. With `check_round_trip`, the new session is re-serialized and
/// the two byte sequences must match exactly. With `dispose`, the
/// original session is disposed after all serialization steps, so
/// disposal can never affect the compared bytes.
///
/// The session clock is read once and that timestamp is reused for
/// both serializations; re-reading would let clock drift masquerade as
/// a marshalling defect.
///
/// Side effect: the session's globals are snapshotted into its
/// environment before serializing. Globals are not otherwise reachable
/// from the environment, and the marshaller only reads the snapshot
/// slot.
pub fn serialized_session(
    session: &mut StatefulSession,
    kbase: Option<&Arc<KnowledgeBase>>,
    dispose: bool,
    check_round_trip: bool,
) -> DecreeResult<StatefulSession> {
    let kbase = kbase.unwrap_or_else(|| session.kbase()).clone();
    let marshaller = new_marshaller(kbase, session.environment().strategies());

    let time = session.clock().current_time();
    let globals = session.globals().clone();
    session.environment_mut().set_globals(globals);

    let mut b1 = Vec::new();
    marshaller.marshall(&mut b1, session, time)?;

    let session2 = marshaller.unmarshall(
        &mut Cursor::new(&b1),
        session.configuration(),
        session.environment(),
    )?;

    if check_round_trip {
        let mut b2 = Vec::new();
        marshaller.marshall(&mut b2, &session2, time)?;
        if b1 != b2 {
            let offset = b1
                .iter()
                .zip(&b2)
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| b1.len().min(b2.len()));
            return Err(DecreeError::RoundTripMismatch {
                first_len: b1.len(),
                second_len: b2.len(),
                offset,
            });
        }
    }

    if dispose {
        session.dispose();
    }

    debug!(bytes = b1.len(), check_round_trip, dispose, "round-tripped session");
    Ok(session2)
}

/// Serialize a value to a byte stream
pub fn stream_out<T: Serialize>(value: &T) -> DecreeResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| DecreeError::Stream(e.to_string()))
}

/// Deserialize a value from a byte stream
pub fn stream_in<T: DeserializeOwned>(bytes: &[u8]) -> DecreeResult<T> {
    serde_json::from_slice(bytes).map_err(|e| DecreeError::Stream(e.to_string()))
}

/// Round-trip any serializable value through the byte-stream facility,
/// returning the freshly deserialized instance
pub fn serialize_object<T: Serialize + DeserializeOwned>(value: &T) -> DecreeResult<T> {
    stream_in(&stream_out(value)?)
}

/// Round-trip a fact object through its marshalling strategy.
///
/// The fact is written by the first accepting strategy of the default
/// environment and read back by resolving the wire tag against
/// `resolver`, so reconstruction happens under the supplied resolution
/// context rather than the writing one.
pub fn serialize_fact(
    fact: &FactObject,
    resolver: &[Arc<dyn MarshallingStrategy>],
) -> DecreeResult<FactObject> {
    let writer = Environment::default();
    let strategy = strategy_for(writer.strategies(), fact)?;
    let tag = strategy.name().to_string();
    let payload = strategy.marshal(fact)?;
    resolve(resolver, &tag)?.unmarshal(&payload)
}
