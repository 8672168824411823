use super::strategy::{resolve, strategy_for, MarshallingStrategy};
use super::{MarshalledFact, SessionMarshaller, SessionState};
use crate::kbase::KnowledgeBase;
use crate::session::{Environment, SessionConfig, StatefulSession};
use crate::{DecreeError, DecreeResult};
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::trace;

/// Deterministic JSON session codec.
///
/// Constructed per round trip from a knowledge base and the strategies
/// of the session being marshalled; not retained beyond that.
pub struct JsonSessionMarshaller {
    kbase: Arc<KnowledgeBase>,
    strategies: Vec<Arc<dyn MarshallingStrategy>>,
}

impl JsonSessionMarshaller {
    pub fn new(kbase: Arc<KnowledgeBase>, strategies: Vec<Arc<dyn MarshallingStrategy>>) -> Self {
        Self { kbase, strategies }
    }
}

impl SessionMarshaller for JsonSessionMarshaller {
    fn marshall(
        &self,
        sink: &mut dyn Write,
        session: &StatefulSession,
        time_ms: i64,
    ) -> DecreeResult<()> {
        if session.is_disposed() {
            return Err(DecreeError::Disposed);
        }

        let mut facts = Vec::with_capacity(session.facts().len());
        for fact in session.facts() {
            let strategy = strategy_for(&self.strategies, fact)?;
            facts.push(MarshalledFact {
                strategy: strategy.name().to_string(),
                payload: strategy.marshal(fact)?,
            });
        }

        let state = SessionState {
            time_ms,
            // The environment snapshot slot, not the session's own
            // globals; snapshotting before marshalling is the caller's
            // responsibility
            globals: session.environment().globals().cloned().unwrap_or_default(),
            facts,
            results: session.results().clone(),
        };

        serde_json::to_writer(sink, &state).map_err(codec_error)?;
        trace!(time_ms, facts = state.facts.len(), "marshalled session");
        Ok(())
    }

    fn unmarshall(
        &self,
        source: &mut dyn Read,
        config: &SessionConfig,
        env: &Environment,
    ) -> DecreeResult<StatefulSession> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let state: SessionState = serde_json::from_slice(&bytes).map_err(codec_error)?;

        let mut facts = Vec::with_capacity(state.facts.len());
        for marshalled in &state.facts {
            let strategy = resolve(env.strategies(), &marshalled.strategy)?;
            facts.push(strategy.unmarshal(&marshalled.payload)?);
        }

        trace!(time_ms = state.time_ms, "unmarshalled session");
        Ok(StatefulSession::restored(
            Arc::clone(&self.kbase),
            config.clone(),
            env.clone(),
            state.time_ms,
            state.globals,
            facts,
            state.results,
        ))
    }
}

/// Keep the I/O and malformed-stream failure kinds distinct: a sink or
/// source error surfaces as `Io`, anything else as `Stream`
fn codec_error(e: serde_json::Error) -> DecreeError {
    match e.io_error_kind() {
        Some(kind) => DecreeError::Io(kind.into()),
        None => DecreeError::Stream(e.to_string()),
    }
}
