use crate::evaluator::Evaluator;
use crate::kbase::KnowledgeBase;
use crate::marshal::strategy::{MarshallingStrategy, SerdeStrategy};
use crate::{Context, DecreeError, DecreeResult, FactObject, ModelResult, Value};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Static configuration a session is created with, and that
/// unmarshalling reuses to reconstruct a compatible session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub clock: ClockType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockType {
    /// Manually advanced logical clock; the default, and what
    /// round-trip verification assumes
    #[default]
    Pseudo,
    /// Wall clock; readings come from the system time
    Realtime,
}

/// The session clock. Pseudo time only moves when advanced, which keeps
/// serialized forms reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionClock {
    Pseudo(PseudoClock),
    Realtime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PseudoClock {
    now_ms: i64,
}

impl SessionClock {
    pub(crate) fn from_config(config: &SessionConfig) -> Self {
        match config.clock {
            ClockType::Pseudo => SessionClock::Pseudo(PseudoClock::default()),
            ClockType::Realtime => SessionClock::Realtime,
        }
    }

    pub(crate) fn restored(config: &SessionConfig, time_ms: i64) -> Self {
        match config.clock {
            ClockType::Pseudo => SessionClock::Pseudo(PseudoClock { now_ms: time_ms }),
            ClockType::Realtime => SessionClock::Realtime,
        }
    }

    /// Current logical time in milliseconds
    pub fn current_time(&self) -> i64 {
        match self {
            SessionClock::Pseudo(clock) => clock.now_ms,
            SessionClock::Realtime => chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Advance a pseudo clock; errors on a realtime clock
    pub fn advance(&mut self, duration: Duration) -> DecreeResult<i64> {
        match self {
            SessionClock::Pseudo(clock) => {
                clock.now_ms += duration.num_milliseconds();
                Ok(clock.now_ms)
            }
            SessionClock::Realtime => Err(DecreeError::runtime(
                "cannot advance a realtime session clock",
            )),
        }
    }
}

/// Mutable per-session configuration.
///
/// Holds the object-marshalling strategies and a slot for the globals
/// snapshot the round-trip verifier writes before serializing. The
/// marshaller reads globals from this slot, not from the session, which
/// is why the snapshot step is required for a complete serialization.
#[derive(Clone)]
pub struct Environment {
    strategies: Vec<Arc<dyn MarshallingStrategy>>,
    globals: Option<BTreeMap<String, Value>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            strategies: vec![Arc::new(SerdeStrategy)],
            globals: None,
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strategies(&self) -> &[Arc<dyn MarshallingStrategy>] {
        &self.strategies
    }

    pub fn set_strategies(&mut self, strategies: Vec<Arc<dyn MarshallingStrategy>>) {
        self.strategies = strategies;
    }

    pub fn globals(&self) -> Option<&BTreeMap<String, Value>> {
        self.globals.as_ref()
    }

    /// Write the globals snapshot slot, replacing any previous snapshot
    pub fn set_globals(&mut self, globals: BTreeMap<String, Value>) {
        self.globals = Some(globals);
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let strategies: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("Environment")
            .field("strategies", &strategies)
            .field("globals", &self.globals)
            .finish()
    }
}

/// A live, stateful evaluation session.
///
/// Owns its globals, inserted facts, clock and the results of
/// evaluations performed through it. `dispose` is terminal: state is
/// released and every later operation fails with
/// [`DecreeError::Disposed`].
///
/// Sessions are single-threaded values. The round-trip verifier
/// mutates the environment in place, so round-tripping one session
/// from two threads at once is a caller bug by contract.
pub struct StatefulSession {
    kbase: Arc<KnowledgeBase>,
    config: SessionConfig,
    env: Environment,
    clock: SessionClock,
    globals: BTreeMap<String, Value>,
    facts: Vec<FactObject>,
    results: BTreeMap<String, ModelResult>,
    disposed: bool,
}

impl StatefulSession {
    /// Create a new session over a knowledge base
    pub fn new(kbase: Arc<KnowledgeBase>, config: SessionConfig, env: Environment) -> Self {
        let clock = SessionClock::from_config(&config);
        Self {
            kbase,
            config,
            env,
            clock,
            globals: BTreeMap::new(),
            facts: Vec::new(),
            results: BTreeMap::new(),
            disposed: false,
        }
    }

    /// Reconstruct a session from unmarshalled state. Used by the
    /// marshaller only.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restored(
        kbase: Arc<KnowledgeBase>,
        config: SessionConfig,
        env: Environment,
        time_ms: i64,
        globals: BTreeMap<String, Value>,
        facts: Vec<FactObject>,
        results: BTreeMap<String, ModelResult>,
    ) -> Self {
        Self {
            kbase,
            clock: SessionClock::restored(&config, time_ms),
            config,
            env,
            globals,
            facts,
            results,
            disposed: false,
        }
    }

    pub fn kbase(&self) -> &Arc<KnowledgeBase> {
        &self.kbase
    }

    pub fn configuration(&self) -> &SessionConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SessionClock {
        &mut self.clock
    }

    fn check_live(&self) -> DecreeResult<()> {
        if self.disposed {
            Err(DecreeError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Bind a named global into the session's evaluation context
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) -> DecreeResult<()> {
        self.check_live()?;
        self.globals.insert(name.into(), value);
        Ok(())
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    pub fn globals(&self) -> &BTreeMap<String, Value> {
        &self.globals
    }

    /// Insert a fact object into working memory
    pub fn insert(&mut self, fact: FactObject) -> DecreeResult<()> {
        self.check_live()?;
        self.facts.push(fact);
        Ok(())
    }

    pub fn facts(&self) -> &[FactObject] {
        &self.facts
    }

    /// Evaluate all decisions of a model; the result becomes part of
    /// session state and survives marshalling
    pub fn evaluate_all(
        &mut self,
        namespace: &str,
        name: &str,
        context: &Context,
    ) -> DecreeResult<ModelResult> {
        self.check_live()?;
        let mut full_context = context.clone();
        for (global, value) in &self.globals {
            if full_context.get(global).is_none() {
                full_context.set(global.clone(), value.clone());
            }
        }
        let result = Evaluator::new().evaluate_model(&self.kbase, namespace, name, &full_context)?;
        self.results.insert(namespace.to_string(), result.clone());
        Ok(result)
    }

    /// Latest evaluation result for a model namespace, if any
    pub fn result_for(&self, namespace: &str) -> Option<&ModelResult> {
        self.results.get(namespace)
    }

    pub fn results(&self) -> &BTreeMap<String, ModelResult> {
        &self.results
    }

    /// Release the session. Idempotent; all other operations fail
    /// afterwards.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.globals.clear();
        self.facts.clear();
        self.results.clear();
    }
}
