use thiserror::Error;

/// Error types for the Decree engine.
///
/// Marshalling surfaces three distinct failure kinds: stream I/O,
/// type/strategy resolution, and round-trip divergence. The rest cover
/// model building and evaluation.
#[derive(Debug, Error)]
pub enum DecreeError {
    /// The underlying byte sink or source failed
    #[error("i/o failure in marshalling stream: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream was truncated or otherwise not a valid session
    #[error("malformed marshalling stream: {0}")]
    Stream(String),

    /// A marshalled object references a strategy or type that the
    /// configured environment cannot resolve
    #[error("cannot resolve marshalling strategy or type '{0}'")]
    TypeResolution(String),

    /// Re-serializing a freshly unmarshalled session produced different
    /// bytes; a marshalling defect, not a usage error
    #[error(
        "round-trip mismatch: serialized forms differ ({first_len} vs {second_len} bytes, first divergence at offset {offset})"
    )]
    RoundTripMismatch {
        first_len: usize,
        second_len: usize,
        offset: usize,
    },

    /// Model construction or validation error
    #[error("model error: {0}")]
    Model(String),

    /// Runtime error during decision evaluation
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Circular dependency between decisions
    #[error("circular dependency: {0}")]
    CircularDependency(String),

    /// The session was disposed; no further operations are possible
    #[error("session has been disposed")]
    Disposed,
}

impl DecreeError {
    /// Create a model error
    pub fn model(message: impl Into<String>) -> Self {
        DecreeError::Model(message.into())
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        DecreeError::Runtime(message.into())
    }
}
