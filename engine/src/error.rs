use thiserror::Error;

/// The error-kind taxonomy of the competition-flow design (§7): callers
/// map each variant to an HTTP status or a command-ack payload, never to
/// an unwinding panic except for truly unrecoverable storage corruption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("fatal: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// A short machine-readable tag, used by the broker's command-ack
    /// payload and by REST error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "BadInput",
            Self::NotFound(_) => "NotFound",
            Self::StateConflict(_) => "StateConflict",
            Self::NotReady(_) => "NotReady",
            Self::Transient(_) => "Transient",
            Self::Fatal(_) => "Fatal",
        }
    }
}
