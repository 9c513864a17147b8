use thiserror::Error;

/// Broker-layer error taxonomy, layered on top of `EngineError`
/// with the session/transport failures the broker itself can produce.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}

pub type Result<T> = std::result::Result<T, BrokerError>;

impl BrokerError {
    /// Mirrors `EngineError::kind()` so command acks carry one consistent
    /// vocabulary regardless of which layer rejected the command.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadInput(_) => "BadInput",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Engine(e) => e.kind(),
        }
    }
}
