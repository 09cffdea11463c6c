use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Context window exceeded: {used} used + {requested} requested > {capacity}")]
    ContextOverflow {
        used: usize,
        requested: usize,
        capacity: usize,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn tokenization(msg: impl Into<String>) -> Self {
        Self::Tokenization(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Fatal for the current generation; nothing beyond the tokens already
    /// streamed can be salvaged.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ContextOverflow { .. } | Self::Tokenization(_))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
