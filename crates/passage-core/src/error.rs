use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A vector store, embedding backend or reranker model could not be
    /// reached or loaded.
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable { collaborator: &'static str, reason: String },

    #[error("Length mismatch: {0}")]
    Mismatch(String),
}

impl Error {
    pub fn unavailable(collaborator: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::CollaboratorUnavailable { collaborator, reason: reason.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
