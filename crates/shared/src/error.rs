use thiserror::Error;

/// Failure extracting the payload from a generation envelope.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to parse generation envelope: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("envelope body is empty")]
    EmptyPayload,
    #[error("decode marker `body=` not found in generation result")]
    MarkerNotFound,
}

/// Failure classes for remote quote API calls. All of these are absorbed at
/// the orchestrator boundary; none reaches the presenter.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote call itself failed (network error, non-success HTTP
    /// status, or GraphQL-level errors).
    #[error("transport failure: {0}")]
    Transport(String),
    /// The response arrived but did not match the expected shape.
    #[error("response schema mismatch: {0}")]
    Schema(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}
