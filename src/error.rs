use thiserror::Error;

/// Ways a single user action can fail. The session state is never touched
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Inference call failed or came back without content.
    #[error("inference failed: {0}")]
    Inference(String),

    /// Speech synthesis failed.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// The action is ill-formed and was rejected before any remote call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AssistantError {
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantError::Inference(_) => "inference",
            AssistantError::Synthesis(_) => "synthesis",
            AssistantError::InvalidRequest(_) => "invalid_request",
        }
    }
}
