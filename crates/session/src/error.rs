use oracle::OracleError;
use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("category '{0}' has no places")]
    EmptyCategory(String),
    #[error("message text is empty")]
    EmptyMessage,
    #[error("the oracle is unavailable: {0}")]
    AiUnavailable(String),
    #[error("the oracle sent an unreadable reply: {0}")]
    MalformedAiReply(String),
    #[error("session ended while waiting for the oracle")]
    Cancelled,
    #[error("catalog has no places to start a session from")]
    NoPlaces,
}

impl SessionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::UnknownCategory(_) => ErrorCode::NotFound,
            SessionError::EmptyCategory(_) | SessionError::EmptyMessage => ErrorCode::Validation,
            SessionError::AiUnavailable(_) => ErrorCode::AiUnavailable,
            SessionError::MalformedAiReply(_) => ErrorCode::MalformedAiReply,
            SessionError::Cancelled => ErrorCode::Cancelled,
            SessionError::NoPlaces => ErrorCode::Internal,
        }
    }

    /// Whether the failure came from the AI responder rather than from the request.
    pub fn is_ai_failure(&self) -> bool {
        matches!(
            self,
            SessionError::AiUnavailable(_) | SessionError::MalformedAiReply(_)
        )
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::new(self.code(), self.to_string())
    }
}

impl From<OracleError> for SessionError {
    fn from(value: OracleError) -> Self {
        match value {
            OracleError::Unavailable(message) => SessionError::AiUnavailable(message),
            OracleError::MalformedReply(message) => SessionError::MalformedAiReply(message),
        }
    }
}
