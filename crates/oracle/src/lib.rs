//! The AI responder seam: typed replies, the responder trait, and the
//! Gemini-backed implementation.

use async_trait::async_trait;
use shared::domain::{ChatTurn, Coords, Place};
use thiserror::Error;

mod gemini;
mod prompt;
mod reply;

pub use gemini::{GeminiConfig, GeminiResponder, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use prompt::{converse_prompt, render_history, suggest_prompt};
pub use reply::{parse_converse_reply, parse_suggestion};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Transport failure, non-success status, or timeout.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// The service answered but the payload matched neither reply shape.
    #[error("malformed oracle reply: {0}")]
    MalformedReply(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSuggestion {
    pub name: String,
    pub coords: Coords,
    pub intro: String,
}

impl LocationSuggestion {
    pub fn to_place(&self) -> Place {
        Place::suggested(self.name.clone(), self.coords)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    Chat { text: String },
    Location(LocationSuggestion),
}

#[async_trait]
pub trait AiResponder: Send + Sync {
    /// Continue the conversation; the responder decides between chatting and relocating.
    async fn converse(&self, transcript: &[ChatTurn]) -> Result<OracleReply, OracleError>;
    /// Propose a place outside the standard catalog.
    async fn suggest(&self) -> Result<LocationSuggestion, OracleError>;
}

/// Responder used when no AI backend is configured. Every call fails.
pub struct UnavailableResponder;

#[async_trait]
impl AiResponder for UnavailableResponder {
    async fn converse(&self, _transcript: &[ChatTurn]) -> Result<OracleReply, OracleError> {
        Err(OracleError::Unavailable(
            "no AI backend configured".to_string(),
        ))
    }

    async fn suggest(&self) -> Result<LocationSuggestion, OracleError> {
        Err(OracleError::Unavailable(
            "no AI backend configured".to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
