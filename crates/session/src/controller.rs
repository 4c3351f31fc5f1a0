use std::{future::Future, sync::Arc, time::Duration};

use catalog::Catalog;
use oracle::{AiResponder, OracleError, OracleReply};
use shared::domain::{ChatTurn, Place};
use tracing::{debug, info, warn};

use crate::{cancel::CancelSignal, error::SessionError};

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub current_place: Place,
    pub transcript: Vec<ChatTurn>,
    pub visited: Vec<Place>,
}

impl SessionState {
    pub fn new(current_place: Place) -> Self {
        Self {
            current_place,
            transcript: Vec::new(),
            visited: Vec::new(),
        }
    }
}

/// User actions a presentation shell can send into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SelectCategory(String),
    DealersChoice,
    UserMessage(String),
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::SelectCategory(_) => "select_category",
            SessionCommand::DealersChoice => "dealers_choice",
            SessionCommand::UserMessage(_) => "user_message",
        }
    }
}

pub fn category_intro_request(place: &Place) -> String {
    format!("Tell me about this place: {}", place.name)
}

/// Applies commands to a [`SessionState`] owned by the caller.
///
/// Every transition leaves the state untouched when it returns
/// [`SessionError::Cancelled`]. On an AI failure the only changes that remain
/// are the ones the user authored before the call.
pub struct SessionController {
    catalog: Arc<Catalog>,
    responder: Arc<dyn AiResponder>,
    ai_timeout: Duration,
}

impl SessionController {
    pub fn new(catalog: Arc<Catalog>, responder: Arc<dyn AiResponder>) -> Self {
        Self {
            catalog,
            responder,
            ai_timeout: DEFAULT_AI_TIMEOUT,
        }
    }

    pub fn with_ai_timeout(mut self, ai_timeout: Duration) -> Self {
        self.ai_timeout = ai_timeout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ai_timeout(&self) -> Duration {
        self.ai_timeout
    }

    /// Fresh state whose current place is drawn uniformly from the whole catalog.
    pub fn start_session(&self) -> Result<SessionState, SessionError> {
        let place = self
            .catalog
            .random_place(&mut rand::thread_rng())
            .cloned()
            .ok_or(SessionError::NoPlaces)?;
        Ok(SessionState::new(place))
    }

    /// Whether `command` passes validation and goes on to call the oracle.
    pub fn reaches_oracle(&self, command: &SessionCommand) -> bool {
        match command {
            SessionCommand::SelectCategory(label) => self
                .catalog
                .places(label)
                .is_some_and(|places| !places.is_empty()),
            SessionCommand::DealersChoice => true,
            SessionCommand::UserMessage(text) => !text.trim().is_empty(),
        }
    }

    pub async fn apply(
        &self,
        state: &mut SessionState,
        command: SessionCommand,
        cancel: &mut CancelSignal,
    ) -> Result<(), SessionError> {
        match command {
            SessionCommand::SelectCategory(label) => {
                self.select_category(state, &label, cancel).await
            }
            SessionCommand::DealersChoice => self.dealers_choice(state, cancel).await,
            SessionCommand::UserMessage(text) => self.user_message(state, &text, cancel).await,
        }
    }

    pub async fn select_category(
        &self,
        state: &mut SessionState,
        label: &str,
        cancel: &mut CancelSignal,
    ) -> Result<(), SessionError> {
        if self.catalog.places(label).is_none() {
            return Err(SessionError::UnknownCategory(label.to_string()));
        }
        let Some(place) = self
            .catalog
            .random_in(label, &mut rand::thread_rng())
            .cloned()
        else {
            warn!(category = label, "category has no places; nothing selected");
            return Err(SessionError::EmptyCategory(label.to_string()));
        };
        info!(category = label, place = %place.name, "category pick");

        let mut transcript = vec![ChatTurn::user(category_intro_request(&place))];
        let reply = self.ask(self.responder.converse(&transcript), cancel).await;

        // The pick stands even when the oracle has nothing to say about it.
        let outcome = match reply {
            Ok(OracleReply::Chat { text }) => {
                transcript.push(ChatTurn::ai(text));
                Ok(())
            }
            Ok(OracleReply::Location(location)) => {
                debug!(
                    suggested = %location.name,
                    "oracle proposed a relocation during a category pick; keeping the pick"
                );
                transcript.push(ChatTurn::ai(location.intro));
                Ok(())
            }
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(err) => Err(err),
        };

        state.current_place = place.clone();
        state.transcript = transcript;
        state.visited.push(place);
        outcome
    }

    pub async fn dealers_choice(
        &self,
        state: &mut SessionState,
        cancel: &mut CancelSignal,
    ) -> Result<(), SessionError> {
        let suggestion = self.ask(self.responder.suggest(), cancel).await?;
        let place = suggestion.to_place();
        info!(place = %place.name, coords = %place.coords, "dealer's choice");

        state.current_place = place.clone();
        state.transcript = vec![ChatTurn::ai(suggestion.intro)];
        state.visited.push(place);
        Ok(())
    }

    pub async fn user_message(
        &self,
        state: &mut SessionState,
        text: &str,
        cancel: &mut CancelSignal,
    ) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let mut transcript = state.transcript.clone();
        transcript.push(ChatTurn::user(text));
        let reply = match self.ask(self.responder.converse(&transcript), cancel).await {
            Ok(reply) => reply,
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(err) => {
                state.transcript = transcript;
                return Err(err);
            }
        };

        match reply {
            OracleReply::Chat { text } => {
                transcript.push(ChatTurn::ai(text));
            }
            OracleReply::Location(location) => {
                let place = location.to_place();
                info!(place = %place.name, coords = %place.coords, "oracle moved the map");
                transcript.push(ChatTurn::ai(location.intro));
                state.current_place = place.clone();
                state.visited.push(place);
            }
        }
        state.transcript = transcript;
        Ok(())
    }

    /// Runs one responder call under the timeout, racing session cancellation.
    async fn ask<T>(
        &self,
        call: impl Future<Output = Result<T, OracleError>>,
        cancel: &mut CancelSignal,
    ) -> Result<T, SessionError> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("session ended during an oracle call; discarding the reply");
                return Err(SessionError::Cancelled);
            }
            outcome = tokio::time::timeout(self.ai_timeout, call) => outcome,
        };

        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => {
                warn!(%error, "oracle call failed");
                Err(error.into())
            }
            Err(_) => {
                warn!(timeout = ?self.ai_timeout, "oracle call timed out");
                Err(SessionError::AiUnavailable(format!(
                    "no reply within {}s",
                    self.ai_timeout.as_secs_f32()
                )))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
