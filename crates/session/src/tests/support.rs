use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use catalog::Catalog;
use oracle::{AiResponder, LocationSuggestion, OracleError, OracleReply};
use shared::domain::{ChatTurn, Coords};
use tokio::sync::Mutex;

pub const ANCIENT: &str = "Ancient";
pub const EMPTY: &str = "Empty";

pub fn test_catalog() -> Arc<Catalog> {
    let raw = r#"
[[categories]]
label = "Ancient"

[[categories.places]]
name = "Giza"
summary = "The Great Pyramids at the Giza Plateau, Egypt"
coords = [29.9792, 31.1342]

[[categories.places]]
name = "Stonehenge"
summary = "Prehistoric monument in England"
coords = [51.1789, -1.8262]

[[categories.places]]
name = "Göbekli Tepe"
summary = "Ancient human construction."
coords = [37.2231, 38.9226]

[[categories]]
label = "Empty"
"#;
    Arc::new(Catalog::from_toml_str(raw).expect("test catalog"))
}

pub fn nazca() -> LocationSuggestion {
    LocationSuggestion {
        name: "Nazca Lines".to_string(),
        coords: Coords::new(-14.7, -75.13),
        intro: "Giant figures drawn for eyes in the sky.".to_string(),
    }
}

pub fn chat(text: &str) -> Result<OracleReply, OracleError> {
    Ok(OracleReply::Chat {
        text: text.to_string(),
    })
}

/// Replays queued answers; an empty converse queue falls back to a chat reply.
#[derive(Default)]
pub struct ScriptedResponder {
    converse_replies: Mutex<VecDeque<Result<OracleReply, OracleError>>>,
    suggestions: Mutex<VecDeque<Result<LocationSuggestion, OracleError>>>,
    pub seen_transcripts: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedResponder {
    pub fn with_replies(replies: Vec<Result<OracleReply, OracleError>>) -> Arc<Self> {
        Arc::new(Self {
            converse_replies: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub fn with_suggestions(suggestions: Vec<Result<LocationSuggestion, OracleError>>) -> Arc<Self> {
        Arc::new(Self {
            suggestions: Mutex::new(suggestions.into()),
            ..Self::default()
        })
    }
}

#[async_trait]
impl AiResponder for ScriptedResponder {
    async fn converse(&self, transcript: &[ChatTurn]) -> Result<OracleReply, OracleError> {
        self.seen_transcripts.lock().await.push(transcript.to_vec());
        self.converse_replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| chat("The oracle hums."))
    }

    async fn suggest(&self) -> Result<LocationSuggestion, OracleError> {
        self.suggestions
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".to_string())))
    }
}

/// Answers after `delay`, tracking how many calls overlap.
pub struct SlowResponder {
    delay: Duration,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub started: AtomicUsize,
}

impl SlowResponder {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        })
    }

    async fn wait(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AiResponder for SlowResponder {
    async fn converse(&self, _transcript: &[ChatTurn]) -> Result<OracleReply, OracleError> {
        self.wait().await;
        chat("eventually")
    }

    async fn suggest(&self) -> Result<LocationSuggestion, OracleError> {
        self.wait().await;
        Ok(nazca())
    }
}
