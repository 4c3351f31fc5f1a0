use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::domain::ChatTurn;
use tracing::{debug, warn};
use url::Url;

use crate::{
    prompt::{converse_prompt, suggest_prompt},
    reply::{parse_converse_reply, parse_suggestion},
    AiResponder, LocationSuggestion, OracleError, OracleReply,
};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: Option<f32>,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            temperature: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

fn converse_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "kind": { "type": "STRING", "enum": ["chat", "location"] },
            "text": { "type": "STRING" },
            "name": { "type": "STRING" },
            "coords": { "type": "ARRAY", "items": { "type": "NUMBER" } },
            "intro": { "type": "STRING" }
        },
        "required": ["kind"]
    })
}

fn suggestion_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "coords": { "type": "ARRAY", "items": { "type": "NUMBER" } },
            "intro": { "type": "STRING" }
        },
        "required": ["name", "coords", "intro"]
    })
}

/// `generateContent` client running the model in JSON mode.
pub struct GeminiResponder {
    http: Client,
    endpoint: String,
    api_key: String,
    temperature: Option<f32>,
    excluded_places: Vec<String>,
}

impl GeminiResponder {
    pub fn new(config: GeminiConfig) -> Result<Self, OracleError> {
        let base = Url::parse(config.base_url.trim()).map_err(|e| {
            OracleError::Unavailable(format!("invalid base url '{}': {e}", config.base_url))
        })?;
        let model = config.model.trim();
        if model.is_empty() {
            return Err(OracleError::Unavailable("model name is empty".to_string()));
        }
        let endpoint = format!(
            "{}/v1beta/models/{model}:generateContent",
            base.as_str().trim_end_matches('/')
        );
        Ok(Self {
            http: Client::new(),
            endpoint,
            api_key: config.api_key,
            temperature: config.temperature,
            excluded_places: Vec::new(),
        })
    }

    /// Names the suggestion prompt asks the model to stay away from.
    pub fn with_excluded_places(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.excluded_places = names.into_iter().collect();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn generate(&self, prompt: String, schema: Value) -> Result<String, OracleError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
                temperature: self.temperature,
            },
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(%status, body = %snippet, "gemini request rejected");
            return Err(OracleError::Unavailable(format!(
                "gemini returned {status}"
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedReply(format!("undecodable response: {e}")))?;

        let Some(candidate) = body.candidates.into_iter().next() else {
            return Err(OracleError::MalformedReply(
                "response has no candidates".to_string(),
            ));
        };
        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(OracleError::MalformedReply(format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        debug!(chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

#[async_trait]
impl AiResponder for GeminiResponder {
    async fn converse(&self, transcript: &[ChatTurn]) -> Result<OracleReply, OracleError> {
        let raw = self
            .generate(converse_prompt(transcript), converse_schema())
            .await?;
        parse_converse_reply(&raw)
    }

    async fn suggest(&self) -> Result<LocationSuggestion, OracleError> {
        let raw = self
            .generate(suggest_prompt(&self.excluded_places), suggestion_schema())
            .await?;
        parse_suggestion(&raw)
    }
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
