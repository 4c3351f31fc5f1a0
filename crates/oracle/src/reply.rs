use serde::Deserialize;
use shared::domain::Coords;

use crate::{LocationSuggestion, OracleError, OracleReply};

/// Loose shape of whatever JSON the model produced. Validated into the tagged
/// types below; nothing here is trusted as-is.
#[derive(Debug, Default, Deserialize)]
struct ReplyEnvelope {
    kind: Option<String>,
    #[serde(alias = "response_text")]
    text: Option<String>,
    name: Option<String>,
    coords: Option<Vec<f64>>,
    intro: Option<String>,
}

fn decode(raw: &str) -> Result<ReplyEnvelope, OracleError> {
    let trimmed = strip_code_fence(raw.trim());
    serde_json::from_str(trimmed)
        .map_err(|e| OracleError::MalformedReply(format!("reply is not a JSON object: {e}")))
}

/// Models occasionally wrap JSON-mode output in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let Some(inner) = raw.strip_prefix("```") else {
        return raw;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn required_text(value: Option<String>, field: &str) -> Result<String, OracleError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(OracleError::MalformedReply(format!(
            "missing or empty '{field}'"
        ))),
    }
}

fn location_from(envelope: ReplyEnvelope) -> Result<LocationSuggestion, OracleError> {
    let name = required_text(envelope.name, "name")?;
    let intro = required_text(envelope.intro, "intro")?;
    let coords = match envelope.coords.as_deref() {
        Some(&[lat, lon]) => Coords::new(lat, lon),
        Some(other) => {
            return Err(OracleError::MalformedReply(format!(
                "'coords' must hold exactly 2 numbers, got {}",
                other.len()
            )))
        }
        None => return Err(OracleError::MalformedReply("missing 'coords'".to_string())),
    };
    if !coords.is_in_range() {
        return Err(OracleError::MalformedReply(format!(
            "'coords' out of range: {coords}"
        )));
    }
    Ok(LocationSuggestion {
        name: name.trim().to_string(),
        coords,
        intro,
    })
}

/// Parses a converse reply. The `kind` field decides the shape; payloads are
/// never classified by which fields happen to be present.
pub fn parse_converse_reply(raw: &str) -> Result<OracleReply, OracleError> {
    let mut envelope = decode(raw)?;
    match envelope.kind.take().as_deref().map(str::trim) {
        Some("chat") => Ok(OracleReply::Chat {
            text: required_text(envelope.text, "text")?,
        }),
        Some("location") => location_from(envelope).map(OracleReply::Location),
        Some(other) => Err(OracleError::MalformedReply(format!(
            "unknown reply kind '{other}'"
        ))),
        None => Err(OracleError::MalformedReply(
            "reply has no 'kind' discriminant".to_string(),
        )),
    }
}

/// Parses a suggestion reply, which only ever has the location shape.
pub fn parse_suggestion(raw: &str) -> Result<LocationSuggestion, OracleError> {
    let envelope = decode(raw)?;
    if let Some(kind) = envelope.kind.as_deref() {
        if kind.trim() != "location" {
            return Err(OracleError::MalformedReply(format!(
                "expected a location suggestion, got kind '{kind}'"
            )));
        }
    }
    location_from(envelope)
}
