use super::*;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn generate_content(
    State(state): State<MockState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.seen.lock().await.push((call, api_key, body));
    (state.status, Json(state.reply.clone()))
}

async fn spawn_mock(status: StatusCode, reply: Value) -> (String, MockState) {
    let state = MockState {
        status,
        reply,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate_content))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), state)
}

fn candidate_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn responder_for(base_url: String) -> GeminiResponder {
    GeminiResponder::new(GeminiConfig {
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        base_url,
        temperature: Some(0.9),
    })
    .expect("responder")
}

#[test]
fn builds_generate_content_endpoint() {
    let responder = responder_for("https://example.test/".to_string());
    assert_eq!(
        responder.endpoint(),
        "https://example.test/v1beta/models/gemini-test:generateContent"
    );
}

#[test]
fn rejects_invalid_base_url_and_empty_model() {
    let mut config = GeminiConfig::new("k");
    config.base_url = "not a url".to_string();
    assert!(matches!(
        GeminiResponder::new(config),
        Err(OracleError::Unavailable(_))
    ));

    let mut config = GeminiConfig::new("k");
    config.model = " ".to_string();
    assert!(GeminiResponder::new(config).is_err());
}

#[tokio::test]
async fn converse_sends_json_mode_request_and_parses_location() {
    let (base_url, state) = spawn_mock(
        StatusCode::OK,
        candidate_text(
            r#"{"kind":"location","name":"Nazca Lines","coords":[-14.7,-75.13],"intro":"Drawn for the gods."}"#,
        ),
    )
    .await;
    let responder = responder_for(base_url);

    let reply = responder
        .converse(&[ChatTurn::user("Take me somewhere in Peru")])
        .await
        .expect("reply");
    assert!(matches!(reply, OracleReply::Location(ref l) if l.name == "Nazca Lines"));

    let seen = state.seen.lock().await;
    assert_eq!(seen.len(), 1);
    let (call, api_key, body) = &seen[0];
    assert_eq!(call, "gemini-test:generateContent");
    assert_eq!(api_key.as_deref(), Some("test-key"));
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(
        body["generationConfig"]["responseSchema"]["required"],
        json!(["kind"])
    );
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("user: Take me somewhere in Peru"));
}

#[tokio::test]
async fn suggest_uses_location_schema_and_exclusions() {
    let (base_url, state) = spawn_mock(
        StatusCode::OK,
        candidate_text(r#"{"name":"Lake Natron","coords":[-2.4167,36.05],"intro":"Red water."}"#),
    )
    .await;
    let responder =
        responder_for(base_url).with_excluded_places(vec!["Stonehenge".to_string()]);

    let suggestion = responder.suggest().await.expect("suggestion");
    assert_eq!(suggestion.name, "Lake Natron");

    let seen = state.seen.lock().await;
    let (_, _, body) = &seen[0];
    assert_eq!(
        body["generationConfig"]["responseSchema"]["required"],
        json!(["name", "coords", "intro"])
    );
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("prompt text");
    assert!(prompt.contains("Stonehenge"));
}

#[tokio::test]
async fn error_status_maps_to_unavailable() {
    let (base_url, _state) = spawn_mock(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": { "message": "overloaded" } }),
    )
    .await;
    let responder = responder_for(base_url);
    let err = responder.suggest().await.expect_err("should fail");
    assert!(matches!(err, OracleError::Unavailable(msg) if msg.contains("503")));
}

#[tokio::test]
async fn missing_candidates_map_to_malformed() {
    let (base_url, _state) = spawn_mock(StatusCode::OK, json!({ "candidates": [] })).await;
    let responder = responder_for(base_url);
    let err = responder.converse(&[]).await.expect_err("should fail");
    assert!(matches!(err, OracleError::MalformedReply(_)));
}

#[tokio::test]
async fn unreachable_service_maps_to_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let responder = responder_for(format!("http://{addr}"));
    let err = responder.suggest().await.expect_err("should fail");
    assert!(matches!(err, OracleError::Unavailable(_)));
}
