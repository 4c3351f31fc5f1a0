use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use catalog::Catalog;
use oracle::{GeminiConfig, GeminiResponder};
use server::config::{load_settings, Settings};
use session::{SessionController, SessionError, SessionHandle, SessionRegistry};
use shared::{
    domain::{Place, SessionId},
    error::{ApiError, ErrorCode},
    protocol::{
        CategorySummary, MapView, SelectCategoryRequest, SessionEvent, SessionSnapshot,
        UserMessageRequest,
    },
};
use tokio::sync::broadcast::error::RecvError;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod app_state;

use app_state::AppState;

const MAX_REQUEST_BYTES: usize = 64 * 1024;
const MAX_MESSAGE_CHARS: usize = 4_000;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    debug!(?settings, "loaded settings");

    let catalog = load_catalog(&settings)?;
    let Some(api_key) = settings.gemini_api_key.clone() else {
        error!("no Gemini API key configured; set GOOGLE_API_KEY");
        anyhow::bail!("Google API key not found; set GOOGLE_API_KEY or APP__GEMINI_API_KEY");
    };

    let responder = GeminiResponder::new(GeminiConfig {
        api_key,
        model: settings.gemini_model.clone(),
        base_url: settings.gemini_base_url.clone(),
        temperature: settings.gemini_temperature,
    })
    .map_err(|error| {
        error!(base_url = %settings.gemini_base_url, %error, "failed to configure Gemini client");
        error
    })?
    .with_excluded_places(catalog.all_places().map(|place| place.name.clone()));

    let controller = SessionController::new(Arc::new(catalog), Arc::new(responder))
        .with_ai_timeout(settings.ai_timeout());
    let sessions = Arc::new(SessionRegistry::new(Arc::new(controller)));
    sessions.spawn_reaper(settings.session_idle());
    let state = AppState { sessions };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(
        %addr,
        model = %settings.gemini_model,
        session_idle = ?settings.session_idle(),
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_catalog(settings: &Settings) -> anyhow::Result<Catalog> {
    let catalog = match settings.catalog_path.as_deref() {
        Some(path) => Catalog::load(path)
            .map_err(|error| {
                error!(%path, %error, "failed to load catalog");
                error
            })
            .with_context(|| format!("loading catalog from '{path}'"))?,
        None => Catalog::builtin(),
    };
    if catalog.place_count() == 0 {
        anyhow::bail!("catalog has no places");
    }
    info!(
        categories = catalog.categories().len(),
        places = catalog.place_count(),
        "catalog ready"
    );
    Ok(catalog)
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/categories", get(list_categories))
        .route("/sessions", post(create_session))
        .route(
            "/sessions/:session_id",
            get(get_session).delete(end_session),
        )
        .route("/sessions/:session_id/category", post(select_category))
        .route("/sessions/:session_id/dealers_choice", post(dealers_choice))
        .route("/sessions/:session_id/messages", post(send_message))
        .route("/sessions/:session_id/history", get(session_history))
        .route("/sessions/:session_id/map", get(session_map))
        .route("/sessions/:session_id/ws", get(ws_handler))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .with_state(state)
}

fn session_error(error: SessionError) -> (StatusCode, Json<ApiError>) {
    let status = match &error {
        SessionError::UnknownCategory(_) => StatusCode::NOT_FOUND,
        SessionError::EmptyCategory(_) | SessionError::EmptyMessage => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SessionError::AiUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::MalformedAiReply(_) => StatusCode::BAD_GATEWAY,
        SessionError::Cancelled => StatusCode::CONFLICT,
        SessionError::NoPlaces => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(error.to_api_error()))
}

fn unknown_session(session_id: SessionId) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(
            ErrorCode::NotFound,
            format!("unknown session {session_id}"),
        )),
    )
}

async fn find_session(state: &AppState, session_id: SessionId) -> ApiResult<Arc<SessionHandle>> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| unknown_session(session_id))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<CategorySummary>> {
    let categories = state
        .sessions
        .controller()
        .catalog()
        .categories()
        .iter()
        .map(|category| CategorySummary {
            label: category.label.clone(),
            places: category.places.clone(),
        })
        .collect();
    Json(categories)
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<SessionSnapshot>)> {
    let handle = state.sessions.create().await.map_err(session_error)?;
    Ok((StatusCode::CREATED, Json(handle.snapshot().await)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    let handle = find_session(&state, session_id).await?;
    Ok(Json(handle.snapshot().await))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<StatusCode> {
    if state.sessions.end(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown_session(session_id))
    }
}

async fn select_category(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<SelectCategoryRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let handle = find_session(&state, session_id).await?;
    let snapshot = handle
        .select_category(&body.category)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot))
}

async fn dealers_choice(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<SessionSnapshot>> {
    let handle = find_session(&state, session_id).await?;
    let snapshot = handle.dealers_choice().await.map_err(session_error)?;
    Ok(Json(snapshot))
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<UserMessageRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    if body.text.chars().count() > MAX_MESSAGE_CHARS {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError::new(
                ErrorCode::Validation,
                format!("message exceeds {MAX_MESSAGE_CHARS} characters"),
            )),
        ));
    }
    let handle = find_session(&state, session_id).await?;
    let snapshot = handle
        .user_message(&body.text)
        .await
        .map_err(session_error)?;
    Ok(Json(snapshot))
}

async fn session_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Vec<Place>>> {
    let handle = find_session(&state, session_id).await?;
    Ok(Json(handle.history().await))
}

async fn session_map(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<MapView>> {
    let handle = find_session(&state, session_id).await?;
    Ok(Json(handle.map_view().await))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<impl IntoResponse> {
    let handle = find_session(&state, session_id).await?;
    Ok(ws.on_upgrade(move |socket| ws_connection(handle, socket)))
}

async fn ws_connection(handle: Arc<SessionHandle>, socket: WebSocket) {
    use futures::{SinkExt, StreamExt};

    let session_id = handle.id();
    let mut events_rx = handle.subscribe();
    let initial = SessionEvent::StateChanged {
        snapshot: handle.snapshot().await,
    };
    // Holding the handle would keep the event channel open after the session ends.
    drop(handle);

    let (mut sender, mut receiver) = socket.split();

    let send_task = tokio::spawn(async move {
        let mut next = Some(initial);
        loop {
            let event = match next.take() {
                Some(event) => event,
                None => match events_rx.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(%session_id, skipped, "websocket subscriber lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
