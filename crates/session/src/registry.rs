use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use shared::{
    domain::{Place, SessionId},
    protocol::{MapView, SessionEvent, SessionSnapshot, SessionStatus},
};
use tokio::{
    sync::{broadcast, watch, Mutex, RwLock},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{info, info_span, Instrument};

use crate::{
    cancel::CancelSignal,
    controller::{SessionCommand, SessionController, SessionState},
    error::SessionError,
    history::visited_history,
};

const SESSION_EVENT_CAPACITY: usize = 64;
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct Published {
    state: SessionState,
    status: SessionStatus,
    updated_at: DateTime<Utc>,
    last_active: Instant,
}

/// One live session. Commands are serialized by `turn`, so at most one
/// oracle call is ever outstanding; readers only see committed state.
pub struct SessionHandle {
    id: SessionId,
    controller: Arc<SessionController>,
    turn: Mutex<()>,
    published: RwLock<Published>,
    closed: watch::Sender<bool>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    fn new(id: SessionId, controller: Arc<SessionController>, state: SessionState) -> Self {
        let (closed, _) = watch::channel(false);
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            id,
            controller,
            turn: Mutex::new(()),
            published: RwLock::new(Published {
                state,
                status: SessionStatus::Idle,
                updated_at: Utc::now(),
                last_active: Instant::now(),
            }),
            closed,
            events,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// True while a command holds the session.
    pub fn is_busy(&self) -> bool {
        self.turn.try_lock().is_err()
    }

    /// Marks the session as used just now.
    pub async fn touch(&self) {
        self.published.write().await.last_active = Instant::now();
    }

    pub async fn idle_for(&self) -> Duration {
        self.published.read().await.last_active.elapsed()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let published = self.published.read().await;
        self.snapshot_of(&published)
    }

    pub async fn state(&self) -> SessionState {
        self.published.read().await.state.clone()
    }

    pub async fn history(&self) -> Vec<Place> {
        visited_history(&self.published.read().await.state.visited)
    }

    pub async fn map_view(&self) -> MapView {
        MapView::for_place(&self.published.read().await.state.current_place)
    }

    pub async fn select_category(&self, label: &str) -> Result<SessionSnapshot, SessionError> {
        self.dispatch(SessionCommand::SelectCategory(label.to_string()))
            .await
    }

    pub async fn dealers_choice(&self) -> Result<SessionSnapshot, SessionError> {
        self.dispatch(SessionCommand::DealersChoice).await
    }

    pub async fn user_message(&self, text: &str) -> Result<SessionSnapshot, SessionError> {
        self.dispatch(SessionCommand::UserMessage(text.to_string()))
            .await
    }

    pub async fn dispatch(&self, command: SessionCommand) -> Result<SessionSnapshot, SessionError> {
        let span = info_span!("session", session_id = %self.id, command = command.name());
        self.run(command).instrument(span).await
    }

    async fn run(&self, command: SessionCommand) -> Result<SessionSnapshot, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Cancelled);
        }
        let _turn = self.turn.lock().await;

        // Nobody listening is fine, so send results are ignored below.
        let awaiting = self.controller.reaches_oracle(&command);
        let mut working = {
            let mut published = self.published.write().await;
            published.last_active = Instant::now();
            if awaiting {
                published.status = SessionStatus::AwaitingAi;
                let _ = self.events.send(SessionEvent::StateChanged {
                    snapshot: self.snapshot_of(&published),
                });
            }
            published.state.clone()
        };
        let mut cancel = CancelSignal::new(self.closed.subscribe());
        let mut result = self
            .controller
            .apply(&mut working, command, &mut cancel)
            .await;

        let (snapshot, changed) = {
            let mut published = self.published.write().await;
            published.status = SessionStatus::Idle;
            published.last_active = Instant::now();
            if self.is_closed() {
                result = Err(SessionError::Cancelled);
            }
            let changed = !matches!(result, Err(SessionError::Cancelled))
                && published.state != working;
            if changed {
                published.state = working;
                published.updated_at = Utc::now();
            }
            (self.snapshot_of(&published), changed)
        };

        if changed || awaiting {
            let _ = self.events.send(SessionEvent::StateChanged {
                snapshot: snapshot.clone(),
            });
        }
        match result {
            Ok(()) => Ok(snapshot),
            Err(err) => {
                let _ = self.events.send(SessionEvent::Error(err.to_api_error()));
                Err(err)
            }
        }
    }

    fn end(&self) {
        self.closed.send_replace(true);
    }

    fn snapshot_of(&self, published: &Published) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            status: published.status,
            current_place: published.state.current_place.clone(),
            transcript: published.state.transcript.clone(),
            visited: published.state.visited.clone(),
            updated_at: published.updated_at,
        }
    }
}

/// Live sessions by id. Sessions share nothing but this index.
pub struct SessionRegistry {
    controller: Arc<SessionController>,
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self {
            controller,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub async fn create(&self) -> Result<Arc<SessionHandle>, SessionError> {
        let state = self.controller.start_session()?;
        let id = SessionId::new();
        info!(session_id = %id, place = %state.current_place.name, "session started");
        let handle = Arc::new(SessionHandle::new(id, self.controller.clone(), state));
        self.sessions.write().await.insert(id, handle.clone());
        Ok(handle)
    }

    /// Looks a session up and counts the lookup as activity.
    pub async fn get(&self, id: SessionId) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.read().await.get(&id).cloned()?;
        handle.touch().await;
        Some(handle)
    }

    /// Removes the session and cancels any oracle call it is waiting on.
    pub async fn end(&self, id: SessionId) -> bool {
        let Some(handle) = self.sessions.write().await.remove(&id) else {
            return false;
        };
        handle.end();
        info!(session_id = %id, "session ended");
        true
    }

    /// Ends every session that has been idle longer than `max_idle`.
    /// Sessions in the middle of a command are left alone.
    pub async fn reap_idle(&self, max_idle: Duration) -> Vec<SessionId> {
        let candidates: Vec<Arc<SessionHandle>> =
            self.sessions.read().await.values().cloned().collect();

        let mut reaped = Vec::new();
        for handle in candidates {
            if handle.is_busy() || handle.idle_for().await <= max_idle {
                continue;
            }
            if self.end(handle.id()).await {
                reaped.push(handle.id());
            }
        }
        if !reaped.is_empty() {
            info!(count = reaped.len(), max_idle = ?max_idle, "reaped idle sessions");
        }
        reaped
    }

    /// Sweeps idle sessions on a timer until the registry is dropped.
    pub fn spawn_reaper(self: &Arc<Self>, max_idle: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = max_idle.min(MAX_SWEEP_PERIOD).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.reap_idle(max_idle).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
