use std::sync::Arc;

use session::SessionRegistry;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) sessions: Arc<SessionRegistry>,
}
