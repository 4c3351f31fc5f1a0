use std::sync::Arc;

use tokio::sync::watch;

/// Fires once the owning session has ended.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
    // Keeps the channel open for signals that nobody can fire.
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelSignal {
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self {
            rx,
            _keepalive: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    /// Resolves when the session ends or its sender is dropped.
    pub async fn cancelled(&mut self) {
        let _ = self.rx.wait_for(|closed| *closed).await;
    }
}
