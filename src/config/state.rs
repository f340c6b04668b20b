// Application state module
// Shared, read-only configuration plus shutdown coordination

use std::sync::Arc;
use tokio::sync::{watch, Notify};

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,

    /// Woken once by the signal handler; the accept loop is the only waiter
    pub shutdown: Arc<Notify>,

    /// Flips to `true` when open connections should finish and close
    drain: watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (drain, _) = watch::channel(false);
        Self {
            config: config.clone(),
            shutdown: Arc::new(Notify::new()),
            drain,
        }
    }

    /// Ask the server loop to stop accepting and drain
    pub fn request_shutdown(&self) {
        // notify_one keeps a permit if the loop is not currently waiting
        self.shutdown.notify_one();
    }

    /// Tell every connection task to shut down gracefully
    pub fn begin_drain(&self) {
        self.drain.send_replace(true);
    }

    /// Receiver observed by each connection task
    pub fn drain_signal(&self) -> watch::Receiver<bool> {
        self.drain.subscribe()
    }
}
