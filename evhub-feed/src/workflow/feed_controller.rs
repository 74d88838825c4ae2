//! UI-facing feed entry point
//!
//! A controller owns a single recompute loop and at most one active
//! [`FeedSession`]. Changing parameters supersedes the running session; any
//! message still in flight from an older generation is discarded.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::feed_session::{recompute, FeedDeps, FeedMessage, FeedSession, FeedState, FeedUpdate};
use crate::models::{FeedParams, UnifiedEvent};

const MESSAGE_CHANNEL_CAPACITY: usize = 32;

/// Owns the recompute loop and the active session
pub struct FeedController {
    deps: FeedDeps,
    tx: mpsc::Sender<FeedMessage>,
    state_rx: watch::Receiver<FeedState>,
    session: Option<FeedSession>,
    generation: u64,
    loop_handle: JoinHandle<()>,
}

impl FeedController {
    /// Create a controller and spawn its recompute loop
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(deps: FeedDeps) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(FeedState::default());
        let loop_handle = tokio::spawn(run_recompute_loop(rx, state_tx));

        Self {
            deps,
            tx,
            state_rx,
            session: None,
            generation: 0,
            loop_handle,
        }
    }

    /// Start a new session for `category`/`search`, superseding the current one
    pub async fn set_params(&mut self, category: Option<String>, search: Option<String>) {
        if let Some(mut previous) = self.session.take() {
            previous.shutdown();
        }

        self.generation += 1;
        let params = FeedParams::new(category, search);

        tracing::info!(
            generation = self.generation,
            category = ?params.category,
            search = ?params.search,
            "Feed parameters changed"
        );

        // The loop must see the reset before any message of the new generation
        let _ = self
            .tx
            .send(FeedMessage::new(self.generation, FeedUpdate::Reset))
            .await;

        self.session =
            Some(FeedSession::start(&self.deps, params, self.generation, self.tx.clone()).await);
    }

    /// Subscribe to published state
    pub fn state(&self) -> watch::Receiver<FeedState> {
        self.state_rx.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> Option<&FeedParams> {
        self.session.as_ref().map(|s| s.params())
    }

    /// Stop the active session; the last published state stays readable
    pub fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.shutdown();
        self.loop_handle.abort();
    }
}

/// Latest contributions for the current generation
#[derive(Debug, Default)]
struct LoopState {
    generation: u64,
    local: Vec<UnifiedEvent>,
    external: Vec<UnifiedEvent>,
    loading: bool,
}

impl LoopState {
    /// Apply one message; returns false if it was stale
    fn apply(&mut self, message: FeedMessage) -> bool {
        if let FeedUpdate::Reset = message.update {
            self.generation = message.generation;
            self.local.clear();
            self.external.clear();
            self.loading = true;
            return true;
        }

        if message.generation != self.generation {
            tracing::debug!(
                stale = message.generation,
                current = self.generation,
                "Discarding stale feed update"
            );
            return false;
        }

        match message.update {
            FeedUpdate::Reset => {}
            FeedUpdate::LocalSnapshot(events) => {
                self.local = events;
                self.loading = false;
            }
            FeedUpdate::LocalFailed(_) => {
                self.local.clear();
                self.loading = false;
            }
            FeedUpdate::External(events) => {
                self.external = events;
            }
        }
        true
    }

    fn publish(&self) -> FeedState {
        let (events, _) = recompute(&self.local, &self.external);
        FeedState {
            events,
            loading: self.loading,
            generation: self.generation,
        }
    }
}

async fn run_recompute_loop(
    mut rx: mpsc::Receiver<FeedMessage>,
    state_tx: watch::Sender<FeedState>,
) {
    let mut state = LoopState {
        loading: true,
        ..Default::default()
    };

    while let Some(message) = rx.recv().await {
        if !state.apply(message) {
            continue;
        }
        let published = state.publish();
        tracing::debug!(
            generation = published.generation,
            count = published.events.len(),
            loading = published.loading,
            "Published feed"
        );
        state_tx.send_replace(published);
    }

    tracing::debug!("Recompute loop stopped");
}
