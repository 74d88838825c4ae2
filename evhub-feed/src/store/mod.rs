//! Local event store interface
//!
//! A store pushes the **entire current snapshot** to each subscriber on every
//! create/update/delete. Errors arrive on a separate channel. The subscription
//! stays open until its [`UnsubscribeHandle`] is used or dropped.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::models::LocalEventRecord;

pub use sqlite::SqliteEventStore;

/// Snapshot ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotOrder {
    /// Newest records first
    #[default]
    CreatedDesc,
    /// Oldest records first
    CreatedAsc,
}

/// Local store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Subscription closed: {0}")]
    Closed(String),
}

/// Explicit cancel handle for a store subscription
///
/// Dropping the handle also cancels the subscription.
#[derive(Debug)]
pub struct UnsubscribeHandle {
    token: CancellationToken,
}

impl UnsubscribeHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop snapshot delivery
    pub fn unsubscribe(&self) {
        if !self.token.is_cancelled() {
            tracing::debug!("Unsubscribing from local event store");
            self.token.cancel();
        }
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for UnsubscribeHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Live subscription to the local store
#[derive(Debug)]
pub struct Subscription {
    /// Full snapshots, one per underlying change
    pub snapshots: mpsc::Receiver<Vec<LocalEventRecord>>,
    /// Subscription failures (side channel)
    pub errors: mpsc::Receiver<StoreError>,
    pub handle: UnsubscribeHandle,
}

/// Authoritative store of locally created events
#[async_trait]
pub trait LocalEventStore: Send + Sync {
    /// Open a push subscription; the current snapshot is delivered first
    async fn subscribe(&self, order: SnapshotOrder) -> Result<Subscription, StoreError>;
}
