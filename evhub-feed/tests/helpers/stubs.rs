//! Collaborator stubs

use async_trait::async_trait;
use evhub_feed::models::{CatalogQuery, LocalEventRecord, UnifiedEvent};
use evhub_feed::services::EventCatalog;
use evhub_feed::store::{
    LocalEventStore, SnapshotOrder, StoreError, Subscription, UnsubscribeHandle,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Catalog returning fixed events after an optional delay
pub struct StaticCatalog {
    events: Vec<UnifiedEvent>,
    delay: Duration,
    calls: AtomicUsize,
    queries: Mutex<Vec<CatalogQuery>>,
    per_category: bool,
}

impl StaticCatalog {
    pub fn new(events: Vec<UnifiedEvent>) -> Self {
        Self {
            events,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            per_category: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Suffix every returned id and title with the queried category
    pub fn per_category(mut self) -> Self {
        self.per_category = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<CatalogQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventCatalog for StaticCatalog {
    async fn fetch(&self, query: &CatalogQuery) -> Vec<UnifiedEvent> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let suffix = query.category.clone().unwrap_or_default();
        self.events
            .iter()
            .cloned()
            .map(|mut e| {
                if self.per_category {
                    e.id = format!("{}-{}", e.id, suffix);
                    e.title = format!("{} {}", e.title, suffix);
                }
                e
            })
            .collect()
    }
}

/// Store whose subscribe call fails
pub struct FailingStore;

#[async_trait]
impl LocalEventStore for FailingStore {
    async fn subscribe(&self, _order: SnapshotOrder) -> Result<Subscription, StoreError> {
        Err(StoreError::Closed("store offline".to_string()))
    }
}

/// Store that delivers one snapshot with a single record, then reports an error
pub struct ErroringStore;

#[async_trait]
impl LocalEventStore for ErroringStore {
    async fn subscribe(&self, _order: SnapshotOrder) -> Result<Subscription, StoreError> {
        let (snapshot_tx, snapshots) = mpsc::channel(1);
        let (error_tx, errors) = mpsc::channel(1);
        let token = CancellationToken::new();

        tokio::spawn(async move {
            let record = LocalEventRecord {
                id: "doomed".to_string(),
                title: Some("Doomed Event".to_string()),
                location: Some("Nowhere Hall".to_string()),
                created_at: "2026-01-01T00:00:00Z".to_string(),
                ..Default::default()
            };
            let _ = snapshot_tx.send(vec![record]).await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = error_tx
                .send(StoreError::Closed("permission denied".to_string()))
                .await;
            // Keep the snapshot channel open until the error is consumed
            error_tx.closed().await;
            drop(snapshot_tx);
        });

        Ok(Subscription {
            snapshots,
            errors,
            handle: UnsubscribeHandle::new(token),
        })
    }
}
