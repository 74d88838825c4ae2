//! One fetch + subscription pair for a set of feed parameters
//!
//! A session starts the remote fetch and the local subscription concurrently.
//! Both producers send [`FeedMessage`]s tagged with the session's generation
//! to the controller's recompute loop. Shutting a session down (or dropping
//! it) cancels the fetch and unsubscribes from the store.

use evhub_common::config::{CatalogConfig, FeedConfig};
use evhub_common::RateLimitedLog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::subscriber::{report_failure, run_local_producer};
use crate::models::{CatalogQuery, FeedParams, UnifiedEvent};
use crate::services::{allocate_images, merge_with_report, EventCatalog, MergeReport};
use crate::store::{LocalEventStore, SnapshotOrder, Subscription, UnsubscribeHandle};

/// Collaborators shared by every session of a controller
#[derive(Clone)]
pub struct FeedDeps {
    pub store: Arc<dyn LocalEventStore>,
    pub catalog: Arc<dyn EventCatalog>,
    pub catalog_config: CatalogConfig,
    pub feed_config: FeedConfig,
    pub warnings: Arc<RateLimitedLog>,
}

impl FeedDeps {
    pub fn new(
        store: Arc<dyn LocalEventStore>,
        catalog: Arc<dyn EventCatalog>,
        catalog_config: CatalogConfig,
        feed_config: FeedConfig,
    ) -> Self {
        let warnings = Arc::new(RateLimitedLog::new(evhub_common::time::millis_to_duration(
            feed_config.warn_interval_ms,
        )));
        Self {
            store,
            catalog,
            catalog_config,
            feed_config,
            warnings,
        }
    }
}

/// Published feed state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedState {
    /// Merged, de-duplicated list with unique cover images
    pub events: Vec<UnifiedEvent>,
    /// True until the first local snapshot (or subscription failure)
    pub loading: bool,
    /// Session that produced this state
    pub generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            loading: true,
            generation: 0,
        }
    }
}

/// Producer output
#[derive(Debug, Clone)]
pub enum FeedUpdate {
    /// A new session began; clear both contributions
    Reset,
    LocalSnapshot(Vec<UnifiedEvent>),
    /// Local subscription failed; continue with external events only
    LocalFailed(String),
    External(Vec<UnifiedEvent>),
}

/// Producer output tagged with its session generation
#[derive(Debug, Clone)]
pub struct FeedMessage {
    pub generation: u64,
    pub update: FeedUpdate,
}

impl FeedMessage {
    pub fn new(generation: u64, update: FeedUpdate) -> Self {
        Self { generation, update }
    }
}

/// Full recomputation: merge with local precedence, then de-duplicate images
pub fn recompute(
    local: &[UnifiedEvent],
    external: &[UnifiedEvent],
) -> (Vec<UnifiedEvent>, MergeReport) {
    let (merged, report) = merge_with_report(local.to_vec(), external.to_vec());

    tracing::debug!(
        local = local.len(),
        external = external.len(),
        placed = report.placed,
        dropped_by_id = report.dropped_by_id,
        dropped_by_identity = report.dropped_by_identity,
        dropped_by_venue = report.dropped_by_venue,
        "Merged feed sources"
    );

    (allocate_images(merged), report)
}

/// Running fetch + subscription pair
pub struct FeedSession {
    generation: u64,
    params: FeedParams,
    cancel: CancellationToken,
    unsubscribe: Option<UnsubscribeHandle>,
}

impl FeedSession {
    /// Start both producers for `params`
    pub async fn start(
        deps: &FeedDeps,
        params: FeedParams,
        generation: u64,
        tx: mpsc::Sender<FeedMessage>,
    ) -> Self {
        let cancel = CancellationToken::new();

        tracing::debug!(
            generation = generation,
            category = ?params.category,
            search = ?params.search,
            "Starting feed session"
        );

        spawn_fetch(deps, &params, generation, tx.clone(), cancel.clone());

        let unsubscribe = match deps.store.subscribe(SnapshotOrder::CreatedDesc).await {
            Ok(Subscription {
                snapshots,
                errors,
                handle,
            }) => {
                tokio::spawn(run_local_producer(
                    snapshots,
                    errors,
                    generation,
                    deps.feed_config.legacy_source_marker.clone(),
                    Arc::clone(&deps.warnings),
                    tx,
                    cancel.clone(),
                ));
                Some(handle)
            }
            Err(e) => {
                report_failure(&deps.warnings, &e.to_string(), generation, &tx).await;
                None
            }
        };

        Self {
            generation,
            params,
            cancel,
            unsubscribe,
        }
    }

    pub fn params(&self) -> &FeedParams {
        &self.params
    }

    /// Cancel the fetch and unsubscribe from the store
    pub fn shutdown(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::debug!(generation = self.generation, "Shutting down feed session");
        self.cancel.cancel();
        if let Some(handle) = self.unsubscribe.take() {
            handle.unsubscribe();
        }
    }
}

impl Drop for FeedSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_fetch(
    deps: &FeedDeps,
    params: &FeedParams,
    generation: u64,
    tx: mpsc::Sender<FeedMessage>,
    cancel: CancellationToken,
) {
    let catalog = Arc::clone(&deps.catalog);
    let query = CatalogQuery::from_params(params, &deps.catalog_config);

    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(generation = generation, "Catalog fetch cancelled");
            }
            events = catalog.fetch(&query) => {
                tracing::debug!(
                    generation = generation,
                    count = events.len(),
                    "Catalog fetch finished"
                );
                let _ = tx
                    .send(FeedMessage::new(generation, FeedUpdate::External(events)))
                    .await;
            }
        }
    });
}
