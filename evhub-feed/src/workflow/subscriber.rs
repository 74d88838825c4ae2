//! Live local store subscriber
//!
//! Normalizes each full snapshot delivered by a [`LocalEventStore`] into
//! [`UnifiedEvent`]s and forwards it to the recompute loop.
//!
//! [`LocalEventStore`]: crate::store::LocalEventStore

use chrono::{DateTime, Local, Utc};
use evhub_common::time::{local_wall_clock, parse_wall_date, parse_wall_time};
use evhub_common::RateLimitedLog;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::feed_session::{FeedMessage, FeedUpdate};
use crate::models::{LocalEventRecord, SourceOrigin, UnifiedEvent, UNTITLED_EVENT};
use crate::store::StoreError;

/// Rate-limited log key for subscription failures
pub const SUBSCRIPTION_FAILED_KEY: &str = "store.subscription";

/// Normalize one local snapshot
///
/// Past events and records imported from the legacy source are dropped.
/// Records missing a title or date are kept with placeholders.
pub fn normalize_local_snapshot(
    records: &[LocalEventRecord],
    now: DateTime<Utc>,
    legacy_marker: &str,
) -> Vec<UnifiedEvent> {
    let events: Vec<UnifiedEvent> = records
        .iter()
        .filter(|r| !is_legacy_import(r, legacy_marker))
        .filter_map(|r| normalize_local_record(r, now))
        .collect();

    tracing::trace!(
        records = records.len(),
        kept = events.len(),
        "Normalized local snapshot"
    );

    events
}

/// Normalize one record; `None` if it starts before `now`
pub fn normalize_local_record(
    record: &LocalEventRecord,
    now: DateTime<Utc>,
) -> Option<UnifiedEvent> {
    let title = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED_EVENT);

    let mut event = UnifiedEvent::new(record.id.clone(), title, SourceOrigin::Local);

    if let Some(start) = parse_local_start(record) {
        if start.with_timezone(&Utc) < now {
            return None;
        }
        event.start_instant = Some(start.with_timezone(&Utc));
        event.display_date = evhub_common::time::display_date(&start);
        event.display_time = evhub_common::time::display_time(&start);
    }

    event.cover_image = non_blank(&record.cover_image);
    event.location = non_blank(&record.location);
    event.description = non_blank(&record.description);
    event.organizer_name = non_blank(&record.organizer_name);
    event.category = non_blank(&record.category);
    event.price = record.price.filter(|p| p.is_finite());
    event.is_free = record.is_free;

    Some(event)
}

/// Start instant in local wall-clock time
///
/// `start_at` (RFC 3339) wins; otherwise `date` + `time` are read as local
/// time with `time` defaulting to midnight.
pub fn parse_local_start(record: &LocalEventRecord) -> Option<DateTime<Local>> {
    if let Some(start_at) = record.start_at.as_deref().map(str::trim) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(start_at) {
            return Some(parsed.with_timezone(&Local));
        }
    }

    let date = record.date.as_deref().and_then(parse_wall_date)?;
    let time = record.time.as_deref().and_then(parse_wall_time);

    // Skipped (DST gap) wall times have no instant
    local_wall_clock(date, time)
}

/// True if the record came from the retired importer
pub fn is_legacy_import(record: &LocalEventRecord, legacy_marker: &str) -> bool {
    let marker = legacy_marker.trim().to_lowercase();
    if marker.is_empty() {
        return false;
    }
    record
        .imported_from
        .as_deref()
        .map(|source| source.to_lowercase().contains(&marker))
        .unwrap_or(false)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Forward snapshots to the recompute loop until cancelled
///
/// A subscription error is reported once and ends forwarding.
pub(crate) async fn run_local_producer(
    mut snapshots: mpsc::Receiver<Vec<LocalEventRecord>>,
    mut errors: mpsc::Receiver<StoreError>,
    generation: u64,
    legacy_marker: String,
    warnings: Arc<RateLimitedLog>,
    tx: mpsc::Sender<FeedMessage>,
    cancel: CancellationToken,
) {
    let mut errors_open = true;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            error = errors.recv(), if errors_open => match error {
                Some(e) => {
                    report_failure(&warnings, &e.to_string(), generation, &tx).await;
                    break;
                }
                None => errors_open = false,
            },
            snapshot = snapshots.recv() => match snapshot {
                Some(records) => {
                    let events =
                        normalize_local_snapshot(&records, evhub_common::time::now(), &legacy_marker);
                    let message = FeedMessage::new(generation, FeedUpdate::LocalSnapshot(events));
                    if tx.send(message).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    tracing::debug!(generation = generation, "Local producer stopped");
}

/// Log a subscription failure and tell the loop to drop local events
pub(crate) async fn report_failure(
    warnings: &RateLimitedLog,
    reason: &str,
    generation: u64,
    tx: &mpsc::Sender<FeedMessage>,
) {
    warnings.warn(
        SUBSCRIPTION_FAILED_KEY,
        format_args!("Local event subscription failed, showing external events only: {}", reason),
    );
    let _ = tx
        .send(FeedMessage::new(
            generation,
            FeedUpdate::LocalFailed(reason.to_string()),
        ))
        .await;
}
