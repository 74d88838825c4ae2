//! Event builders and state polling

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use evhub_feed::models::{NewLocalEvent, SourceOrigin, UnifiedEvent};
use evhub_feed::FeedState;
use std::time::Duration;
use tokio::sync::watch;

/// A start instant `days` ahead of now, truncated to the minute
pub fn future_start(days: i64) -> DateTime<Utc> {
    let start = Utc::now() + ChronoDuration::days(days);
    start
        .date_naive()
        .and_hms_opt(20, 0, 0)
        .unwrap()
        .and_utc()
}

fn event(id: &str, title: &str, location: &str, origin: SourceOrigin) -> UnifiedEvent {
    let mut event = UnifiedEvent::new(id, title, origin);
    event.location = Some(location.to_string());
    event
}

pub fn local_event(id: &str, title: &str, location: &str) -> UnifiedEvent {
    event(id, title, location, SourceOrigin::Local)
}

pub fn external_event(id: &str, title: &str, location: &str) -> UnifiedEvent {
    event(id, title, location, SourceOrigin::External)
}

/// Row for the SQLite store, dated in the future
pub fn new_local_event(title: &str, location: &str) -> NewLocalEvent {
    NewLocalEvent {
        title: Some(title.to_string()),
        date: Some(future_start(10).format("%Y-%m-%d").to_string()),
        time: Some("19:00".to_string()),
        location: Some(location.to_string()),
        category: Some("music".to_string()),
        ..Default::default()
    }
}

/// Wait until the published state satisfies `predicate`
pub async fn wait_for_state<F>(rx: &mut watch::Receiver<FeedState>, predicate: F) -> FeedState
where
    F: FnMut(&FeedState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for feed state")
        .expect("feed state channel closed")
        .clone()
}
