//! evhub-feed library interface
//!
//! Merges the live local event collection with the remote catalog into one
//! de-duplicated, image-consistent list.

pub mod models;
pub mod services;
pub mod store;
pub mod workflow;

pub use models::{FeedParams, SourceOrigin, UnifiedEvent};
pub use services::{filter_events, sort_events, SortMode};
pub use store::{LocalEventStore, SqliteEventStore};
pub use workflow::{FeedController, FeedDeps, FeedState};
