//! Data models for the event feed

pub mod event;
pub mod query;

pub use event::{
    LocalEventRecord, NewLocalEvent, SourceOrigin, UnifiedEvent, DATE_TBA, UNTITLED_EVENT,
};
pub use query::{CatalogQuery, FeedParams};
