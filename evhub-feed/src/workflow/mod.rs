//! Feed workflow
//!
//! The local subscriber and the remote fetch run concurrently per session.
//! Every emission triggers a full recomputation:
//! normalize → merge/dedup → image dedup → publish.

pub mod feed_controller;
pub mod feed_session;
pub mod subscriber;

pub use feed_controller::FeedController;
pub use feed_session::{FeedDeps, FeedMessage, FeedSession, FeedState, FeedUpdate};
pub use subscriber::normalize_local_snapshot;
