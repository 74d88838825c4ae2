//! Pipeline services
//!
//! Pure stages (signatures, merge, image allocation, filter/sort) plus the
//! remote catalog client.

pub mod catalog_client;
pub mod event_merger;
pub mod filter_sort;
pub mod placeholder_images;
pub mod signature;

pub use catalog_client::{CatalogError, EventCatalog, RemoteEventFetcher};
pub use event_merger::{merge_events, merge_with_report, Collision, MergeReport};
pub use filter_sort::{filter_events, sort_events, SortMode};
pub use placeholder_images::{allocate_images, ImageAllocator};
pub use signature::{identity_signature, signatures, venue_signature, EventSignatures};
