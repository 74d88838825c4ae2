//! Test Helper Utilities
//!
//! Shared fixtures and collaborator stubs for evhub-feed tests

#![allow(dead_code)]

pub mod fixtures;
pub mod stubs;

pub use fixtures::{external_event, future_start, local_event, new_local_event, wait_for_state};
pub use stubs::{ErroringStore, FailingStore, StaticCatalog};
