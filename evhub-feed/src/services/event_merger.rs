//! Local-first merge of local and external event lists
//!
//! **Algorithm:**
//! 1. Walk local events, then external events, in their given order
//! 2. Drop an event if its id, identity signature, or venue signature is
//!    already taken by a placed event
//! 3. Otherwise place it and claim its id and both signatures
//!
//! Because locals are walked first they win every collision. Duplicates are
//! dropped whole; the placed record is never modified.

use std::collections::HashSet;

use super::signature::signatures;
use crate::models::UnifiedEvent;

/// Why an event was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    Id,
    Identity,
    Venue,
}

/// Merge outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub placed: usize,
    pub dropped_by_id: usize,
    pub dropped_by_identity: usize,
    pub dropped_by_venue: usize,
}

impl MergeReport {
    pub fn dropped(&self) -> usize {
        self.dropped_by_id + self.dropped_by_identity + self.dropped_by_venue
    }

    fn record(&mut self, collision: Collision) {
        match collision {
            Collision::Id => self.dropped_by_id += 1,
            Collision::Identity => self.dropped_by_identity += 1,
            Collision::Venue => self.dropped_by_venue += 1,
        }
    }
}

#[derive(Default)]
struct Claimed {
    ids: HashSet<String>,
    identity: HashSet<String>,
    venue: HashSet<String>,
}

impl Claimed {
    /// Claim the event's keys, or report the first collision
    fn try_claim(&mut self, event: &UnifiedEvent) -> Result<(), Collision> {
        if self.ids.contains(&event.id) {
            return Err(Collision::Id);
        }
        let sigs = signatures(event);
        if self.identity.contains(&sigs.identity) {
            return Err(Collision::Identity);
        }
        if self.venue.contains(&sigs.venue) {
            return Err(Collision::Venue);
        }

        self.ids.insert(event.id.clone());
        self.identity.insert(sigs.identity);
        self.venue.insert(sigs.venue);
        Ok(())
    }
}

/// Merge with local precedence, returning the list and counters
pub fn merge_with_report(
    local: Vec<UnifiedEvent>,
    external: Vec<UnifiedEvent>,
) -> (Vec<UnifiedEvent>, MergeReport) {
    let mut claimed = Claimed::default();
    let mut report = MergeReport::default();
    let mut merged = Vec::with_capacity(local.len() + external.len());

    for event in local.into_iter().chain(external) {
        match claimed.try_claim(&event) {
            Ok(()) => merged.push(event),
            Err(collision) => {
                tracing::trace!(
                    id = %event.id,
                    origin = ?event.source_origin,
                    collision = ?collision,
                    "Dropping duplicate event"
                );
                report.record(collision);
            }
        }
    }

    report.placed = merged.len();
    (merged, report)
}

/// Merge with local precedence
pub fn merge_events(local: Vec<UnifiedEvent>, external: Vec<UnifiedEvent>) -> Vec<UnifiedEvent> {
    merge_with_report(local, external).0
}
