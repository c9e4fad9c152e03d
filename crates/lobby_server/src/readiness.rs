//! Aggregate readiness.
//!
//! The predicate is derived from the roster on every evaluation and never
//! cached, so it cannot go stale relative to the records it summarizes.

use crate::roster::Roster;

/// True when the roster is non-empty and every record is flagged ready.
pub fn all_ready(roster: &Roster) -> bool {
    !roster.is_empty() && roster.iter().all(|record| record.ready)
}
