//! Authoritative roster store.
//!
//! Single source of truth for session records. Only the server mutates it;
//! peers observe full-snapshot broadcasts. Records are addressed by peer id,
//! never by position, so a stale index can never reach the wrong record after
//! a concurrent removal.

use shared::{PeerId, records::SessionRecord};
use tracing::debug;

use crate::error::LobbyError;

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Capacity reached; the record was not inserted.
    Full,
    /// A record for this peer id already exists; the roster is unchanged.
    Duplicate,
}

/// Ordered collection of session records, bounded by the configured capacity.
#[derive(Debug)]
pub struct Roster {
    records: Vec<SessionRecord>,
    max_players: usize,
}

impl Roster {
    pub fn new(max_players: usize) -> Self {
        Self {
            records: Vec::with_capacity(max_players),
            max_players,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.records.iter().any(|r| r.peer_id == peer)
    }

    pub fn get(&self, peer: PeerId) -> Option<&SessionRecord> {
        self.records.iter().find(|r| r.peer_id == peer)
    }

    /// Inserts a record. The duplicate check runs before the capacity check
    /// so a retried join against a full lobby still reads as a duplicate.
    pub fn add(&mut self, record: SessionRecord) -> AddOutcome {
        if self.contains(record.peer_id) {
            return AddOutcome::Duplicate;
        }
        if self.records.len() >= self.max_players {
            return AddOutcome::Full;
        }
        self.records.push(record);
        AddOutcome::Added
    }

    pub fn remove(&mut self, peer: PeerId) -> Option<SessionRecord> {
        let position = self.records.iter().position(|r| r.peer_id == peer)?;
        let record = self.records.remove(position);
        debug!(%peer, identity = %record.identity, "removed session record");
        Some(record)
    }

    /// Applies a mutation to the record owned by `peer`.
    pub fn mutate<F>(&mut self, peer: PeerId, f: F) -> Result<(), LobbyError>
    where
        F: FnOnce(&mut SessionRecord),
    {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.peer_id == peer)
            .ok_or(LobbyError::NotFound(peer))?;
        f(record);
        Ok(())
    }

    /// Full ordered copy for broadcast replication.
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        self.records.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
