//! Client-side roster mirror.
//!
//! The server replicates the roster as full snapshots; the view replaces its
//! contents wholesale on every snapshot and derives everything else on read.
//! There is no delta tracking and nothing here is authoritative.

use shared::{HOST_PEER_ID, PeerId, records::SessionRecord};

#[derive(Debug, Default)]
pub struct LobbyView {
    players: Vec<SessionRecord>,
}

impl LobbyView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole view with a fresh snapshot.
    pub fn apply_snapshot(&mut self, snapshot: Vec<SessionRecord>) {
        self.players = snapshot;
    }

    pub fn players(&self) -> &[SessionRecord] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, peer: PeerId) -> Option<&SessionRecord> {
        self.players.iter().find(|record| record.peer_id == peer)
    }

    /// True when the roster is non-empty and everyone is flagged ready. Used
    /// to light up the host's start button; the server re-validates on start.
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|record| record.ready)
    }

    pub fn is_host(peer: PeerId) -> bool {
        peer == HOST_PEER_ID
    }
}
