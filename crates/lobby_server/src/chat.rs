//! Chat relay identity registry.
//!
//! Chat is independent of roster mutation but resolves identities through it.
//! Directed messages target an external messaging id; the registry maps those
//! ids to session peers and is maintained alongside admissions and
//! departures. A failed resolution is not an error: the message simply stays
//! in the sender's local view.

use std::collections::HashMap;

use shared::PeerId;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ChatRelay {
    by_chat_id: HashMap<String, PeerId>,
    by_peer: HashMap<PeerId, String>,
}

impl ChatRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a peer's external messaging id on admission.
    pub fn register(&mut self, peer: PeerId, chat_id: String) {
        self.by_chat_id.insert(chat_id.clone(), peer);
        self.by_peer.insert(peer, chat_id);
    }

    pub fn unregister(&mut self, peer: PeerId) {
        if let Some(chat_id) = self.by_peer.remove(&peer) {
            self.by_chat_id.remove(&chat_id);
        }
    }

    /// Resolves a directed-message target at send time.
    pub fn resolve(&self, chat_id: &str) -> Option<PeerId> {
        let resolved = self.by_chat_id.get(chat_id).copied();
        if resolved.is_none() {
            debug!(chat_id, "directed target not known to the messaging layer");
        }
        resolved
    }

    pub fn chat_id_of(&self, peer: PeerId) -> Option<&str> {
        self.by_peer.get(&peer).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.by_chat_id.clear();
        self.by_peer.clear();
    }
}
