//! Replicated session state.
//!
//! A [`SessionRecord`] is the authoritative per-peer entry in the roster. The
//! server owns and mutates it; peers only ever observe broadcast snapshots.

use serde::{Deserialize, Serialize};

use crate::ids::PeerId;

/// Customization indices selected in the waiting room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appearance {
    pub body_index: u32,
    pub eyes_index: u32,
    pub gloves_index: u32,
}

/// Level/experience state, persisted by the external save collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub current_xp: u32,
}

impl Default for Progression {
    fn default() -> Self {
        // Fresh profiles start at level 1 with no experience.
        Self {
            level: 1,
            current_xp: 0,
        }
    }
}

/// Authoritative per-peer roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub peer_id: PeerId,
    /// Sanitized display name; never empty.
    pub identity: String,
    pub ready: bool,
    pub appearance: Appearance,
    pub progression: Progression,
}

impl SessionRecord {
    /// Creates a record for a freshly admitted peer: default appearance,
    /// not ready, progression copied from the peer's external profile.
    pub fn new(peer_id: PeerId, identity: String, progression: Progression) -> Self {
        Self {
            peer_id,
            identity,
            ready: false,
            appearance: Appearance::default(),
            progression,
        }
    }
}

/// Seed data handed to the in-match spawner for one peer's actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSeed {
    pub peer_id: PeerId,
    pub identity: String,
    pub appearance: Appearance,
    pub level: u32,
}

impl From<&SessionRecord> for ActorSeed {
    fn from(record: &SessionRecord) -> Self {
        Self {
            peer_id: record.peer_id,
            identity: record.identity.clone(),
            appearance: record.appearance,
            level: record.progression.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn new_record_defaults() {
        let peer = Uuid::new_v4();
        let record = SessionRecord::new(peer, "Ada".into(), Progression::default());
        assert_eq!(record.peer_id, peer);
        assert!(!record.ready);
        assert_eq!(record.appearance, Appearance::default());
        assert_eq!(record.progression.level, 1);
        assert_eq!(record.progression.current_xp, 0);
    }

    #[test]
    fn actor_seed_copies_roster_fields() {
        let mut record = SessionRecord::new(Uuid::new_v4(), "Ada".into(), Progression::default());
        record.appearance.body_index = 3;
        record.progression.level = 7;

        let seed = ActorSeed::from(&record);
        assert_eq!(seed.identity, "Ada");
        assert_eq!(seed.appearance.body_index, 3);
        assert_eq!(seed.level, 7);
    }
}
