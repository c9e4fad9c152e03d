//! Session gateway: admission of authenticated peers into the roster.

use shared::{
    PeerId,
    protocol::{JoinProfile, JoinRejection},
    records::SessionRecord,
};
use tracing::{info, warn};

use crate::roster::{AddOutcome, Roster};

/// Outcome of a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Admitted,
    /// The peer already holds a record. Treated as an idempotent success so a
    /// retry after a dropped acknowledgement does not error; the retry's
    /// identity/appearance payload is deliberately not reconciled onto the
    /// existing record.
    AlreadyPresent,
    Rejected(JoinRejection),
}

/// Strips control characters from a requested display name and falls back to
/// `Player_<peerId>` when nothing printable remains.
pub fn sanitize_identity(raw: &str, peer: PeerId) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        format!("Player_{peer}")
    } else {
        trimmed.to_string()
    }
}

/// Validates and admits a join request.
///
/// On admission the new record carries the sanitized identity, default
/// appearance, `ready = false`, and the progression from the peer's external
/// profile. The caller is responsible for replying to the requester and for
/// broadcasting the roster snapshot (only on actual admission — a duplicate
/// leaves the roster unchanged, so there is nothing to replicate).
pub fn request_join(
    roster: &mut Roster,
    peer: PeerId,
    identity: &str,
    profile: &JoinProfile,
) -> JoinOutcome {
    let identity = sanitize_identity(identity, peer);
    let record = SessionRecord::new(peer, identity, profile.progression);

    match roster.add(record) {
        AddOutcome::Added => {
            info!(%peer, count = roster.len(), "peer admitted to lobby");
            JoinOutcome::Admitted
        }
        AddOutcome::Duplicate => {
            warn!(%peer, "repeat join from admitted peer, acknowledging without changes");
            JoinOutcome::AlreadyPresent
        }
        AddOutcome::Full => {
            warn!(%peer, "join rejected, lobby full");
            JoinOutcome::Rejected(JoinRejection::LobbyFull)
        }
    }
}
