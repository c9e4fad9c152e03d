//! Server-validated mutation surface for roster records.
//!
//! Every operation validates the caller against its own peer id; kick and
//! close-lobby additionally require the caller to be the host. Mutations are
//! fire-and-forget: the roster broadcast that follows is the only observable
//! effect.

use shared::{PeerId, records::Appearance};

use crate::error::LobbyError;
use crate::gateway::sanitize_identity;
use crate::roster::Roster;

/// Flips the ready flag on the caller's own record.
pub fn toggle_ready(roster: &mut Roster, caller: PeerId) -> Result<(), LobbyError> {
    roster.mutate(caller, |record| record.ready = !record.ready)
}

/// Overwrites the appearance fields on the caller's own record.
pub fn set_appearance(
    roster: &mut Roster,
    caller: PeerId,
    appearance: Appearance,
) -> Result<(), LobbyError> {
    roster.mutate(caller, |record| record.appearance = appearance)
}

/// Overwrites the caller's display name, re-sanitized.
pub fn set_name(roster: &mut Roster, caller: PeerId, name: &str) -> Result<(), LobbyError> {
    let identity = sanitize_identity(name, caller);
    roster.mutate(caller, move |record| record.identity = identity)
}

/// Removes the target's record. Host-only; the host itself cannot be kicked.
/// The caller is responsible for forcing the target's connection closed.
pub fn kick(
    roster: &mut Roster,
    host: PeerId,
    caller: PeerId,
    target: PeerId,
) -> Result<(), LobbyError> {
    if caller != host {
        return Err(LobbyError::NotHost);
    }
    if target == host {
        return Err(LobbyError::TargetIsHost);
    }
    roster
        .remove(target)
        .map(|_| ())
        .ok_or(LobbyError::NotFound(target))
}

/// Validates a close-lobby request. The teardown itself (disconnecting every
/// non-host peer, clearing the roster) is orchestrated by the coordinator.
pub fn close_lobby(host: PeerId, caller: PeerId) -> Result<(), LobbyError> {
    if caller != host {
        return Err(LobbyError::NotHost);
    }
    Ok(())
}
