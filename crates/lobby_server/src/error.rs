//! Error types for lobby operations.

use shared::PeerId;
use thiserror::Error;

/// Why a lobby operation was not applied.
///
/// `NotFound` usually means the request raced a disconnect; callers log it
/// and move on, because the disconnect broadcast has already corrected every
/// peer's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("lobby is full")]
    LobbyFull,
    #[error("caller is not the host")]
    NotHost,
    #[error("the host cannot be kicked")]
    TargetIsHost,
    #[error("no session record for peer {0}")]
    NotFound(PeerId),
    #[error("not every player is ready")]
    NotAllReady,
    #[error("a match transition is already running")]
    TransitionActive,
}
