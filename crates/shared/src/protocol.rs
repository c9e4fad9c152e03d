//! Remote-call surface between peers and the lobby server.
//!
//! All lobby traffic is wrapped in two envelopes for routing: [`LobbyRequest`]
//! (peer → server) and [`LobbyReply`] (server → peer). Mutating requests carry
//! no acknowledgement of their own; the roster broadcast that follows a
//! successful mutation is the single replication path.

use serde::{Deserialize, Serialize};

use crate::channels::{self, ChannelId};
use crate::ids::PeerId;
use crate::records::{ActorSeed, Appearance, Progression, SessionRecord};

/// Identity and progression payload a peer presents on join, sourced from the
/// external identity/save collaborators on the peer's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinProfile {
    /// Progression loaded from the peer's save blob.
    pub progression: Progression,
    /// External messaging id used for directed chat resolution.
    pub chat_id: String,
}

/// Why a join request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinRejection {
    LobbyFull,
}

/// Why a start request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartRejection {
    NotHost,
    NotAllReady,
    TransitionActive,
}

/// Scope of a relayed chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatScope {
    Broadcast,
    /// Directed message; carries the sender's external messaging id so the
    /// receiver can key the conversation.
    Directed { sender_chat_id: String },
}

/// A chat message as delivered to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDelivery {
    pub scope: ChatScope,
    pub sender: String,
    pub sender_is_host: bool,
    pub body: String,
}

/// Peer → server requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyRequest {
    RequestJoin {
        identity: String,
        profile: JoinProfile,
    },
    ToggleReady,
    SetAppearance(Appearance),
    SetName(String),
    Kick {
        target: PeerId,
    },
    CloseLobby,
    RequestStart,
    AckSceneLoaded,
    SendBroadcast {
        body: String,
    },
    SendDirected {
        target_chat_id: String,
        body: String,
    },
}

/// Server → peer replies and broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyReply {
    /// Join admitted (or idempotently re-acknowledged); sent to the
    /// requester only.
    JoinAccepted,
    JoinRejected {
        reason: JoinRejection,
    },
    /// Full-snapshot replacement of the roster; broadcast after every
    /// successful mutation.
    RosterSnapshot(Vec<SessionRecord>),
    /// The world switch has begun; every peer must ack once loaded.
    BeginLoading,
    /// Spawn this peer's in-match actor. Broadcast once per roster record
    /// when the load barrier completes.
    SpawnActor(ActorSeed),
    /// Updated record for the owning peer to forward to its save
    /// collaborator. Persistence is peer-owned.
    SaveProgress(SessionRecord),
    Chat(ChatDelivery),
    StartRejected {
        reason: StartRejection,
    },
    /// The host tore the lobby down; the session is over.
    LobbyClosed,
}

impl LobbyRequest {
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::SendBroadcast { .. } | Self::SendDirected { .. } => channels::CHAT,
            _ => channels::LOBBY_CONTROL,
        }
    }
}

impl LobbyReply {
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::RosterSnapshot(_) | Self::SpawnActor(_) | Self::SaveProgress(_) => {
                channels::ROSTER_STATE
            }
            Self::Chat(_) => channels::CHAT,
            _ => channels::LOBBY_CONTROL,
        }
    }
}
