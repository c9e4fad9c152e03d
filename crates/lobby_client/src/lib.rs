//! Peer-side lobby session.
//!
//! [`LobbyClient`] owns a [`ClientTransport`] and mirrors the server's
//! replicated state: the roster view, the chat log and the latest progression
//! record. It never decides anything authoritative; every mutation is a
//! request to the server, and the local state only changes when a reply or
//! broadcast arrives.

use bytes::Bytes;
use shared::{
    ClientEvent, DisconnectReason, OutgoingMessage, PeerId, TransportError,
    protocol::{JoinProfile, JoinRejection, LobbyReply, LobbyRequest, StartRejection},
    records::{ActorSeed, Appearance},
    serialization,
    transport::{ClientTransport, TransportResult},
};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, warn};

pub mod chat;
pub mod save;
pub mod view;

pub use chat::ChatLog;
pub use save::{NullSave, ProgressKeeper, SaveCollaborator, SaveError};
pub use view::LobbyView;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("save: {0}")]
    Save(#[from] SaveError),
}

/// Where this peer is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// In the waiting room (or not yet joined).
    Lobby,
    /// The server announced the world switch; loading, ack pending or sent.
    Loading,
    /// This peer's actor has spawned.
    InMatch,
    /// Disconnected, kicked, or the lobby was closed.
    Closed,
}

pub struct LobbyClient<T: ClientTransport, S: SaveCollaborator> {
    transport: T,
    events: Option<UnboundedReceiver<ClientEvent>>,
    peer: Option<PeerId>,
    phase: SessionPhase,
    view: LobbyView,
    chat: ChatLog,
    keeper: ProgressKeeper<S>,
    joined: bool,
    join_rejection: Option<JoinRejection>,
    last_start_rejection: Option<StartRejection>,
    spawns: Vec<ActorSeed>,
    disconnect_reason: Option<DisconnectReason>,
}

impl<T: ClientTransport, S: SaveCollaborator> LobbyClient<T, S> {
    pub fn new(transport: T, collaborator: S) -> Self {
        Self {
            transport,
            events: None,
            peer: None,
            phase: SessionPhase::Lobby,
            view: LobbyView::new(),
            chat: ChatLog::new(),
            keeper: ProgressKeeper::new(collaborator),
            joined: false,
            join_rejection: None,
            last_start_rejection: None,
            spawns: Vec::new(),
            disconnect_reason: None,
        }
    }

    pub fn connect(&mut self) -> TransportResult<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.transport.connect(tx)?;
        self.events = Some(rx);
        Ok(())
    }

    pub fn peer_id(&self) -> Option<PeerId> {
        self.peer
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn view(&self) -> &LobbyView {
        &self.view
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatLog {
        &mut self.chat
    }

    pub fn progress(&self) -> &ProgressKeeper<S> {
        &self.keeper
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn join_rejection(&self) -> Option<JoinRejection> {
        self.join_rejection
    }

    pub fn last_start_rejection(&self) -> Option<StartRejection> {
        self.last_start_rejection
    }

    /// Actor seeds received since the barrier fired, for the embedder's
    /// spawner to consume.
    pub fn drain_spawns(&mut self) -> Vec<ActorSeed> {
        std::mem::take(&mut self.spawns)
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        self.disconnect_reason
    }

    pub fn request_join(&mut self, identity: &str, profile: JoinProfile) -> TransportResult<()> {
        self.send_request(&LobbyRequest::RequestJoin {
            identity: identity.to_string(),
            profile,
        })
    }

    pub fn toggle_ready(&mut self) -> TransportResult<()> {
        self.send_request(&LobbyRequest::ToggleReady)
    }

    pub fn set_appearance(&mut self, appearance: Appearance) -> TransportResult<()> {
        self.send_request(&LobbyRequest::SetAppearance(appearance))
    }

    pub fn set_name(&mut self, name: &str) -> TransportResult<()> {
        self.send_request(&LobbyRequest::SetName(name.to_string()))
    }

    pub fn kick(&mut self, target: PeerId) -> TransportResult<()> {
        self.send_request(&LobbyRequest::Kick { target })
    }

    pub fn close_lobby(&mut self) -> TransportResult<()> {
        self.send_request(&LobbyRequest::CloseLobby)
    }

    pub fn request_start(&mut self) -> TransportResult<()> {
        self.last_start_rejection = None;
        self.send_request(&LobbyRequest::RequestStart)
    }

    /// Acknowledges that the match world finished loading on this peer.
    pub fn ack_scene_loaded(&mut self) -> TransportResult<()> {
        self.send_request(&LobbyRequest::AckSceneLoaded)
    }

    pub fn send_chat(&mut self, body: &str) -> TransportResult<()> {
        self.send_request(&LobbyRequest::SendBroadcast {
            body: body.to_string(),
        })
    }

    /// Sends a directed message and echoes it into the local conversation,
    /// since the server never reflects directed messages back to the sender.
    pub fn send_directed(&mut self, target_chat_id: &str, body: &str) -> TransportResult<()> {
        self.send_request(&LobbyRequest::SendDirected {
            target_chat_id: target_chat_id.to_string(),
            body: body.to_string(),
        })?;
        self.chat
            .record_outgoing_directed(target_chat_id, body.to_string());
        Ok(())
    }

    pub fn leave(&mut self) -> TransportResult<()> {
        self.phase = SessionPhase::Closed;
        self.transport.disconnect(DisconnectReason::Graceful)
    }

    /// Drains pending transport events and applies them. Call once per tick.
    pub fn pump(&mut self) -> Result<(), ClientError> {
        let Some(events) = self.events.as_mut() else {
            return Ok(());
        };
        let mut pending = Vec::new();
        while let Ok(event) = events.try_recv() {
            pending.push(event);
        }
        for event in pending {
            self.handle_event(event)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: ClientEvent) -> Result<(), ClientError> {
        match event {
            ClientEvent::Connected { peer_id } => {
                self.peer = Some(peer_id);
            }
            ClientEvent::Disconnected { reason } => {
                self.phase = SessionPhase::Closed;
                self.disconnect_reason = Some(reason);
            }
            ClientEvent::Message { payload, .. } => {
                match serialization::decode::<LobbyReply>(&payload) {
                    Ok(reply) => self.handle_reply(reply)?,
                    Err(err) => warn!(%err, "undecodable server reply dropped"),
                }
            }
            ClientEvent::Error { error } => {
                error!(%error, "transport error");
            }
        }
        Ok(())
    }

    fn handle_reply(&mut self, reply: LobbyReply) -> Result<(), ClientError> {
        match reply {
            LobbyReply::JoinAccepted => {
                self.joined = true;
                self.join_rejection = None;
            }
            LobbyReply::JoinRejected { reason } => {
                self.join_rejection = Some(reason);
            }
            LobbyReply::RosterSnapshot(snapshot) => {
                self.view.apply_snapshot(snapshot);
            }
            LobbyReply::BeginLoading => {
                self.phase = SessionPhase::Loading;
            }
            LobbyReply::SpawnActor(seed) => {
                if Some(seed.peer_id) == self.peer {
                    self.phase = SessionPhase::InMatch;
                }
                self.spawns.push(seed);
            }
            LobbyReply::SaveProgress(record) => {
                self.keeper.apply(record)?;
            }
            LobbyReply::Chat(delivery) => {
                self.chat.record(delivery);
            }
            LobbyReply::StartRejected { reason } => {
                self.last_start_rejection = Some(reason);
            }
            LobbyReply::LobbyClosed => {
                self.phase = SessionPhase::Closed;
            }
        }
        Ok(())
    }

    fn send_request(&mut self, request: &LobbyRequest) -> TransportResult<()> {
        let bytes = serialization::encode(request)
            .map_err(|err| TransportError::Serialization(err.to_string()))?;
        self.transport
            .send(OutgoingMessage::new(request.channel(), Bytes::from(bytes)))
    }
}
