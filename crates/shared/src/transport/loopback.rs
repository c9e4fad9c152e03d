//! Loopback transport for in-memory client-server communication.
//!
//! Keeps up to `MaxPlayers` clients and the server in the same process
//! without touching the network stack. The host peer connects through this
//! transport in the peer-hosted topology; tests use it to drive full lobby
//! flows with zero network I/O.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

use crate::{
    ClientEvent, DisconnectReason, OutgoingMessage, PeerId, TransportError, TransportEvent,
};

use super::{ClientTransport, ServerTransport, TransportResult};

/// Error type for loopback transport operations.
#[derive(Debug, thiserror::Error)]
pub enum LoopbackError {
    #[error("loopback hub not started")]
    NotStarted,
    #[error("loopback client not connected")]
    NotConnected,
    #[error("loopback client already connected")]
    AlreadyConnected,
    #[error("loopback unknown peer {0}")]
    UnknownPeer(PeerId),
}

impl From<LoopbackError> for TransportError {
    fn from(err: LoopbackError) -> Self {
        match err {
            LoopbackError::NotStarted | LoopbackError::NotConnected => TransportError::NotReady,
            LoopbackError::AlreadyConnected => {
                TransportError::Other("loopback client already connected".into())
            }
            LoopbackError::UnknownPeer(id) => TransportError::UnknownPeer(id),
        }
    }
}

#[derive(Default)]
struct HubState {
    server_events: Mutex<Option<UnboundedSender<TransportEvent>>>,
    lanes: Mutex<HashMap<PeerId, UnboundedSender<ClientEvent>>>,
}

impl HubState {
    fn push_server_event(&self, event: TransportEvent) {
        let guard = self.server_events.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = guard.as_ref() {
            // Receiver dropped means the server is gone; nothing to deliver to.
            let _ = sender.send(event);
        }
    }

    fn server_started(&self) -> bool {
        self.server_events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn remove_lane(&self, peer: PeerId) -> Option<UnboundedSender<ClientEvent>> {
        self.lanes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&peer)
    }
}

/// Server half of the loopback transport. Accepts any number of
/// [`LoopbackClient`]s created from the same hub.
#[derive(Clone)]
pub struct LoopbackHub {
    state: Arc<HubState>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self {
            state: Arc::new(HubState::default()),
        }
    }

    /// Creates a client half with a fresh random peer id.
    pub fn client(&self) -> LoopbackClient {
        self.client_with_id(Uuid::new_v4())
    }

    /// Creates a client half with a caller-chosen peer id (the host uses
    /// `HOST_PEER_ID`).
    pub fn client_with_id(&self, peer: PeerId) -> LoopbackClient {
        LoopbackClient {
            state: Arc::clone(&self.state),
            peer,
            connected: false,
        }
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoopbackHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lanes = self.state.lanes.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("LoopbackHub")
            .field("started", &self.state.server_started())
            .field("connected_peers", &lanes.len())
            .finish()
    }
}

impl ServerTransport for LoopbackHub {
    fn start(&mut self, events: UnboundedSender<TransportEvent>) -> TransportResult<()> {
        let mut guard = self
            .state
            .server_events
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *guard = Some(events);
        Ok(())
    }

    fn send(&mut self, peer: PeerId, message: OutgoingMessage) -> TransportResult<()> {
        let lanes = self.state.lanes.lock().unwrap_or_else(|e| e.into_inner());
        let lane = lanes.get(&peer).ok_or(LoopbackError::UnknownPeer(peer))?;
        lane.send(ClientEvent::Message {
            channel: message.channel,
            payload: message.payload,
        })
        .map_err(|_| TransportError::Other(format!("peer {peer} event channel closed")))
    }

    fn disconnect(&mut self, peer: PeerId, reason: DisconnectReason) -> TransportResult<()> {
        let lane = self
            .state
            .remove_lane(peer)
            .ok_or(LoopbackError::UnknownPeer(peer))?;
        debug!(%peer, ?reason, "loopback peer disconnected by server");
        let _ = lane.send(ClientEvent::Disconnected { reason });
        self.state
            .push_server_event(TransportEvent::PeerDisconnected { peer, reason });
        Ok(())
    }
}

/// Client half of the loopback transport.
pub struct LoopbackClient {
    state: Arc<HubState>,
    peer: PeerId,
    connected: bool,
}

impl LoopbackClient {
    pub fn peer_id(&self) -> PeerId {
        self.peer
    }
}

impl std::fmt::Debug for LoopbackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackClient")
            .field("peer", &self.peer)
            .field("connected", &self.connected)
            .finish()
    }
}

impl ClientTransport for LoopbackClient {
    fn connect(&mut self, events: UnboundedSender<ClientEvent>) -> TransportResult<()> {
        if self.connected {
            return Err(LoopbackError::AlreadyConnected.into());
        }
        if !self.state.server_started() {
            return Err(LoopbackError::NotStarted.into());
        }

        {
            let mut lanes = self.state.lanes.lock().unwrap_or_else(|e| e.into_inner());
            if lanes.contains_key(&self.peer) {
                return Err(TransportError::AlreadyConnected(self.peer));
            }
            lanes.insert(self.peer, events.clone());
        }
        self.connected = true;
        debug!(peer = %self.peer, "loopback client connected");

        let _ = events.send(ClientEvent::Connected { peer_id: self.peer });
        self.state
            .push_server_event(TransportEvent::PeerConnected { peer: self.peer });
        Ok(())
    }

    fn send(&mut self, message: OutgoingMessage) -> TransportResult<()> {
        if !self.connected {
            return Err(LoopbackError::NotConnected.into());
        }
        // Lane removal means the server disconnected us and this half has not
        // observed it yet.
        let still_known = {
            let lanes = self.state.lanes.lock().unwrap_or_else(|e| e.into_inner());
            lanes.contains_key(&self.peer)
        };
        if !still_known {
            self.connected = false;
            return Err(LoopbackError::NotConnected.into());
        }

        self.state.push_server_event(TransportEvent::Message {
            peer: self.peer,
            channel: message.channel,
            payload: message.payload,
        });
        Ok(())
    }

    fn disconnect(&mut self, reason: DisconnectReason) -> TransportResult<()> {
        if !self.connected {
            return Err(LoopbackError::NotConnected.into());
        }
        self.connected = false;
        debug!(peer = %self.peer, ?reason, "loopback client disconnecting");

        if let Some(lane) = self.state.remove_lane(self.peer) {
            let _ = lane.send(ClientEvent::Disconnected { reason });
        }
        self.state
            .push_server_event(TransportEvent::PeerDisconnected {
                peer: self.peer,
                reason,
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn connect_emits_events_on_both_sides() {
        let mut hub = LoopbackHub::new();
        let (server_tx, mut server_rx) = unbounded_channel();
        hub.start(server_tx).unwrap();

        let mut client = hub.client();
        let (client_tx, mut client_rx) = unbounded_channel();
        client.connect(client_tx).unwrap();

        assert!(matches!(
            client_rx.try_recv().unwrap(),
            ClientEvent::Connected { peer_id } if peer_id == client.peer_id()
        ));
        assert!(matches!(
            server_rx.try_recv().unwrap(),
            TransportEvent::PeerConnected { peer } if peer == client.peer_id()
        ));
    }

    #[test]
    fn connect_before_start_fails() {
        let hub = LoopbackHub::new();
        let mut client = hub.client();
        let (client_tx, _client_rx) = unbounded_channel();
        assert!(matches!(
            client.connect(client_tx),
            Err(TransportError::NotReady)
        ));
    }

    #[test]
    fn message_roundtrip() {
        let mut hub = LoopbackHub::new();
        let (server_tx, mut server_rx) = unbounded_channel();
        hub.start(server_tx).unwrap();

        let mut client = hub.client();
        let (client_tx, mut client_rx) = unbounded_channel();
        client.connect(client_tx).unwrap();
        let _ = server_rx.try_recv();
        let _ = client_rx.try_recv();

        client
            .send(OutgoingMessage::new(0, Bytes::from("client hello")))
            .unwrap();
        assert!(matches!(
            server_rx.try_recv().unwrap(),
            TransportEvent::Message { peer, channel: 0, payload }
                if peer == client.peer_id() && payload.as_ref() == b"client hello"
        ));

        hub.send(
            client.peer_id(),
            OutgoingMessage::new(1, Bytes::from("server reply")),
        )
        .unwrap();
        assert!(matches!(
            client_rx.try_recv().unwrap(),
            ClientEvent::Message { channel: 1, payload } if payload.as_ref() == b"server reply"
        ));
    }

    #[test]
    fn several_clients_have_isolated_lanes() {
        let mut hub = LoopbackHub::new();
        let (server_tx, mut _server_rx) = unbounded_channel();
        hub.start(server_tx).unwrap();

        let mut a = hub.client();
        let mut b = hub.client();
        let (a_tx, mut a_rx) = unbounded_channel();
        let (b_tx, mut b_rx) = unbounded_channel();
        a.connect(a_tx).unwrap();
        b.connect(b_tx).unwrap();
        let _ = a_rx.try_recv();
        let _ = b_rx.try_recv();

        hub.send(a.peer_id(), OutgoingMessage::new(0, Bytes::from("for a")))
            .unwrap();

        assert!(matches!(
            a_rx.try_recv().unwrap(),
            ClientEvent::Message { payload, .. } if payload.as_ref() == b"for a"
        ));
        assert!(b_rx.try_recv().is_err());
    }

    #[test]
    fn server_disconnect_notifies_client_and_server() {
        let mut hub = LoopbackHub::new();
        let (server_tx, mut server_rx) = unbounded_channel();
        hub.start(server_tx).unwrap();

        let mut client = hub.client();
        let (client_tx, mut client_rx) = unbounded_channel();
        client.connect(client_tx).unwrap();
        let _ = server_rx.try_recv();
        let _ = client_rx.try_recv();

        hub.disconnect(client.peer_id(), DisconnectReason::Kicked)
            .unwrap();

        assert!(matches!(
            client_rx.try_recv().unwrap(),
            ClientEvent::Disconnected {
                reason: DisconnectReason::Kicked
            }
        ));
        assert!(matches!(
            server_rx.try_recv().unwrap(),
            TransportEvent::PeerDisconnected { peer, reason: DisconnectReason::Kicked }
                if peer == client.peer_id()
        ));

        // Sends after a forced disconnect fail on the client side.
        assert!(
            client
                .send(OutgoingMessage::new(0, Bytes::from("late")))
                .is_err()
        );
    }

    #[test]
    fn client_disconnect_lifecycle() {
        let mut hub = LoopbackHub::new();
        let (server_tx, mut server_rx) = unbounded_channel();
        hub.start(server_tx).unwrap();

        let mut client = hub.client();
        let (client_tx, mut client_rx) = unbounded_channel();
        client.connect(client_tx).unwrap();
        let _ = server_rx.try_recv();
        let _ = client_rx.try_recv();

        client.disconnect(DisconnectReason::Graceful).unwrap();

        assert!(matches!(
            server_rx.try_recv().unwrap(),
            TransportEvent::PeerDisconnected { peer, reason: DisconnectReason::Graceful }
                if peer == client.peer_id()
        ));
        assert!(
            client
                .send(OutgoingMessage::new(0, Bytes::from("late")))
                .is_err()
        );
    }

    #[test]
    fn duplicate_peer_id_rejected() {
        let mut hub = LoopbackHub::new();
        let (server_tx, mut _server_rx) = unbounded_channel();
        hub.start(server_tx).unwrap();

        let peer = Uuid::new_v4();
        let mut first = hub.client_with_id(peer);
        let mut second = hub.client_with_id(peer);

        let (first_tx, _first_rx) = unbounded_channel();
        let (second_tx, _second_rx) = unbounded_channel();
        first.connect(first_tx).unwrap();
        assert!(matches!(
            second.connect(second_tx),
            Err(TransportError::AlreadyConnected(id)) if id == peer
        ));
    }
}
