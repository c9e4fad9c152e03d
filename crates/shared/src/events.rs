//! Transport-level events and errors surfaced to higher layers.

use bytes::Bytes;
use thiserror::Error;

use crate::{channels::ChannelId, ids::PeerId};

/// Reasons why a peer might be disconnected from the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    Timeout,
    Kicked,
    LobbyClosed,
    TransportError,
}

/// Generic transport level error surfaced to higher layers.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport not ready")]
    NotReady,
    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),
    #[error("peer {0} already connected")]
    AlreadyConnected(PeerId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("other: {0}")]
    Other(String),
}

/// Server-side events emitted by a transport implementation.
///
/// The transport delivers these into the single server control-flow
/// sequentially; per-peer ordering is guaranteed, cross-peer ordering is not.
#[derive(Debug)]
pub enum TransportEvent {
    PeerConnected {
        peer: PeerId,
    },
    PeerDisconnected {
        peer: PeerId,
        reason: DisconnectReason,
    },
    Message {
        peer: PeerId,
        channel: ChannelId,
        payload: Bytes,
    },
    Error {
        peer: Option<PeerId>,
        error: TransportError,
    },
}

/// Client-side events emitted by a transport implementation.
#[derive(Debug)]
pub enum ClientEvent {
    Connected {
        peer_id: PeerId,
    },
    Disconnected {
        reason: DisconnectReason,
    },
    Message {
        channel: ChannelId,
        payload: Bytes,
    },
    Error {
        error: TransportError,
    },
}
