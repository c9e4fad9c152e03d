//! Transport layer abstractions for lobby communication.

pub mod loopback;

pub use loopback::{LoopbackClient, LoopbackError, LoopbackHub};

use tokio::sync::mpsc::UnboundedSender;

use crate::{
    ClientEvent, DisconnectReason, OutgoingMessage, PeerId, TransportError, TransportEvent,
};

pub type TransportResult<T> = Result<T, TransportError>;

/// Server-side transport: accepts peers and moves framed messages.
///
/// Events are pushed into the channel handed to [`ServerTransport::start`];
/// the owning coordinator drains that channel on its own schedule and never
/// blocks on the transport.
pub trait ServerTransport {
    fn start(&mut self, events: UnboundedSender<TransportEvent>) -> TransportResult<()>;

    fn send(&mut self, peer: PeerId, message: OutgoingMessage) -> TransportResult<()>;

    /// Forces a peer's connection closed (kick, lobby close).
    fn disconnect(&mut self, peer: PeerId, reason: DisconnectReason) -> TransportResult<()>;
}

/// Client-side transport: one connection to the server.
pub trait ClientTransport {
    fn connect(&mut self, events: UnboundedSender<ClientEvent>) -> TransportResult<()>;

    fn send(&mut self, message: OutgoingMessage) -> TransportResult<()>;

    fn disconnect(&mut self, reason: DisconnectReason) -> TransportResult<()>;
}
