//! Shared networking types for the Rumble lobby core.
//!
//! This crate hosts protocol primitives shared between client & server:
//! - ids: peer identity
//! - channels: logical channel ids for lobby traffic
//! - events: transport-level event & error types
//! - records: the replicated session record and its sub-structures
//! - protocol: request/reply envelopes for the lobby remote-call surface
//! - serialization: bincode helpers
//! - transport: transport traits + in-memory loopback hub
//!
//! Keep this crate lean: no game logic, no authority decisions. Those live in
//! `lobby_server`.

pub mod channels;
pub mod events;
pub mod ids;
pub mod messages;
pub mod protocol;
pub mod records;
pub mod serialization;
pub mod transport;

pub use events::{ClientEvent, DisconnectReason, TransportError, TransportEvent};
pub use ids::{HOST_PEER_ID, PeerId};
pub use messages::OutgoingMessage;

/// Convenience prelude for downstream crates.
pub mod prelude {
    pub use crate::channels::ChannelId;
    pub use crate::events::{ClientEvent, DisconnectReason, TransportError, TransportEvent};
    pub use crate::ids::{HOST_PEER_ID, PeerId};
    pub use crate::messages::OutgoingMessage;
    pub use crate::protocol::{LobbyReply, LobbyRequest};
    pub use crate::records::{Appearance, Progression, SessionRecord};
}
