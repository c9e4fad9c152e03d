//! Peer identity.
//!
//! A peer is identified by the stable per-connection handle the transport
//! assigns when the connection is established. UUIDs keep ids unique across
//! transport backends without central coordination.

use uuid::Uuid;

/// Stable per-connection identifier assigned by the transport.
pub type PeerId = Uuid;

/// The host peer always uses this id (UUID with all zeros).
///
/// In the peer-hosted topology the host's client half connects over loopback,
/// so the id is known before any handshake runs.
pub const HOST_PEER_ID: PeerId = Uuid::nil();
