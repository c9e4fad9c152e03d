//! Transport driver for the lobby coordinator.
//!
//! [`LobbyHost`] owns a [`ServerTransport`] and a [`LobbyServer`] and moves
//! data between them: transport events are drained into the coordinator, and
//! the coordinator's queued replies are encoded and handed back to the
//! transport. The coordinator itself never touches the wire.

use shared::{
    PeerId, TransportEvent,
    transport::{ServerTransport, TransportResult},
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;

use crate::{LobbyConfig, LobbyServer, encode_reply};

pub struct LobbyHost<T: ServerTransport> {
    transport: T,
    server: LobbyServer,
    events: Option<UnboundedReceiver<TransportEvent>>,
}

impl<T: ServerTransport> LobbyHost<T> {
    pub fn new(transport: T, host: PeerId, config: LobbyConfig) -> Self {
        Self {
            transport,
            server: LobbyServer::new(host, config),
            events: None,
        }
    }

    /// Starts the transport and begins accepting peers.
    pub fn start(&mut self) -> TransportResult<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.transport.start(tx)?;
        self.events = Some(rx);
        Ok(())
    }

    pub fn server(&self) -> &LobbyServer {
        &self.server
    }

    /// Match-triggered XP award, flushed to peers immediately.
    pub fn award_xp(&mut self, peer: PeerId, amount: u32) {
        self.server.award_xp(peer, amount);
        self.flush();
    }

    /// Drains pending transport events into the coordinator and flushes
    /// whatever it queued. Call once per tick.
    pub fn pump(&mut self) {
        let Some(events) = self.events.as_mut() else {
            return;
        };
        while let Ok(event) = events.try_recv() {
            self.server.handle_event(event);
        }
        self.flush();
    }

    fn flush(&mut self) {
        for (target, reply) in self.server.drain_outgoing() {
            let message = match encode_reply(&reply) {
                Ok(message) => message,
                Err(err) => {
                    warn!(%err, "reply not encodable, dropped");
                    continue;
                }
            };
            match target {
                Some(peer) => {
                    if let Err(err) = self.transport.send(peer, message) {
                        warn!(%peer, %err, "send failed");
                    }
                }
                None => {
                    for peer in self.server.connected_peers().to_vec() {
                        if let Err(err) = self.transport.send(peer, message.clone()) {
                            warn!(%peer, %err, "broadcast send failed");
                        }
                    }
                }
            }
        }

        // Closed after the flush so teardown notices reach the peer first.
        for (peer, reason) in self.server.drain_forced_disconnects() {
            if let Err(err) = self.transport.disconnect(peer, reason) {
                warn!(%peer, %err, "forced disconnect failed");
            }
        }
    }
}
