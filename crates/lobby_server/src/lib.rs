//! Server-authoritative lobby core.
//!
//! [`LobbyServer`] is the single coordinator that owns all shared mutable
//! lobby state (roster and load-ack set). The transport delivers remote calls
//! into it sequentially, so there is no multi-writer contention; peers only
//! ever observe broadcast snapshots. The coordinator is an explicitly owned
//! value injected into the transport layer at startup — see [`host::LobbyHost`].
//!
//! Request handling is non-blocking throughout: the start-to-spawn path spans
//! several round trips (world switch, per-peer load acks) and is modeled as
//! incremental accumulation in [`barrier::TransitionBarrier`], re-tested on
//! every arrival.

use bytes::Bytes;
use shared::{
    DisconnectReason, PeerId, TransportEvent,
    protocol::{ChatDelivery, ChatScope, LobbyReply, LobbyRequest, StartRejection},
    records::ActorSeed,
    serialization,
};
use tracing::{debug, error, info, warn};

pub mod barrier;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod host;
pub mod mutation;
pub mod progression;
pub mod readiness;
pub mod roster;

pub use config::LobbyConfig;
pub use error::LobbyError;
pub use host::LobbyHost;

use barrier::{AckOutcome, BarrierPhase, TransitionBarrier};
use chat::ChatRelay;
use gateway::JoinOutcome;
use roster::Roster;

/// A reply queued for delivery. `None` targets every connected peer.
pub type QueuedReply = (Option<PeerId>, LobbyReply);

/// The authoritative lobby coordinator.
pub struct LobbyServer {
    config: LobbyConfig,
    host: PeerId,
    roster: Roster,
    barrier: TransitionBarrier,
    chat: ChatRelay,
    /// Transport-level connections, which may include peers that have not
    /// joined the roster yet. This is the barrier's requirement set.
    connected: Vec<PeerId>,
    outgoing: Vec<QueuedReply>,
    forced_disconnects: Vec<(PeerId, DisconnectReason)>,
    closed: bool,
}

impl LobbyServer {
    pub fn new(host: PeerId, config: LobbyConfig) -> Self {
        let roster = Roster::new(config.max_players);
        Self {
            config,
            host,
            roster,
            barrier: TransitionBarrier::new(),
            chat: ChatRelay::new(),
            connected: Vec::new(),
            outgoing: Vec::new(),
            forced_disconnects: Vec::new(),
            closed: false,
        }
    }

    pub fn host(&self) -> PeerId {
        self.host
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn barrier_phase(&self) -> BarrierPhase {
        self.barrier.phase()
    }

    pub fn connected_peers(&self) -> &[PeerId] {
        &self.connected
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Feeds one transport event into the coordinator.
    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::PeerConnected { peer } => {
                if !self.connected.contains(&peer) {
                    self.connected.push(peer);
                    info!(%peer, connected = self.connected.len(), "peer connected");
                }
            }
            TransportEvent::PeerDisconnected { peer, reason } => {
                self.handle_disconnect(peer, reason);
            }
            TransportEvent::Message { peer, payload, .. } => {
                match serialization::decode::<LobbyRequest>(&payload) {
                    Ok(request) => self.handle_request(peer, request),
                    Err(err) => warn!(%peer, %err, "undecodable lobby request dropped"),
                }
            }
            TransportEvent::Error { peer, error } => {
                error!(?peer, %error, "transport error");
            }
        }
    }

    /// Awards XP to a peer's record. Match-triggered, never peer-invocable:
    /// this entry point is not reachable from the request surface.
    pub fn award_xp(&mut self, peer: PeerId, amount: u32) {
        let config = self.config.clone();
        match self
            .roster
            .mutate(peer, |record| {
                progression::award_xp(&config, &mut record.progression, amount)
            }) {
            Ok(()) => {
                self.broadcast_snapshot();
                if let Some(record) = self.roster.get(peer) {
                    // The owning peer forwards this to the save collaborator;
                    // the server never persists.
                    self.outgoing
                        .push((Some(peer), LobbyReply::SaveProgress(record.clone())));
                }
            }
            Err(err) => debug!(%peer, %err, "xp award raced a disconnect, dropped"),
        }
    }

    /// Drains replies queued since the last drain.
    pub fn drain_outgoing(&mut self) -> Vec<QueuedReply> {
        std::mem::take(&mut self.outgoing)
    }

    /// Drains connection-close requests (kicks, lobby close) for the
    /// transport to execute.
    pub fn drain_forced_disconnects(&mut self) -> Vec<(PeerId, DisconnectReason)> {
        std::mem::take(&mut self.forced_disconnects)
    }

    fn handle_request(&mut self, peer: PeerId, request: LobbyRequest) {
        if self.closed {
            debug!(%peer, "request ignored, lobby closed");
            return;
        }

        match request {
            LobbyRequest::RequestJoin { identity, profile } => {
                match gateway::request_join(&mut self.roster, peer, &identity, &profile) {
                    JoinOutcome::Admitted => {
                        self.chat.register(peer, profile.chat_id);
                        self.outgoing.push((Some(peer), LobbyReply::JoinAccepted));
                        self.broadcast_snapshot();
                    }
                    JoinOutcome::AlreadyPresent => {
                        // Idempotent retry: acknowledge, replicate nothing.
                        self.outgoing.push((Some(peer), LobbyReply::JoinAccepted));
                    }
                    JoinOutcome::Rejected(reason) => {
                        self.outgoing
                            .push((Some(peer), LobbyReply::JoinRejected { reason }));
                    }
                }
            }
            LobbyRequest::ToggleReady => {
                let result = mutation::toggle_ready(&mut self.roster, peer);
                self.apply_mutation(peer, result);
            }
            LobbyRequest::SetAppearance(appearance) => {
                let result = mutation::set_appearance(&mut self.roster, peer, appearance);
                self.apply_mutation(peer, result);
            }
            LobbyRequest::SetName(name) => {
                let result = mutation::set_name(&mut self.roster, peer, &name);
                self.apply_mutation(peer, result);
            }
            LobbyRequest::Kick { target } => {
                match mutation::kick(&mut self.roster, self.host, peer, target) {
                    Ok(()) => {
                        info!(%target, "peer kicked by host");
                        self.broadcast_snapshot();
                        self.forced_disconnects
                            .push((target, DisconnectReason::Kicked));
                    }
                    Err(err) => warn!(%peer, %target, %err, "kick rejected"),
                }
            }
            LobbyRequest::CloseLobby => match mutation::close_lobby(self.host, peer) {
                Ok(()) => self.close_lobby(),
                Err(err) => warn!(%peer, %err, "close-lobby rejected"),
            },
            LobbyRequest::RequestStart => self.handle_request_start(peer),
            LobbyRequest::AckSceneLoaded => {
                let outcome = self.barrier.record_ack(peer, &self.connected);
                self.after_barrier_input(outcome);
            }
            LobbyRequest::SendBroadcast { body } => self.handle_broadcast_chat(peer, body),
            LobbyRequest::SendDirected {
                target_chat_id,
                body,
            } => self.handle_directed_chat(peer, &target_chat_id, body),
        }
    }

    fn handle_disconnect(&mut self, peer: PeerId, reason: DisconnectReason) {
        info!(%peer, ?reason, "peer disconnected");
        self.connected.retain(|p| *p != peer);
        self.chat.unregister(peer);

        // No grace period, no reconnection window.
        if self.roster.remove(peer).is_some() {
            self.broadcast_snapshot();
        }

        if self.barrier.is_active() {
            if peer == self.host {
                self.barrier.abort();
            } else {
                let outcome = self.barrier.peer_left(peer, &self.connected);
                self.after_barrier_input(outcome);
            }
        }
    }

    fn handle_request_start(&mut self, peer: PeerId) {
        let rejection = if peer != self.host {
            Some(StartRejection::NotHost)
        } else if self.barrier.is_active() {
            Some(StartRejection::TransitionActive)
        } else if !readiness::all_ready(&self.roster) {
            Some(StartRejection::NotAllReady)
        } else {
            None
        };

        match rejection {
            Some(reason) => {
                warn!(%peer, ?reason, "start request rejected");
                self.outgoing
                    .push((Some(peer), LobbyReply::StartRejected { reason }));
            }
            None => {
                self.barrier.begin();
                self.outgoing.push((None, LobbyReply::BeginLoading));
            }
        }
    }

    fn after_barrier_input(&mut self, outcome: AckOutcome) {
        match outcome {
            AckOutcome::Complete => self.spawn_actors(),
            AckOutcome::Pending | AckOutcome::Ignored => {}
        }
    }

    /// The barrier fired: every roster record gets its in-match actor, seeded
    /// with identity, appearance and level, then the machine returns to idle.
    fn spawn_actors(&mut self) {
        info!(players = self.roster.len(), "all peers loaded, spawning actors");
        for record in self.roster.iter() {
            self.outgoing
                .push((None, LobbyReply::SpawnActor(ActorSeed::from(record))));
        }
        self.barrier.complete();
    }

    fn handle_broadcast_chat(&mut self, peer: PeerId, body: String) {
        let Some(record) = self.roster.get(peer) else {
            debug!(%peer, "chat from peer without session record dropped");
            return;
        };
        let delivery = ChatDelivery {
            scope: ChatScope::Broadcast,
            sender: record.identity.clone(),
            sender_is_host: peer == self.host,
            body,
        };
        self.outgoing.push((None, LobbyReply::Chat(delivery)));
    }

    fn handle_directed_chat(&mut self, peer: PeerId, target_chat_id: &str, body: String) {
        let Some(record) = self.roster.get(peer) else {
            debug!(%peer, "directed chat from peer without session record dropped");
            return;
        };
        let Some(sender_chat_id) = self.chat.chat_id_of(peer) else {
            debug!(%peer, "directed chat from peer without chat id dropped");
            return;
        };

        match self.chat.resolve(target_chat_id) {
            Some(target) => {
                let delivery = ChatDelivery {
                    scope: ChatScope::Directed {
                        sender_chat_id: sender_chat_id.to_string(),
                    },
                    sender: record.identity.clone(),
                    sender_is_host: peer == self.host,
                    body,
                };
                self.outgoing.push((Some(target), LobbyReply::Chat(delivery)));
            }
            None => {
                // Undeliverable: the sender keeps its local copy, nothing is
                // relayed and no error is surfaced.
                debug!(%peer, target_chat_id, "directed chat target unresolved");
            }
        }
    }

    fn close_lobby(&mut self) {
        info!("host is closing the lobby");
        for &peer in &self.connected {
            if peer != self.host {
                self.forced_disconnects
                    .push((peer, DisconnectReason::LobbyClosed));
            }
        }
        self.roster.clear();
        self.chat.clear();
        self.outgoing.push((None, LobbyReply::LobbyClosed));
        self.closed = true;
    }

    fn apply_mutation(&mut self, peer: PeerId, result: Result<(), LobbyError>) {
        match result {
            Ok(()) => self.broadcast_snapshot(),
            // Raced with a disconnect; the removal broadcast already
            // corrected every peer's view.
            Err(err) => debug!(%peer, %err, "mutation dropped"),
        }
    }

    fn broadcast_snapshot(&mut self) {
        self.outgoing
            .push((None, LobbyReply::RosterSnapshot(self.roster.snapshot())));
    }
}

/// Encodes a reply for the wire, pairing it with its channel.
pub fn encode_reply(reply: &LobbyReply) -> Result<shared::OutgoingMessage, shared::TransportError> {
    let bytes = serialization::encode(reply)
        .map_err(|err| shared::TransportError::Serialization(err.to_string()))?;
    Ok(shared::OutgoingMessage::new(
        reply.channel(),
        Bytes::from(bytes),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        HOST_PEER_ID,
        protocol::{JoinProfile, JoinRejection},
        records::{Appearance, Progression},
    };
    use uuid::Uuid;

    fn profile(chat_id: &str) -> JoinProfile {
        JoinProfile {
            progression: Progression::default(),
            chat_id: chat_id.into(),
        }
    }

    fn encode_request(request: &LobbyRequest) -> Bytes {
        Bytes::from(serialization::encode(request).unwrap())
    }

    struct Harness {
        server: LobbyServer,
    }

    impl Harness {
        fn new() -> Self {
            let mut server = LobbyServer::new(HOST_PEER_ID, LobbyConfig::default());
            server.handle_event(TransportEvent::PeerConnected { peer: HOST_PEER_ID });
            Self { server }
        }

        fn connect(&mut self) -> PeerId {
            let peer = Uuid::new_v4();
            self.server
                .handle_event(TransportEvent::PeerConnected { peer });
            peer
        }

        fn request(&mut self, peer: PeerId, request: LobbyRequest) {
            let payload = encode_request(&request);
            self.server.handle_event(TransportEvent::Message {
                peer,
                channel: request.channel(),
                payload,
            });
        }

        fn join(&mut self, peer: PeerId, identity: &str) {
            self.request(
                peer,
                LobbyRequest::RequestJoin {
                    identity: identity.into(),
                    profile: profile(&format!("chat-{peer}")),
                },
            );
        }

        fn disconnect(&mut self, peer: PeerId) {
            self.server.handle_event(TransportEvent::PeerDisconnected {
                peer,
                reason: DisconnectReason::Graceful,
            });
        }

        fn replies(&mut self) -> Vec<QueuedReply> {
            self.server.drain_outgoing()
        }

        fn join_all_ready(&mut self, extra_peers: usize) -> Vec<PeerId> {
            let mut peers = vec![HOST_PEER_ID];
            self.join(HOST_PEER_ID, "host");
            for i in 0..extra_peers {
                let peer = self.connect();
                self.join(peer, &format!("p{i}"));
                peers.push(peer);
            }
            for &peer in &peers {
                self.request(peer, LobbyRequest::ToggleReady);
            }
            self.replies();
            peers
        }
    }

    #[test]
    fn first_join_creates_single_unready_record() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.join(peer, "Ada");

        let roster = h.server.roster();
        assert_eq!(roster.len(), 1);
        let record = roster.get(peer).unwrap();
        assert_eq!(record.identity, "Ada");
        assert!(!record.ready);

        let replies = h.replies();
        assert!(replies
            .iter()
            .any(|(target, reply)| *target == Some(peer)
                && matches!(reply, LobbyReply::JoinAccepted)));
        assert!(replies.iter().any(|(target, reply)| target.is_none()
            && matches!(reply, LobbyReply::RosterSnapshot(list) if list.len() == 1)));
    }

    #[test]
    fn sixth_join_rejected_lobby_full() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        for i in 0..4 {
            let peer = h.connect();
            h.join(peer, &format!("p{i}"));
        }
        assert_eq!(h.server.roster().len(), 5);
        h.replies();

        let late = h.connect();
        h.join(late, "late");
        assert_eq!(h.server.roster().len(), 5);

        let replies = h.replies();
        assert_eq!(
            replies,
            vec![(
                Some(late),
                LobbyReply::JoinRejected {
                    reason: JoinRejection::LobbyFull
                }
            )]
        );
    }

    #[test]
    fn duplicate_join_acknowledged_without_broadcast() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.join(peer, "Ada");
        h.replies();

        h.join(peer, "Ada");
        let replies = h.replies();
        assert_eq!(replies, vec![(Some(peer), LobbyReply::JoinAccepted)]);
        assert_eq!(h.server.roster().len(), 1);
    }

    #[test]
    fn every_successful_mutation_broadcasts_a_snapshot() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.join(peer, "Ada");
        h.replies();

        h.request(peer, LobbyRequest::ToggleReady);
        h.request(
            peer,
            LobbyRequest::SetAppearance(Appearance {
                body_index: 1,
                eyes_index: 2,
                gloves_index: 3,
            }),
        );
        h.request(peer, LobbyRequest::SetName("Lovelace".into()));

        let replies = h.replies();
        let snapshots: Vec<_> = replies
            .iter()
            .filter(|(target, reply)| {
                target.is_none() && matches!(reply, LobbyReply::RosterSnapshot(_))
            })
            .collect();
        assert_eq!(snapshots.len(), 3);

        let record = h.server.roster().get(peer).unwrap();
        assert!(record.ready);
        assert_eq!(record.appearance.gloves_index, 3);
        assert_eq!(record.identity, "Lovelace");
    }

    #[test]
    fn mutation_racing_disconnect_is_swallowed() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.join(peer, "Ada");
        h.disconnect(peer);
        h.replies();

        h.request(peer, LobbyRequest::ToggleReady);
        assert!(h.replies().is_empty());
    }

    #[test]
    fn start_rejected_until_all_ready() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        let a = h.connect();
        let b = h.connect();
        h.join(a, "a");
        h.join(b, "b");

        // 2 of 3 ready.
        h.request(HOST_PEER_ID, LobbyRequest::ToggleReady);
        h.request(a, LobbyRequest::ToggleReady);
        h.replies();

        h.request(HOST_PEER_ID, LobbyRequest::RequestStart);
        let replies = h.replies();
        assert_eq!(
            replies,
            vec![(
                Some(HOST_PEER_ID),
                LobbyReply::StartRejected {
                    reason: StartRejection::NotAllReady
                }
            )]
        );
        assert_eq!(h.server.barrier_phase(), BarrierPhase::Idle);
    }

    #[test]
    fn start_rejected_for_non_host() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.join(peer, "Ada");
        h.request(peer, LobbyRequest::ToggleReady);
        h.replies();

        h.request(peer, LobbyRequest::RequestStart);
        let replies = h.replies();
        assert_eq!(
            replies,
            vec![(
                Some(peer),
                LobbyReply::StartRejected {
                    reason: StartRejection::NotHost
                }
            )]
        );
    }

    #[test]
    fn barrier_spawns_after_exactly_all_acks() {
        let mut h = Harness::new();
        let peers = h.join_all_ready(2);

        h.request(HOST_PEER_ID, LobbyRequest::RequestStart);
        let replies = h.replies();
        assert!(replies
            .iter()
            .any(|(target, reply)| target.is_none()
                && matches!(reply, LobbyReply::BeginLoading)));

        // Two of three acks: nothing spawns.
        h.request(peers[0], LobbyRequest::AckSceneLoaded);
        h.request(peers[1], LobbyRequest::AckSceneLoaded);
        assert!(h.replies().is_empty());
        assert_eq!(h.server.barrier_phase(), BarrierPhase::WaitingForAcks);

        // Third ack fires the barrier.
        h.request(peers[2], LobbyRequest::AckSceneLoaded);
        let replies = h.replies();
        let spawns: Vec<_> = replies
            .iter()
            .filter(|(_, reply)| matches!(reply, LobbyReply::SpawnActor(_)))
            .collect();
        assert_eq!(spawns.len(), 3);
        assert_eq!(h.server.barrier_phase(), BarrierPhase::Idle);

        // A fourth, spurious ack is a no-op.
        h.request(peers[0], LobbyRequest::AckSceneLoaded);
        assert!(h.replies().is_empty());
    }

    #[test]
    fn disconnect_during_wait_does_not_block_barrier() {
        let mut h = Harness::new();
        let peers = h.join_all_ready(2);

        h.request(HOST_PEER_ID, LobbyRequest::RequestStart);
        h.replies();

        h.request(peers[0], LobbyRequest::AckSceneLoaded);
        h.request(peers[1], LobbyRequest::AckSceneLoaded);

        // The remaining peer disconnects instead of acking: the barrier
        // completes and only the two survivors spawn.
        h.disconnect(peers[2]);
        let replies = h.replies();
        let spawns: Vec<_> = replies
            .iter()
            .filter_map(|(_, reply)| match reply {
                LobbyReply::SpawnActor(seed) => Some(seed.peer_id),
                _ => None,
            })
            .collect();
        assert_eq!(spawns.len(), 2);
        assert!(spawns.contains(&peers[0]));
        assert!(spawns.contains(&peers[1]));
    }

    #[test]
    fn host_disconnect_aborts_transition() {
        let mut h = Harness::new();
        let peers = h.join_all_ready(1);

        h.request(HOST_PEER_ID, LobbyRequest::RequestStart);
        h.replies();

        h.disconnect(HOST_PEER_ID);
        assert_eq!(h.server.barrier_phase(), BarrierPhase::Aborted);

        h.request(peers[1], LobbyRequest::AckSceneLoaded);
        assert!(
            !h.replies()
                .iter()
                .any(|(_, reply)| matches!(reply, LobbyReply::SpawnActor(_)))
        );
    }

    #[test]
    fn spawn_seeds_carry_roster_state() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        h.request(
            HOST_PEER_ID,
            LobbyRequest::SetAppearance(Appearance {
                body_index: 7,
                eyes_index: 0,
                gloves_index: 2,
            }),
        );
        h.request(HOST_PEER_ID, LobbyRequest::ToggleReady);
        h.replies();

        h.request(HOST_PEER_ID, LobbyRequest::RequestStart);
        h.request(HOST_PEER_ID, LobbyRequest::AckSceneLoaded);

        let replies = h.replies();
        let seed = replies
            .iter()
            .find_map(|(_, reply)| match reply {
                LobbyReply::SpawnActor(seed) => Some(seed),
                _ => None,
            })
            .unwrap();
        assert_eq!(seed.identity, "host");
        assert_eq!(seed.appearance.body_index, 7);
        assert_eq!(seed.level, 1);
    }

    #[test]
    fn kick_by_host_removes_and_force_disconnects() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        let target = h.connect();
        h.join(target, "t");
        h.replies();

        h.request(HOST_PEER_ID, LobbyRequest::Kick { target });
        assert!(!h.server.roster().contains(target));
        assert_eq!(
            h.server.drain_forced_disconnects(),
            vec![(target, DisconnectReason::Kicked)]
        );
    }

    #[test]
    fn kick_by_non_host_rejected_roster_unchanged() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        let a = h.connect();
        let b = h.connect();
        h.join(a, "a");
        h.join(b, "b");
        h.replies();

        h.request(a, LobbyRequest::Kick { target: b });
        assert_eq!(h.server.roster().len(), 3);
        assert!(h.server.drain_forced_disconnects().is_empty());
        assert!(h.replies().is_empty());
    }

    #[test]
    fn kicking_the_host_is_rejected() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        h.replies();

        h.request(
            HOST_PEER_ID,
            LobbyRequest::Kick {
                target: HOST_PEER_ID,
            },
        );
        assert!(h.server.roster().contains(HOST_PEER_ID));
        assert!(h.server.drain_forced_disconnects().is_empty());
    }

    #[test]
    fn close_lobby_tears_everything_down() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        let a = h.connect();
        let b = h.connect();
        h.join(a, "a");
        h.join(b, "b");
        h.replies();

        h.request(HOST_PEER_ID, LobbyRequest::CloseLobby);
        assert!(h.server.is_closed());
        assert!(h.server.roster().is_empty());

        let disconnects = h.server.drain_forced_disconnects();
        assert_eq!(disconnects.len(), 2);
        assert!(disconnects
            .iter()
            .all(|(peer, reason)| *peer != HOST_PEER_ID
                && *reason == DisconnectReason::LobbyClosed));

        assert!(h
            .replies()
            .iter()
            .any(|(target, reply)| target.is_none()
                && matches!(reply, LobbyReply::LobbyClosed)));

        // Requests after teardown are ignored.
        h.request(a, LobbyRequest::ToggleReady);
        assert!(h.replies().is_empty());
    }

    #[test]
    fn close_lobby_by_non_host_rejected() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        let a = h.connect();
        h.join(a, "a");
        h.replies();

        h.request(a, LobbyRequest::CloseLobby);
        assert!(!h.server.is_closed());
        assert_eq!(h.server.roster().len(), 2);
    }

    #[test]
    fn award_xp_updates_record_and_requests_save() {
        let mut h = Harness::new();
        let peer = h.connect();
        h.join(peer, "Ada");
        h.replies();

        h.server.award_xp(peer, 250);

        let record = h.server.roster().get(peer).unwrap();
        assert_eq!(record.progression.level, 3);
        assert_eq!(record.progression.current_xp, 30);

        let replies = h.replies();
        assert!(replies.iter().any(|(target, reply)| *target == Some(peer)
            && matches!(reply, LobbyReply::SaveProgress(r)
                if r.progression.level == 3 && r.progression.current_xp == 30)));
        assert!(replies.iter().any(|(target, reply)| target.is_none()
            && matches!(reply, LobbyReply::RosterSnapshot(_))));
    }

    #[test]
    fn broadcast_chat_fans_out_with_host_flag() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        h.replies();

        h.request(
            HOST_PEER_ID,
            LobbyRequest::SendBroadcast {
                body: "welcome".into(),
            },
        );
        let replies = h.replies();
        assert_eq!(replies.len(), 1);
        let (target, reply) = &replies[0];
        assert!(target.is_none());
        match reply {
            LobbyReply::Chat(delivery) => {
                assert_eq!(delivery.scope, ChatScope::Broadcast);
                assert_eq!(delivery.sender, "host");
                assert!(delivery.sender_is_host);
                assert_eq!(delivery.body, "welcome");
            }
            other => panic!("expected chat delivery, got {other:?}"),
        }
    }

    #[test]
    fn directed_chat_resolves_or_stays_local() {
        let mut h = Harness::new();
        h.join(HOST_PEER_ID, "host");
        let a = h.connect();
        h.join(a, "a");
        h.replies();

        // Resolvable target.
        h.request(
            HOST_PEER_ID,
            LobbyRequest::SendDirected {
                target_chat_id: format!("chat-{a}"),
                body: "psst".into(),
            },
        );
        let replies = h.replies();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, Some(a));

        // Unknown target: nothing relayed, no error surfaced.
        h.request(
            HOST_PEER_ID,
            LobbyRequest::SendDirected {
                target_chat_id: "chat-ghost".into(),
                body: "hello?".into(),
            },
        );
        assert!(h.replies().is_empty());
    }

    #[test]
    fn roster_never_exceeds_capacity() {
        let mut h = Harness::new();
        for i in 0..12 {
            let peer = h.connect();
            h.join(peer, &format!("p{i}"));
            assert!(h.server.roster().len() <= 5);
        }
    }
}
