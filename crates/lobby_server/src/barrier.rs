//! Transition barrier for the lobby-to-match world switch.
//!
//! After an accepted start request every connected peer loads the match world
//! and acknowledges. The barrier fires exactly once, when the ack set covers
//! every currently connected peer (host included); only then are actors
//! spawned, so there is no partial spawn. A peer that disconnects while the
//! barrier waits is dropped from the requirement and cannot hang it.
//!
//! Known limitation, preserved deliberately: there is no timeout. A peer that
//! stays connected but never acknowledges stalls the transition indefinitely.

use std::collections::HashSet;

use shared::PeerId;
use tracing::{debug, info, warn};

/// Phases of the transition state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierPhase {
    /// No transition running.
    Idle,
    /// World switch initiated, no ack received yet.
    Loading,
    /// At least one ack received, waiting for the rest.
    WaitingForAcks,
    /// The host disconnected mid-transition; the session is over.
    Aborted,
}

/// Result of feeding an ack or a departure into the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The barrier is not active; the input was a no-op.
    Ignored,
    /// Still waiting on at least one peer.
    Pending,
    /// Every required peer has acknowledged; spawn now.
    Complete,
}

#[derive(Debug)]
pub struct TransitionBarrier {
    phase: BarrierPhase,
    acks: HashSet<PeerId>,
}

impl TransitionBarrier {
    pub fn new() -> Self {
        Self {
            phase: BarrierPhase::Idle,
            acks: HashSet::new(),
        }
    }

    pub fn phase(&self) -> BarrierPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            BarrierPhase::Loading | BarrierPhase::WaitingForAcks
        )
    }

    /// Starts a transition: clears the ack set and enters `Loading`.
    pub fn begin(&mut self) {
        debug_assert_eq!(self.phase, BarrierPhase::Idle);
        self.acks.clear();
        self.phase = BarrierPhase::Loading;
        info!("transition started, awaiting load acks");
    }

    /// Records a load ack from `peer`. `required` is the set of currently
    /// connected peers at this instant.
    pub fn record_ack(&mut self, peer: PeerId, required: &[PeerId]) -> AckOutcome {
        if !self.is_active() {
            debug!(%peer, "spurious load ack ignored");
            return AckOutcome::Ignored;
        }
        if !required.contains(&peer) {
            // Ack raced the peer's own disconnect; the departure already
            // adjusted the requirement.
            debug!(%peer, "load ack from unconnected peer ignored");
            return AckOutcome::Ignored;
        }

        self.phase = BarrierPhase::WaitingForAcks;
        self.acks.insert(peer);
        self.evaluate(required)
    }

    /// Removes a departed peer from the requirement and re-tests the barrier.
    /// `required` must already exclude the departed peer.
    pub fn peer_left(&mut self, peer: PeerId, required: &[PeerId]) -> AckOutcome {
        if !self.is_active() {
            return AckOutcome::Ignored;
        }
        self.acks.remove(&peer);
        debug!(%peer, "peer left during transition, requirement shrunk");
        self.evaluate(required)
    }

    /// The host disconnected mid-transition; nothing can complete any more.
    pub fn abort(&mut self) {
        warn!("transition aborted, host disconnected");
        self.acks.clear();
        self.phase = BarrierPhase::Aborted;
    }

    /// Marks the spawn pass done and returns to `Idle`.
    pub fn complete(&mut self) {
        self.acks.clear();
        self.phase = BarrierPhase::Idle;
    }

    fn evaluate(&self, required: &[PeerId]) -> AckOutcome {
        if !required.is_empty() && required.iter().all(|peer| self.acks.contains(peer)) {
            AckOutcome::Complete
        } else {
            AckOutcome::Pending
        }
    }
}

impl Default for TransitionBarrier {
    fn default() -> Self {
        Self::new()
    }
}
