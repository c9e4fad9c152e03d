//! Peer-owned progression persistence.
//!
//! The server computes progression but never stores it. When it pushes an
//! updated record to its owning peer, the client forwards that record to an
//! external save collaborator (cloud save, disk, whatever the embedder
//! plugs in).

use shared::records::SessionRecord;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save backend unavailable: {0}")]
    Unavailable(String),
    #[error("save rejected: {0}")]
    Rejected(String),
}

/// External persistence seam. Implementations decide where the record goes.
pub trait SaveCollaborator {
    fn persist(&mut self, identity: &str, record: &SessionRecord) -> Result<(), SaveError>;
}

/// Applies server-pushed progression updates and forwards them to the
/// collaborator.
#[derive(Debug)]
pub struct ProgressKeeper<S> {
    collaborator: S,
    latest: Option<SessionRecord>,
}

impl<S: SaveCollaborator> ProgressKeeper<S> {
    pub fn new(collaborator: S) -> Self {
        Self {
            collaborator,
            latest: None,
        }
    }

    /// Most recent record pushed by the server, if any.
    pub fn latest(&self) -> Option<&SessionRecord> {
        self.latest.as_ref()
    }

    pub fn apply(&mut self, record: SessionRecord) -> Result<(), SaveError> {
        debug!(
            level = record.progression.level,
            xp = record.progression.current_xp,
            "persisting progression update"
        );
        self.collaborator.persist(&record.identity, &record)?;
        self.latest = Some(record);
        Ok(())
    }
}

/// Accepts every record and persists nothing. Useful for tests and for peers
/// running without an external save backend.
#[derive(Debug, Default)]
pub struct NullSave;

impl SaveCollaborator for NullSave {
    fn persist(&mut self, _identity: &str, _record: &SessionRecord) -> Result<(), SaveError> {
        Ok(())
    }
}
