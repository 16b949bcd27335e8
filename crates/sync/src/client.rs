//! Client-side view of the shared state.

use std::sync::Arc;

use seatdraft_core::{Participant, Round, School, Version, VersionedSnapshot};
use seatdraft_engine::turn;
use seatdraft_storage::{Store, StoreError};
use tracing::{debug, info};

use crate::Result;

/// Errors raised by the synchronization layer.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The bound participant vanished from the roster (e.g. after a reset);
    /// the client must re-authenticate.
    #[error("session expired: participant no longer exists")]
    SessionExpired,

    /// Login lookup failed
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A session bound to one participant identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The bound participant id
    pub participant_id: i64,
    /// Display name at login time
    pub name: String,
}

/// A reconciling view over the authoritative store.
pub struct SyncClient {
    store: Arc<dyn Store>,
    state: VersionedSnapshot,
    session: Option<Session>,
}

impl SyncClient {
    /// Connect to a store and load the initial snapshot.
    pub async fn connect(store: Arc<dyn Store>) -> Result<Self> {
        let state = store.load().await?;
        Ok(Self {
            store,
            state,
            session: None,
        })
    }

    /// Bind the session to a participant, looked up by display name
    /// (case-insensitive) or by numeric id.
    pub async fn login(&mut self, name_or_id: &str) -> Result<Session> {
        // Fresh data before the lookup.
        self.state = self.store.load().await?;

        let needle = name_or_id.trim();
        let found = self.state.snapshot.participants.iter().find(|p| {
            p.name.eq_ignore_ascii_case(needle) || p.id.to_string() == needle
        });

        match found {
            Some(p) => {
                let session = Session {
                    participant_id: p.id,
                    name: p.name.clone(),
                };
                info!(participant_id = p.id, "session bound");
                self.session = Some(session.clone());
                Ok(session)
            }
            None => Err(SyncError::UnknownParticipant(needle.to_string())),
        }
    }

    /// Drop the bound session.
    pub fn logout(&mut self) {
        self.session = None;
    }

    /// Reconcile the local view against the store.
    ///
    /// Fails with [`SyncError::SessionExpired`] (and unbinds the session)
    /// when the bound participant no longer exists in the roster.
    pub async fn reconcile(&mut self) -> Result<()> {
        self.state = self.store.load().await?;
        debug!(version = self.state.version, "reconciled");

        if let Some(session) = &self.session {
            if self.state.snapshot.participant(session.participant_id).is_none() {
                info!(
                    participant_id = session.participant_id,
                    "participant gone from roster, invalidating session"
                );
                self.session = None;
                return Err(SyncError::SessionExpired);
            }
        }
        Ok(())
    }

    /// The reconciled participant list.
    pub fn participants(&self) -> &[Participant] {
        &self.state.snapshot.participants
    }

    /// The reconciled school list.
    pub fn schools(&self) -> &[School] {
        &self.state.snapshot.schools
    }

    /// The reconciled round.
    pub fn round(&self) -> Round {
        self.state.snapshot.round
    }

    /// The rank currently authorized to act, per the reconciled snapshot.
    pub fn active_rank(&self) -> Option<u32> {
        turn::active_rank(&self.state.snapshot.participants, self.state.snapshot.round)
    }

    /// The store version of the reconciled snapshot.
    pub fn version(&self) -> Version {
        self.state.version
    }

    /// The bound session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The bound participant's current record, if any.
    pub fn me(&self) -> Option<&Participant> {
        let session = self.session.as_ref()?;
        self.state.snapshot.participant(session.participant_id)
    }
}
