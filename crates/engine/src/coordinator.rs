//! Coordinator: binds pure snapshot transitions to a persistent store.
//!
//! Every operation is one read-validate-persist cycle. The persist carries
//! the version the snapshot was read at; when another writer got in between,
//! the cycle reloads and revalidates, so a double-submit fails its turn
//! check the second time around instead of being applied twice.

use std::sync::Arc;

use seatdraft_core::{ParticipantRow, Round, SchoolRow, Snapshot, Term, VersionedSnapshot};
use seatdraft_storage::{Store, StoreError};
use tracing::warn;

use crate::error::EngineError;
use crate::{roster, transaction, turn, Result};

/// How many times a conflicted persist is retried before giving up.
const MAX_PERSIST_ATTEMPTS: u32 = 3;

/// Allocation service over a shared store.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn Store>,
}

impl Coordinator {
    /// Create a coordinator over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Take one seat for a participant. See [`transaction::submit_pick`].
    pub async fn submit_pick(
        &self,
        participant_id: i64,
        school_id: i64,
        term: Term,
    ) -> Result<Snapshot> {
        self.apply(|snapshot| transaction::submit_pick(snapshot, participant_id, school_id, term))
            .await
    }

    /// Skip a participant's turn. See [`transaction::skip_turn`].
    pub async fn skip_turn(&self, participant_id: i64) -> Result<Snapshot> {
        self.apply(|snapshot| transaction::skip_turn(snapshot, participant_id))
            .await
    }

    /// Administrative reset: replace the roster and seat pool wholesale.
    pub async fn reset(
        &self,
        participants: &[ParticipantRow],
        schools: &[SchoolRow],
    ) -> Result<Snapshot> {
        let seeded = roster::build_reset(participants, schools)?;
        self.apply(|_| Ok(seeded.clone())).await
    }

    /// Recompute statuses without a participant action (e.g. after manual
    /// store edits). Nothing is persisted when nothing changes.
    pub async fn refresh(&self) -> Result<Snapshot> {
        self.apply(|snapshot| Ok(turn::refresh_status(snapshot.clone())))
            .await
    }

    /// Latest persisted snapshot with its version.
    pub async fn snapshot(&self) -> Result<VersionedSnapshot> {
        Ok(self.store.load().await?)
    }

    /// Rank currently authorized to act, if the round is still open.
    pub async fn active_rank(&self) -> Result<Option<u32>> {
        let state = self.store.load().await?;
        Ok(turn::active_rank(
            &state.snapshot.participants,
            state.snapshot.round,
        ))
    }

    /// Current round.
    pub async fn current_round(&self) -> Result<Round> {
        Ok(self.store.read_round().await?)
    }

    async fn apply<F>(&self, transition: F) -> Result<Snapshot>
    where
        F: Fn(&Snapshot) -> Result<Snapshot>,
    {
        let mut attempt = 0;
        loop {
            // Reconcile: always validate against the latest persisted state.
            let current = self.store.load().await?;
            let next = transition(&current.snapshot)?;

            // An unchanged snapshot needs no new version; persisting it
            // would only wake watchers for nothing.
            if next == current.snapshot {
                return Ok(next);
            }

            match self.store.persist(&next, current.version).await {
                Ok(_) => return Ok(next),
                Err(StoreError::Conflict { expected }) => {
                    attempt += 1;
                    if attempt >= MAX_PERSIST_ATTEMPTS {
                        return Err(StoreError::Conflict { expected }.into());
                    }
                    warn!(attempt, "persist conflict, revalidating against new state");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatdraft_core::ParticipantStatus;
    use seatdraft_storage::MemoryStore;

    fn rows() -> (Vec<ParticipantRow>, Vec<SchoolRow>) {
        let participants = vec![
            ParticipantRow {
                id: 1,
                name: "Alice Chen".to_string(),
                rank: 1,
                needs_double_semester: true,
            },
            ParticipantRow {
                id: 2,
                name: "Bob Smith".to_string(),
                rank: 2,
                needs_double_semester: false,
            },
        ];
        let schools = vec![SchoolRow {
            id: 10,
            name: "UC Berkeley".to_string(),
            country: "USA".to_string(),
            slots_fall: 1,
            slots_spring: 1,
            slots_flexible: 1,
        }];
        (participants, schools)
    }

    async fn seeded_coordinator() -> Coordinator {
        let coordinator = Coordinator::new(Arc::new(MemoryStore::new()));
        let (participants, schools) = rows();
        coordinator.reset(&participants, &schools).await.unwrap();
        coordinator
    }

    #[tokio::test]
    async fn pick_persists_and_advances_turn() {
        let coordinator = seeded_coordinator().await;

        coordinator.submit_pick(1, 10, Term::Fall).await.unwrap();

        let state = coordinator.snapshot().await.unwrap();
        assert_eq!(state.version, 2); // reset + pick
        assert_eq!(
            state.snapshot.participant(1).unwrap().status,
            ParticipantStatus::Completed
        );
        assert_eq!(coordinator.active_rank().await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn double_submit_is_rejected_on_reconcile() {
        let coordinator = seeded_coordinator().await;

        coordinator.submit_pick(1, 10, Term::Fall).await.unwrap();
        // The duplicate arrives after the first persisted: by now rank 2
        // holds the turn, so the reconcile step rejects it.
        let err = coordinator
            .submit_pick(1, 10, Term::Spring)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotYourTurn { active: Some(2) }));
    }

    #[tokio::test]
    async fn full_two_round_run() {
        let coordinator = seeded_coordinator().await;

        coordinator.submit_pick(1, 10, Term::Fall).await.unwrap();
        let after_bob = coordinator.skip_turn(2).await.unwrap();

        // Round 1 closed; only Alice (double semester + round-1 pick) remains.
        assert_eq!(after_bob.round, Round::Second);
        assert_eq!(coordinator.active_rank().await.unwrap(), Some(1));

        let err = coordinator
            .submit_pick(1, 10, Term::Spring)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateSchool));

        // No other school: Alice can only skip.
        let done = coordinator.skip_turn(1).await.unwrap();
        assert!(turn::is_finished(&done));
        // Round-2 skip does not forfeit retroactively.
        assert!(done.participant(1).unwrap().needs_double_semester);
    }

    #[tokio::test]
    async fn reset_clears_previous_progress() {
        let coordinator = seeded_coordinator().await;
        coordinator.submit_pick(1, 10, Term::Fall).await.unwrap();

        let (participants, schools) = rows();
        let fresh = coordinator.reset(&participants, &schools).await.unwrap();
        assert_eq!(fresh.round, Round::First);
        assert!(fresh.participant(1).unwrap().round1_pick.is_none());
        assert_eq!(fresh.school(10).unwrap().slots_fall, 1);
    }

    #[tokio::test]
    async fn refresh_is_stable() {
        let coordinator = seeded_coordinator().await;
        let once = coordinator.refresh().await.unwrap();
        let twice = coordinator.refresh().await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn refresh_without_changes_does_not_bump_version() {
        let coordinator = seeded_coordinator().await;
        let before = coordinator.snapshot().await.unwrap().version;

        coordinator.refresh().await.unwrap();

        assert_eq!(coordinator.snapshot().await.unwrap().version, before);
    }
}
