//! Turn engine: active-rank computation and round advancement.

use seatdraft_core::{Participant, ParticipantStatus, Round, Snapshot};
use tracing::{debug, info};

/// Compute the rank currently authorized to act, or `None` when the round
/// is complete.
///
/// Participants act in rank order. In round 2 only participants who want a
/// second semester AND hold a round-1 pick are considered; a round-1
/// skipper is never eligible.
pub fn active_rank(participants: &[Participant], round: Round) -> Option<u32> {
    let mut sorted: Vec<&Participant> = participants.iter().collect();
    sorted.sort_by_key(|p| p.rank);

    sorted
        .into_iter()
        .find(|p| {
            if round == Round::Second && !p.eligible_for_second_round() {
                return false;
            }
            !p.is_done()
        })
        .map(|p| p.rank)
}

/// Recompute statuses and the round after a mutation.
///
/// Idempotent: applying it twice to the same input yields the same output.
/// Must be re-run after every participant mutation.
pub fn refresh_status(mut snapshot: Snapshot) -> Snapshot {
    match active_rank(&snapshot.participants, snapshot.round) {
        Some(rank) => {
            // Promote the holder of the active rank, put every other open
            // participant back to Waiting. Completed/Skipped are never touched.
            for p in &mut snapshot.participants {
                if p.is_done() {
                    continue;
                }
                p.status = if p.rank == rank {
                    ParticipantStatus::Selecting
                } else {
                    ParticipantStatus::Waiting
                };
            }
            debug!(rank, round = %snapshot.round, "active rank assigned");
        }
        None if snapshot.round == Round::First => {
            // Round 1 exhausted: advance and reseed statuses for round 2.
            snapshot.round = Round::Second;
            for p in &mut snapshot.participants {
                p.status = if p.eligible_for_second_round() {
                    ParticipantStatus::Waiting
                } else {
                    // Permanently excludes round-1 skippers and non-pickers.
                    ParticipantStatus::Skipped
                };
            }
            info!("round 1 complete, advancing to round 2");

            if let Some(rank) = active_rank(&snapshot.participants, Round::Second) {
                for p in &mut snapshot.participants {
                    if p.rank == rank {
                        p.status = ParticipantStatus::Selecting;
                    } else if p.status == ParticipantStatus::Selecting {
                        p.status = ParticipantStatus::Waiting;
                    }
                }
            }
        }
        // Round 2 exhausted: terminal, nothing to advance.
        None => {}
    }
    snapshot
}

/// Whether the whole allocation has finished (round 2 with nobody left).
pub fn is_finished(snapshot: &Snapshot) -> bool {
    snapshot.round == Round::Second
        && active_rank(&snapshot.participants, Round::Second).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatdraft_core::{Selection, Term};

    fn participant(id: i64, rank: u32, status: ParticipantStatus) -> Participant {
        Participant {
            id,
            name: format!("P{id}"),
            rank,
            status,
            needs_double_semester: true,
            round1_pick: None,
            round2_pick: None,
        }
    }

    fn pick(school_id: i64, term: Term) -> Selection {
        Selection {
            school_id,
            term,
            used_flexible_slot: false,
        }
    }

    #[test]
    fn lowest_open_rank_is_active() {
        let participants = vec![
            participant(3, 3, ParticipantStatus::Waiting),
            participant(1, 1, ParticipantStatus::Completed),
            participant(2, 2, ParticipantStatus::Skipped),
        ];
        assert_eq!(active_rank(&participants, Round::First), Some(3));
    }

    #[test]
    fn round_two_filters_out_ineligible() {
        let mut a = participant(1, 1, ParticipantStatus::Waiting);
        a.needs_double_semester = false;
        a.round1_pick = Some(pick(1, Term::Fall));

        let mut b = participant(2, 2, ParticipantStatus::Waiting);
        b.round1_pick = None; // skipped or never acted in round 1

        let mut c = participant(3, 3, ParticipantStatus::Waiting);
        c.round1_pick = Some(pick(2, Term::Spring));

        assert_eq!(active_rank(&[a, b, c], Round::Second), Some(3));
    }

    #[test]
    fn empty_roster_has_no_active_rank() {
        assert_eq!(active_rank(&[], Round::First), None);
    }

    #[test]
    fn refresh_promotes_active_and_demotes_strays() {
        let snapshot = Snapshot {
            participants: vec![
                participant(1, 1, ParticipantStatus::Completed),
                participant(2, 2, ParticipantStatus::Waiting),
                participant(3, 3, ParticipantStatus::Selecting), // stray
            ],
            schools: Vec::new(),
            round: Round::First,
        };

        let next = refresh_status(snapshot);
        assert_eq!(next.participants[1].status, ParticipantStatus::Selecting);
        assert_eq!(next.participants[2].status, ParticipantStatus::Waiting);
        assert_eq!(next.participants[0].status, ParticipantStatus::Completed);
    }

    #[test]
    fn round_one_completion_advances_and_reseeds() {
        let mut a = participant(1, 1, ParticipantStatus::Completed);
        a.round1_pick = Some(pick(1, Term::Fall));

        let mut b = participant(2, 2, ParticipantStatus::Skipped);
        b.needs_double_semester = false; // forfeited by skipping

        let mut c = participant(3, 3, ParticipantStatus::Completed);
        c.needs_double_semester = false; // single semester only
        c.round1_pick = Some(pick(2, Term::Spring));

        let snapshot = Snapshot {
            participants: vec![a, b, c],
            schools: Vec::new(),
            round: Round::First,
        };

        let next = refresh_status(snapshot);
        assert_eq!(next.round, Round::Second);
        assert_eq!(next.participants[0].status, ParticipantStatus::Selecting);
        assert_eq!(next.participants[1].status, ParticipantStatus::Skipped);
        assert_eq!(next.participants[2].status, ParticipantStatus::Skipped);
    }

    #[test]
    fn round_two_completion_is_terminal() {
        let snapshot = Snapshot {
            participants: vec![participant(1, 1, ParticipantStatus::Completed)],
            schools: Vec::new(),
            round: Round::Second,
        };

        let next = refresh_status(snapshot.clone());
        assert_eq!(next, snapshot);
        assert!(is_finished(&next));
    }

    #[test]
    fn refresh_is_idempotent() {
        let snapshot = Snapshot {
            participants: vec![
                participant(1, 1, ParticipantStatus::Waiting),
                participant(2, 2, ParticipantStatus::Selecting),
                participant(3, 3, ParticipantStatus::Completed),
            ],
            schools: Vec::new(),
            round: Round::First,
        };

        let once = refresh_status(snapshot);
        let twice = refresh_status(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn round_never_regresses() {
        let snapshot = Snapshot {
            participants: vec![participant(1, 1, ParticipantStatus::Waiting)],
            schools: Vec::new(),
            round: Round::Second,
        };
        // Participant is open but ineligible for round 2; still no regression.
        let next = refresh_status(snapshot);
        assert_eq!(next.round, Round::Second);
    }
}
