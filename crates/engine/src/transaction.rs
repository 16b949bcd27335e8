//! Selection transactions: pick and skip as pure snapshot transitions.
//!
//! Each function either returns the fully-updated next snapshot or an error
//! with the input untouched; persistence is the caller's single atomic step.

use seatdraft_core::{ParticipantStatus, Round, Selection, Snapshot, Term};
use tracing::info;

use crate::error::EngineError;
use crate::{ledger, turn, Result};

/// Take one seat of `term` at `school_id` for `participant_id`.
pub fn submit_pick(
    snapshot: &Snapshot,
    participant_id: i64,
    school_id: i64,
    term: Term,
) -> Result<Snapshot> {
    let mut next = snapshot.clone();
    let round = next.round;

    let p_idx = next
        .participants
        .iter()
        .position(|p| p.id == participant_id)
        .ok_or_else(|| EngineError::NotFound(format!("participant {participant_id}")))?;

    let active = turn::active_rank(&next.participants, round);
    if Some(next.participants[p_idx].rank) != active {
        return Err(EngineError::NotYourTurn { active });
    }

    // Round 2: a second allocation must diversify both term and school.
    if round == Round::Second {
        if let Some(first) = next.participants[p_idx].round1_pick {
            if first.term == term {
                return Err(EngineError::DuplicateTerm);
            }
            if first.school_id == school_id {
                return Err(EngineError::DuplicateSchool);
            }
        }
    }

    let s_idx = next
        .schools
        .iter()
        .position(|s| s.id == school_id)
        .ok_or_else(|| EngineError::NotFound(format!("school {school_id}")))?;
    let used_flexible_slot = ledger::charge(&mut next.schools[s_idx], term)?;

    let selection = Selection {
        school_id,
        term,
        used_flexible_slot,
    };
    let participant = &mut next.participants[p_idx];
    match round {
        Round::First => participant.round1_pick = Some(selection),
        Round::Second => participant.round2_pick = Some(selection),
    }
    participant.status = ParticipantStatus::Completed;

    info!(
        participant_id,
        school_id,
        %term,
        used_flexible_slot,
        round = %round,
        "pick recorded"
    );
    Ok(turn::refresh_status(next))
}

/// Give up the current turn without taking a seat.
///
/// Skipping round 1 forfeits round-2 eligibility for good.
pub fn skip_turn(snapshot: &Snapshot, participant_id: i64) -> Result<Snapshot> {
    let mut next = snapshot.clone();
    let round = next.round;

    let p_idx = next
        .participants
        .iter()
        .position(|p| p.id == participant_id)
        .ok_or_else(|| EngineError::NotFound(format!("participant {participant_id}")))?;

    let active = turn::active_rank(&next.participants, round);
    if Some(next.participants[p_idx].rank) != active {
        return Err(EngineError::NotYourTurn { active });
    }

    let participant = &mut next.participants[p_idx];
    participant.status = ParticipantStatus::Skipped;
    if round == Round::First {
        participant.needs_double_semester = false;
    }

    info!(participant_id, round = %round, "turn skipped");
    Ok(turn::refresh_status(next))
}
