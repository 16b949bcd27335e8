//! Participant model - one ranked member of the allocation roster.

use serde::{Deserialize, Serialize};

use crate::school::Term;
use crate::snapshot::Round;

/// A participant in the ranked allocation process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Unique identifier (assigned by the administrative bulk-load)
    pub id: i64,

    /// Display name
    pub name: String,

    /// Priority position; lower rank acts first. Unique, immutable once assigned.
    pub rank: u32,

    /// Current turn status
    pub status: ParticipantStatus,

    /// Whether this participant wants a second-round allocation.
    /// Forfeited permanently by skipping round 1.
    pub needs_double_semester: bool,

    /// Seat taken in round 1, if any
    pub round1_pick: Option<Selection>,

    /// Seat taken in round 2, if any
    pub round2_pick: Option<Selection>,
}

impl Participant {
    /// Whether this participant has finished acting in the current round.
    pub fn is_done(&self) -> bool {
        matches!(
            self.status,
            ParticipantStatus::Completed | ParticipantStatus::Skipped
        )
    }

    /// Round-2 eligibility: must want a second semester AND have actually
    /// picked in round 1. A round-1 skipper never qualifies.
    pub fn eligible_for_second_round(&self) -> bool {
        self.needs_double_semester && self.round1_pick.is_some()
    }

    /// The pick recorded for the given round, if any.
    pub fn pick_for(&self, round: Round) -> Option<&Selection> {
        match round {
            Round::First => self.round1_pick.as_ref(),
            Round::Second => self.round2_pick.as_ref(),
        }
    }
}

/// Turn status of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantStatus {
    /// In line, waiting for the turn
    Waiting,

    /// Holds the active rank; authorized to act
    Selecting,

    /// Took a seat this round
    Completed,

    /// Opted out (or was excluded from the round)
    Skipped,
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParticipantStatus::Waiting => "Waiting",
            ParticipantStatus::Selecting => "Selecting",
            ParticipantStatus::Completed => "Completed",
            ParticipantStatus::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// A recorded seat allocation. Immutable once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// The school whose capacity was charged
    pub school_id: i64,

    /// The term the seat is for
    pub term: Term,

    /// Whether the flexible pool was charged instead of the term pool
    pub used_flexible_slot: bool,
}
