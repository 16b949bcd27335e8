//! Shared application state: the versioned snapshot.
//!
//! Every core operation is a pure function from one [`Snapshot`] to the
//! next; stores persist a snapshot together with a monotonically increasing
//! [`Version`] used as a compare-and-swap token.

use serde::{Deserialize, Serialize};

use crate::participant::Participant;
use crate::school::School;

/// Allocation round. Advances 1 -> 2, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Round {
    /// First pass over the roster
    First,
    /// Second pass, restricted to eligible participants
    Second,
}

impl From<Round> for u8 {
    fn from(round: Round) -> u8 {
        match round {
            Round::First => 1,
            Round::Second => 2,
        }
    }
}

impl TryFrom<u8> for Round {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Round::First),
            2 => Ok(Round::Second),
            other => Err(format!("round must be 1 or 2, got {other}")),
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Monotonic store version, the compare-and-swap token for persists.
pub type Version = u64;

/// The full shared state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Roster, kept sorted by rank ascending
    pub participants: Vec<Participant>,

    /// Seat pool
    pub schools: Vec<School>,

    /// Current allocation round
    pub round: Round,
}

impl Snapshot {
    /// An empty round-1 snapshot.
    pub fn empty() -> Self {
        Self {
            participants: Vec::new(),
            schools: Vec::new(),
            round: Round::First,
        }
    }

    /// Look up a participant by id.
    pub fn participant(&self, id: i64) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Look up a school by id.
    pub fn school(&self, id: i64) -> Option<&School> {
        self.schools.iter().find(|s| s.id == id)
    }
}

/// A snapshot paired with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedSnapshot {
    /// Store version of this snapshot
    pub version: Version,

    /// The state itself
    pub snapshot: Snapshot,
}
