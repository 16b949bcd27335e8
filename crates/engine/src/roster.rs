//! Administrative bulk-load: validation and reset seeding.
//!
//! A reset replaces the whole roster and seat pool, clears every recorded
//! pick, forces round 1, and seeds the first Selecting participant. Input
//! is validated against the explicit row schema and rejected wholesale on
//! mismatch rather than coerced.

use std::collections::HashSet;

use seatdraft_core::{
    Participant, ParticipantRow, ParticipantStatus, Round, School, SchoolRow, Snapshot,
};
use tracing::info;

use crate::error::EngineError;
use crate::{turn, Result};

/// Parse a JSON bulk-load payload of participant rows.
pub fn participant_rows_from_json(json: &str) -> Result<Vec<ParticipantRow>> {
    serde_json::from_str(json).map_err(|e| EngineError::Validation(e.to_string()))
}

/// Parse a JSON bulk-load payload of school rows.
pub fn school_rows_from_json(json: &str) -> Result<Vec<SchoolRow>> {
    serde_json::from_str(json).map_err(|e| EngineError::Validation(e.to_string()))
}

/// Validate rows and build the freshly-seeded snapshot of a reset.
pub fn build_reset(participants: &[ParticipantRow], schools: &[SchoolRow]) -> Result<Snapshot> {
    validate_participants(participants)?;
    validate_schools(schools)?;

    let mut roster: Vec<Participant> = participants
        .iter()
        .map(|row| Participant {
            id: row.id,
            name: row.name.clone(),
            rank: row.rank,
            status: ParticipantStatus::Waiting,
            needs_double_semester: row.needs_double_semester,
            round1_pick: None,
            round2_pick: None,
        })
        .collect();
    roster.sort_by_key(|p| p.rank);

    let pool: Vec<School> = schools
        .iter()
        .map(|row| School {
            id: row.id,
            name: row.name.clone(),
            country: row.country.clone(),
            slots_fall: row.slots_fall,
            slots_spring: row.slots_spring,
            slots_flexible: row.slots_flexible,
        })
        .collect();

    info!(
        participants = roster.len(),
        schools = pool.len(),
        "roster reset"
    );

    // Seed the initial Selecting participant.
    Ok(turn::refresh_status(Snapshot {
        participants: roster,
        schools: pool,
        round: Round::First,
    }))
}

fn validate_participants(rows: &[ParticipantRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(EngineError::Validation(
            "participant payload is empty".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    let mut ranks = HashSet::new();
    for row in rows {
        if row.name.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "participant {} has an empty name",
                row.id
            )));
        }
        if !ids.insert(row.id) {
            return Err(EngineError::Validation(format!(
                "duplicate participant id {}",
                row.id
            )));
        }
        if !ranks.insert(row.rank) {
            return Err(EngineError::Validation(format!(
                "duplicate rank {}",
                row.rank
            )));
        }
    }
    Ok(())
}

fn validate_schools(rows: &[SchoolRow]) -> Result<()> {
    if rows.is_empty() {
        return Err(EngineError::Validation(
            "school payload is empty".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for row in rows {
        if row.name.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "school {} has an empty name",
                row.id
            )));
        }
        if !ids.insert(row.id) {
            return Err(EngineError::Validation(format!(
                "duplicate school id {}",
                row.id
            )));
        }
    }
    Ok(())
}
