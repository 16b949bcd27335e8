//! Administrative bulk-load rows.
//!
//! These are the wire shapes accepted by a reset (JSON array or CSV file).
//! Field names match the published templates: participants
//! `id,name,rank,needsDoubleSemester`, schools
//! `id,name,country,slotsFall,slotsSpring,slotsFlexible`.

use serde::{Deserialize, Serialize};

fn default_needs_double() -> bool {
    true
}

/// One participant row of a bulk-load payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRow {
    /// Participant id
    pub id: i64,

    /// Display name
    pub name: String,

    /// Turn-order rank
    pub rank: u32,

    /// Round-2 eligibility flag; defaults to true when absent
    #[serde(default = "default_needs_double")]
    pub needs_double_semester: bool,
}

/// One school row of a bulk-load payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRow {
    /// School id
    pub id: i64,

    /// Display name
    pub name: String,

    /// Country tag
    pub country: String,

    /// Fall seats
    pub slots_fall: u32,

    /// Spring seats
    pub slots_spring: u32,

    /// Flexible seats
    pub slots_flexible: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_row_defaults_needs_double_semester() {
        let row: ParticipantRow =
            serde_json::from_str(r#"{"id":1,"name":"Alice Chen","rank":1}"#).unwrap();
        assert!(row.needs_double_semester);

        let row: ParticipantRow = serde_json::from_str(
            r#"{"id":2,"name":"Bob Smith","rank":2,"needsDoubleSemester":false}"#,
        )
        .unwrap();
        assert!(!row.needs_double_semester);
    }
}
