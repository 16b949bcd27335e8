//! CSV bulk-load format for seatdraft rosters.
//!
//! Templates: participants `id,name,rank,needsDoubleSemester`, schools
//! `id,name,country,slotsFall,slotsSpring,slotsFlexible`. Values are
//! comma-separated and double-quote escaped; files are UTF-8 with an
//! optional byte-order mark (stripped on read, emitted on write for
//! spreadsheet compatibility).

#![warn(missing_docs)]

use seatdraft_core::{ParticipantRow, SchoolRow};

const UTF8_BOM: &str = "\u{feff}";

/// Errors from CSV parsing or rendering.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    /// Malformed CSV or a row that does not match the schema
    #[error("CSV error: {0}")]
    Parse(#[from] csv::Error),

    /// Structurally valid CSV that is unusable as a bulk-load payload
    #[error("{0}")]
    Invalid(String),
}

/// Result alias for CSV operations.
pub type Result<T> = std::result::Result<T, CsvError>;

fn parse_rows<T: serde::de::DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()?;
    if rows.is_empty() {
        return Err(CsvError::Invalid(
            "CSV needs a header row and at least one data row".to_string(),
        ));
    }
    Ok(rows)
}

fn write_rows<T: serde::Serialize>(rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CsvError::Invalid(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| CsvError::Invalid(e.to_string()))?;
    Ok(format!("{UTF8_BOM}{body}"))
}

/// Parse a participants CSV file.
pub fn parse_participants(text: &str) -> Result<Vec<ParticipantRow>> {
    parse_rows(text)
}

/// Parse a schools CSV file.
pub fn parse_schools(text: &str) -> Result<Vec<SchoolRow>> {
    parse_rows(text)
}

/// Render participant rows back to CSV (with BOM).
pub fn write_participants(rows: &[ParticipantRow]) -> Result<String> {
    write_rows(rows)
}

/// Render school rows back to CSV (with BOM).
pub fn write_schools(rows: &[SchoolRow]) -> Result<String> {
    write_rows(rows)
}
