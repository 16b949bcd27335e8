//! School model - a resource with per-term seat capacity.

use serde::{Deserialize, Serialize};

/// A school offering exchange seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    /// Unique identifier (assigned by the administrative bulk-load)
    pub id: i64,

    /// Display name
    pub name: String,

    /// Country tag
    pub country: String,

    /// Seats reserved for the fall term
    pub slots_fall: u32,

    /// Seats reserved for the spring term
    pub slots_spring: u32,

    /// Seats usable for either term, charged only when the term pool is empty
    pub slots_flexible: u32,
}

impl School {
    /// Total seats still available across all pools.
    pub fn remaining(&self) -> u32 {
        self.slots_fall + self.slots_spring + self.slots_flexible
    }
}

/// An allocation term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Primary term
    Fall,
    /// Secondary term
    Spring,
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Fall => f.write_str("Fall"),
            Term::Spring => f.write_str("Spring"),
        }
    }
}

impl std::str::FromStr for Term {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fall" => Ok(Term::Fall),
            "spring" => Ok(Term::Spring),
            other => Err(format!("unknown term: {other}")),
        }
    }
}
