//! Capacity ledger: seat accounting per school and term.

use seatdraft_core::{School, Term};

use crate::error::EngineError;
use crate::Result;

/// Charge one seat of `term` against `school`.
///
/// The term-specific pool is consumed first; once it is empty the flexible
/// pool covers the request. Returns `true` when a flexible seat was used.
/// There is no restore operation: picks are final.
pub fn charge(school: &mut School, term: Term) -> Result<bool> {
    let pool = match term {
        Term::Fall => &mut school.slots_fall,
        Term::Spring => &mut school.slots_spring,
    };

    if *pool > 0 {
        *pool -= 1;
        return Ok(false);
    }
    if school.slots_flexible > 0 {
        school.slots_flexible -= 1;
        return Ok(true);
    }
    Err(EngineError::NoCapacity { term })
}
