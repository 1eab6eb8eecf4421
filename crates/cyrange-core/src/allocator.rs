//! Range id allocation.
//!
//! The policy is "one above the highest unavailable id, else the lowest
//! free id". A gap below the current maximum is only reused once the
//! top of the pool has been reached.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::session::RangeId;

/// Allocation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("All {max} range ids are in use")]
    Exhausted { max: u32 },
}

/// Pick the next range id in `[1, max]`.
///
/// `in_use` holds ids of persisted sessions, `pending` the ids reserved by
/// workflows that have not committed yet. Ids above `max` (left behind by a
/// larger pool) count as unavailable but are never returned.
///
/// Callers must hold the store lock across this call and the reservation
/// of the returned id.
///
/// # Errors
/// Returns [`AllocationError::Exhausted`] when every id in the pool is taken.
pub fn allocate<I, P>(in_use: I, pending: P, max: u32) -> Result<RangeId, AllocationError>
where
    I: IntoIterator<Item = RangeId>,
    P: IntoIterator<Item = RangeId>,
{
    let taken: BTreeSet<u32> = in_use
        .into_iter()
        .chain(pending)
        .map(RangeId::get)
        .collect();

    let highest = taken.last().copied().unwrap_or(0);
    let candidate = if highest < max {
        RangeId::new(highest + 1)
    } else {
        (1..=max).find(|id| !taken.contains(id)).and_then(RangeId::new)
    };

    candidate.ok_or(AllocationError::Exhausted { max })
}
