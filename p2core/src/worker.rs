//! P2 Worker (spec.md §4.3): a pure function over a contiguous index
//! window, returning a partial sum plus the window's prime count. Workers
//! never communicate; all inputs are read-only.

use crate::error::P2Result;
use crate::intmath::Int;
use crate::primes::{ForwardCursor, ReverseCursor, SievedPrimeTable};

/// `(partial_sum, pix_count)` from spec.md §4.3: `pix_count` is the number
/// of primes this window covered, which is what the Orchestrator's serial
/// stitch runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOutput<T: Int> {
    pub partial_sum: T,
    pub pix_count: i64,
}

impl<T: Int> WorkerOutput<T> {
    pub(crate) fn zero() -> Self {
        WorkerOutput { partial_sum: T::ZERO, pix_count: 0 }
    }
}

/// Compute one worker's window `[my_low, my_high)` of the current round.
///
/// `my_low`/`my_high`/`start`/`stop` are derived exactly per spec.md §4.3;
/// the descending loop over primes in `(start, stop]` stops the moment
/// `xp = floor(x/p) >= my_high`, since those primes belong to a later round
/// or a neighboring worker's window.
pub fn run_worker<T: Int>(
    x: T,
    y: i64,
    z: i64,
    low: i64,
    thread_num: i64,
    thread_distance: i64,
    table: &SievedPrimeTable,
) -> P2Result<WorkerOutput<T>> {
    let my_low = low + thread_distance * thread_num;
    let my_high = std::cmp::min(my_low + thread_distance, z);

    if my_low >= my_high {
        return Ok(WorkerOutput::zero());
    }

    let start = std::cmp::max((x / T::from_i64(my_high)).to_i64(), y);
    let stop = std::cmp::min(
        (x / T::from_i64(my_low)).to_i64(),
        crate::intmath::isqrt(x).to_i64(),
    );

    let mut partial_sum = T::ZERO;
    let mut pix: i64 = 0;
    let mut pix_count: i64 = 0;

    // `pix` accumulates primes counted strictly above `start`, so the
    // forward cursor begins right after it; the missing `π(start)` term is
    // restored later by the Orchestrator's serial stitch.
    let mut forward = ForwardCursor::new(table, (start as u64).saturating_add(1), z as u64)?;

    if start < stop {
        let mut reverse = ReverseCursor::new(table, stop as u64, (start as u64).saturating_add(1))?;
        loop {
            let p = reverse.prev();
            if p == 0 {
                break;
            }
            let xp = (x / T::from_i64(p as i64)).to_i64();
            if xp >= my_high {
                break;
            }
            pix += forward.advance_to(xp as u64)? as i64;
            partial_sum = partial_sum + T::from_i64(pix);
            pix_count += 1;
        }
    }

    Ok(WorkerOutput { partial_sum, pix_count })
}
