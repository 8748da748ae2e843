//! Prime Iterator Service (spec.md §4.1).
//!
//! Builds on the teacher's segmented Sieve of Eratosthenes
//! (`apps/primes-multithread::{simple_sieve, sieve_segment}`): a sequential
//! trial sieve produces the "base primes" up to `sqrt(bound)`, then the
//! remaining range is sieved in parallel chunks using those base primes.
//! Here the chunking is done with `rayon` (declared but never actually used
//! by the teacher workspace) instead of the teacher's raw
//! `thread::spawn` + `Arc<Mutex<Vec<Vec<u64>>>>`, which buys the same
//! parallel segment sieve without manual lock bookkeeping.

use std::sync::RwLock;

use rayon::prelude::*;

use crate::error::{P2Error, P2Result};
use crate::intmath::isqrt;

/// Ceiling on how far a single table is allowed to grow. `sieve_segment`/
/// `simple_sieve` allocate one `bool` per integer in range, so a bound past
/// this would ask the allocator for tens of gigabytes in one `Vec`; inputs
/// that would cross it are refused here rather than left to run the machine
/// out of memory.
pub const MAX_SIEVE_BOUND: u64 = 1 << 32;

/// Owns a growable, ascending table of primes starting at 2. Cursors share
/// it read-only; a cursor whose advance overruns the current bound takes a
/// brief write lock to extend it (spec.md §4.1: "exceeding [stop_hint] is
/// allowed and must transparently extend").
pub struct SievedPrimeTable {
    state: RwLock<SieveState>,
}

struct SieveState {
    /// 1-indexed with a `0` sentinel at index 0, so `primes[i]` is the
    /// `i`-th prime and `pi_bsearch` can binary-search it directly.
    primes: Vec<u64>,
    limit: u64,
}

impl SievedPrimeTable {
    pub fn new(initial_bound_hint: u64) -> P2Result<Self> {
        let table = SievedPrimeTable {
            state: RwLock::new(SieveState { primes: vec![0], limit: 1 }),
        };
        table.extend_to(initial_bound_hint.max(2))?;
        Ok(table)
    }

    /// Grow the sieve, if needed, so every prime `<= bound` is present.
    /// Refuses to grow past [`MAX_SIEVE_BOUND`].
    pub fn extend_to(&self, bound: u64) -> P2Result<()> {
        {
            let state = self.state.read().unwrap();
            if state.limit >= bound {
                return Ok(());
            }
        }
        let mut state = self.state.write().unwrap();
        if state.limit >= bound {
            return Ok(());
        }
        let new_limit = bound.max(state.limit * 2).max(1024);
        if new_limit > MAX_SIEVE_BOUND {
            return Err(P2Error::SieveExhausted {
                bound: new_limit,
                reason: format!("exceeds the {MAX_SIEVE_BOUND}-bound sieve ceiling"),
            });
        }
        state.primes = sieve_up_to(new_limit);
        state.limit = new_limit;
        Ok(())
    }

    pub fn current_limit(&self) -> u64 {
        self.state.read().unwrap().limit
    }

    /// `primes[index]` where index 0 is the sentinel `0` and index 1 is the
    /// first real prime (2). Returns `None` past the sieved range.
    fn prime_at(&self, index: usize) -> Option<u64> {
        self.state.read().unwrap().primes.get(index).copied()
    }

    /// Count of primes `<= x`, extending the sieve first if necessary.
    pub fn count_le(&self, x: u64) -> P2Result<i64> {
        self.extend_to(x)?;
        let state = self.state.read().unwrap();
        Ok(crate::intmath::pi_bsearch(&state.primes, x))
    }

    /// Index of the first table entry (index `>= 1`) whose value is `>= seed`.
    fn first_index_ge(&self, seed: u64) -> P2Result<usize> {
        self.extend_to(seed.max(2))?;
        let state = self.state.read().unwrap();
        // The sentinel `0` satisfies `p < seed.max(1)` too, so this counts
        // correctly as "elements strictly below seed" including it.
        Ok(state.primes.partition_point(|&p| p < seed.max(1)).max(1))
    }

    /// Index of the last table entry `<= seed`, or `None` if even the first
    /// prime (2) exceeds `seed`.
    fn last_index_le(&self, seed: u64) -> P2Result<Option<usize>> {
        self.extend_to(seed.max(2))?;
        let state = self.state.read().unwrap();
        let idx = state.primes.partition_point(|&p| p <= seed);
        Ok(if idx <= 1 { None } else { Some(idx - 1) })
    }
}

/// `π(n)` via the shared sieve -- the external `pi_simple` oracle of
/// spec.md §6, resolved in DESIGN.md to draw from the same table the inner
/// cursors use rather than a separately-tuned lookup.
pub fn pi_simple(table: &SievedPrimeTable, n: i64) -> P2Result<i64> {
    if n < 2 {
        return Ok(0);
    }
    table.count_le(n as u64)
}

/// A forward cursor: successive `next()` calls yield primes at or above
/// `seed`, strictly increasing.
pub struct ForwardCursor<'a> {
    table: &'a SievedPrimeTable,
    idx: usize,
}

impl<'a> ForwardCursor<'a> {
    pub fn new(table: &'a SievedPrimeTable, seed: u64, stop_hint: u64) -> P2Result<Self> {
        table.extend_to(seed.max(stop_hint).max(2))?;
        let idx = table.first_index_ge(seed)?;
        Ok(ForwardCursor { table, idx })
    }

    pub fn next(&mut self) -> P2Result<Option<u64>> {
        loop {
            if let Some(p) = self.table.prime_at(self.idx) {
                self.idx += 1;
                return Ok(Some(p));
            }
            let grow = self.table.current_limit().saturating_mul(2).max(1024);
            self.table.extend_to(grow)?;
        }
    }

    /// Consume primes while they are `<= target`, returning how many were
    /// consumed. This is the operation the P2 worker actually drives: "the
    /// number of advances into a running pix" (spec.md §4.3).
    pub fn advance_to(&mut self, target: u64) -> P2Result<u64> {
        let mut count = 0u64;
        loop {
            let save = self.idx;
            match self.next()? {
                Some(p) if p <= target => count += 1,
                Some(_) => {
                    self.idx = save;
                    break;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

/// A reverse cursor: successive `prev()` calls yield primes at or below
/// `seed`, strictly decreasing, returning `0` once exhausted below
/// `floor_hint`.
pub struct ReverseCursor<'a> {
    table: &'a SievedPrimeTable,
    idx: Option<usize>,
    floor_hint: u64,
}

impl<'a> ReverseCursor<'a> {
    pub fn new(table: &'a SievedPrimeTable, seed: u64, floor_hint: u64) -> P2Result<Self> {
        let idx = table.last_index_le(seed)?;
        Ok(ReverseCursor { table, idx, floor_hint })
    }

    pub fn prev(&mut self) -> u64 {
        match self.idx {
            Some(i) => {
                let p = self.table.prime_at(i).unwrap_or(0);
                if p == 0 || p < self.floor_hint {
                    self.idx = None;
                    return 0;
                }
                self.idx = if i == 0 { None } else { Some(i - 1) };
                p
            }
            None => 0,
        }
    }
}

/// Sequential trial-division sieve, used only to produce the small "base
/// primes" (up to `sqrt(limit)`) that seed the parallel segment sieve.
/// Grounded directly on the teacher's `simple_sieve`.
fn simple_sieve(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }
    let mut is_prime = vec![true; (limit + 1) as usize];
    is_prime[0] = false;
    is_prime[1] = false;

    let sqrt_limit = isqrt(limit as i64) as u64;
    for num in 2..=sqrt_limit {
        if is_prime[num as usize] {
            let mut multiple = num * num;
            while multiple <= limit {
                is_prime[multiple as usize] = false;
                multiple += num;
            }
        }
    }

    is_prime
        .iter()
        .enumerate()
        .filter(|(_, &p)| p)
        .map(|(idx, _)| idx as u64)
        .collect()
}

/// Sieve `[low, high]` using pre-computed base primes. Grounded directly on
/// the teacher's `sieve_segment`.
fn sieve_segment(low: u64, high: u64, base_primes: &[u64]) -> Vec<u64> {
    if low > high {
        return vec![];
    }
    let segment_size = (high - low + 1) as usize;
    let mut is_prime = vec![true; segment_size];

    if low == 0 {
        is_prime[0] = false;
    }
    if low <= 1 && high >= 1 {
        is_prime[(1 - low) as usize] = false;
    }

    for &prime in base_primes {
        if prime * prime > high {
            continue;
        }
        let start = if low <= prime * prime {
            prime * prime
        } else {
            let remainder = low % prime;
            if remainder == 0 {
                low
            } else {
                low + (prime - remainder)
            }
        };
        let mut multiple = start;
        while multiple <= high {
            is_prime[(multiple - low) as usize] = false;
            multiple += prime;
        }
    }

    is_prime
        .iter()
        .enumerate()
        .filter(|(_, &p)| p)
        .map(|(idx, _)| low + idx as u64)
        .filter(|&n| n > 1)
        .collect()
}

/// Sieve every prime `<= limit`, as a 1-indexed table with a leading `0`
/// sentinel. Base primes are found sequentially; the remainder is chunked
/// and sieved in parallel (the teacher's `segmented_sieve_parallel`,
/// rewritten on top of `rayon` instead of manual `thread::spawn`).
fn sieve_up_to(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![0];
    }

    let sqrt_limit = isqrt(limit as i64) as u64;
    let base_primes = simple_sieve(sqrt_limit);

    if sqrt_limit >= limit {
        let mut table = vec![0u64];
        table.extend(base_primes);
        return table;
    }

    let range_start = sqrt_limit + 1;
    let range_size = limit - sqrt_limit;
    // Enough chunks to give rayon's work-stealing pool something to do,
    // without making each chunk so small that per-chunk overhead dominates.
    let num_chunks = rayon::current_num_threads().max(1) * 4;
    let chunk_size = (range_size + num_chunks as u64 - 1) / num_chunks as u64;

    let segments: Vec<Vec<u64>> = (0..num_chunks)
        .into_par_iter()
        .map(|chunk_id| {
            let seg_low = range_start + chunk_id as u64 * chunk_size;
            if seg_low > limit {
                return vec![];
            }
            let seg_high = (seg_low + chunk_size - 1).min(limit);
            sieve_segment(seg_low, seg_high, &base_primes)
        })
        .collect();

    let mut table = vec![0u64];
    table.extend(base_primes);
    for segment in segments {
        table.extend(segment);
    }
    table
}
