//! P2 Orchestrator (spec.md §4.4): the round loop, adaptive stride, and the
//! strictly-ordered serial stitch that reconstructs the `π(start)` term each
//! worker's contribution omitted. The round loop accumulates
//! `Σ_{a<i≤b} π(⌊x/p_i⌋)`; the caller recovers `P2(x, y)` by subtracting
//! `C(a,b)` exactly once.

use std::time::Instant;

use tracing::info;

use crate::cache::CachePadded;
use crate::error::{P2Error, P2Result};
use crate::intmath::{ceil_div, isqrt, Int};
use crate::primes::{pi_simple, SievedPrimeTable};
use crate::worker::{run_worker, WorkerOutput};

/// `min_distance` from spec.md §3: floor on `thread_distance` that prevents
/// pathological per-round scheduling overhead on small inputs.
pub const MIN_DISTANCE: i64 = 1 << 23;

/// How often (and with what precision) the round loop reports progress.
#[derive(Debug, Clone, Copy)]
pub struct StatusConfig {
    pub decimals: usize,
}

fn validate_preamble<T: Int>(x: T, y: i64, threads: usize) -> P2Result<()> {
    if x < T::ZERO {
        return Err(P2Error::NegativeX { value: x.to_f64() as i128 });
    }
    if y < 0 {
        return Err(P2Error::NegativeY { value: y });
    }
    if threads == 0 {
        return Err(P2Error::ZeroThreads { value: threads });
    }
    Ok(())
}

/// The closed-form term `C(a,b) = -[(a-2)(a+1) - (b-2)(b+1)] / 2`.
pub(crate) fn c_ab<T: Int>(a: i64, b: i64) -> T {
    let a = T::from_i64(a);
    let b = T::from_i64(b);
    let two = T::from_i64(2);
    let one = T::from_i64(1);
    let term_a = (a - two) * (a + one);
    let term_b = (b - two) * (b + one);
    (term_b - term_a) / two
}

/// Shared implementation of the round loop, parameterized over the starting
/// `low`/`pix_low` so both the single-process entry point and each
/// distributed rank's shard can drive it.
///
/// `pix_low_start` must equal `π(stop)` for the first window this call will
/// process, where `stop = min(⌊x/max(low_start,1)⌋, ⌊√x⌋)` -- i.e. the prime
/// count at the *top* of the range this call sweeps, not the bottom. The
/// single-process entry point below passes `b` because its first window's
/// stop is `⌊√x⌋`; a distributed shard passes `π` of its own shard's
/// top boundary instead (see `distributed::run_shard`).
///
/// Returns the sum accumulated strictly from worker contributions and the
/// serial stitch over `[low_start, z)` -- it does **not** include `C(a,b)`,
/// which callers subtract exactly once.
pub(crate) fn run_rounds<T: Int>(
    x: T,
    y: i64,
    z: i64,
    low_start: i64,
    pix_low_start: i64,
    threads: usize,
    table: &SievedPrimeTable,
    status: Option<StatusConfig>,
) -> P2Result<T> {
    let mut low = low_start;
    let mut pix_low = pix_low_start;
    let mut thread_distance = MIN_DISTANCE;
    let mut sum = T::ZERO;

    while low < z {
        let max_threads = ceil_div(z - low, thread_distance);
        let active = std::cmp::max(1, std::cmp::min(threads as i64, max_threads)) as usize;

        let t0 = Instant::now();

        let mut outputs: Vec<CachePadded<P2Result<WorkerOutput<T>>>> =
            (0..active).map(|_| CachePadded::new(Ok(WorkerOutput::zero()))).collect();

        std::thread::scope(|scope| {
            for (i, slot) in outputs.iter_mut().enumerate() {
                scope.spawn(move || {
                    **slot = run_worker(x, y, z, low, i as i64, thread_distance, table);
                });
            }
        });

        let mut resolved = Vec::with_capacity(active);
        for slot in outputs.into_iter() {
            resolved.push(slot.into_inner()?);
        }

        for out in &resolved {
            sum = sum + out.partial_sum;
        }

        low += thread_distance * active as i64;

        let elapsed = t0.elapsed().as_secs_f64();
        if elapsed < 60.0 {
            thread_distance = thread_distance.saturating_mul(2);
        } else if elapsed > 60.0 {
            thread_distance = std::cmp::max(1, thread_distance / 2);
        }
        let upper = if low < z {
            ceil_div(z - low, active as i64)
        } else {
            thread_distance
        };
        thread_distance = thread_distance.clamp(MIN_DISTANCE, std::cmp::max(MIN_DISTANCE, upper));

        // Serial stitch, strictly ascending worker index (spec.md §4.4).
        // `pix_low` tracks π(start) for the window about to be stitched: it
        // begins at `b` (the π(start) of the very first window, whose start
        // is ⌊√x⌋) and falls by each window's own prime count as the sweep
        // moves toward smaller primes, so it must be decremented *before*
        // it multiplies that window's count.
        for out in &resolved {
            pix_low -= out.pix_count;
            sum = sum + T::from_i64(pix_low) * T::from_i64(out.pix_count);
        }

        if let Some(cfg) = status {
            let pct = 100.0 * low.min(z) as f64 / z.max(1) as f64;
            let pct_str = format!("{:.*}", cfg.decimals, pct);
            info!(low, z, pct = %pct_str, "p2_round");
        }
    }

    Ok(sum)
}

/// Top-level entry point (spec.md §6: `P2(x, y, threads) -> result`).
pub fn p2<T: Int>(x: T, y: i64, threads: usize, status: Option<StatusConfig>) -> P2Result<T> {
    validate_preamble(x, y, threads)?;

    if x < T::from_i64(4) {
        return Ok(T::ZERO);
    }

    let sqrt_x = isqrt(x).to_i64();
    let table = SievedPrimeTable::new(sqrt_x.max(y).max(2) as u64)?;

    let a = pi_simple(&table, y)?;
    let b = pi_simple(&table, sqrt_x)?;
    if a >= b {
        return Ok(T::ZERO);
    }

    let z = (x / T::from_i64(std::cmp::max(y, 1))).to_i64();
    table.extend_to(z as u64)?;

    // The round loop accumulates Σ π(⌊x/p⌋) over the whole prime range; the
    // closed-form term is subtracted exactly once to recover P2(x, y).
    let sum = run_rounds(x, y, z, 2, b, threads, &table, status)? - c_ab::<T>(a, b);

    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_below_four_is_zero() {
        assert_eq!(p2::<i64>(0, 2, 4, None).unwrap(), 0);
        assert_eq!(p2::<i64>(3, 0, 1, None).unwrap(), 0);
    }

    #[test]
    fn y_at_or_above_sqrt_x_is_zero() {
        assert_eq!(p2::<i64>(100, 10, 4, None).unwrap(), 0);
    }

    #[test]
    fn rejects_negative_y() {
        assert!(p2::<i64>(100, -1, 1, None).is_err());
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(p2::<i64>(100, 3, 0, None).is_err());
    }

    #[test]
    fn thread_count_does_not_change_result() {
        let r1 = p2::<i64>(1_000_000, 100, 1, None).unwrap();
        let r2 = p2::<i64>(1_000_000, 100, 8, None).unwrap();
        assert_eq!(r1, r2);
    }
}
