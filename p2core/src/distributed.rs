//! Distributed mode (spec.md §4.4 "Distributed mode"): static equal-shard
//! partitioning of the outer index space `[2, z)` across `R` ranks, each
//! rank computing its own `pix_low` seed independently from the shared
//! prime oracle (the prime count at the top of its own shard), with no
//! cross-rank messaging during compute.
//!
//! The actual collective transport (MPI or the TCP fallback) is a concern
//! of the host binary (`apps/p2-dist`), mirroring the teacher's
//! `primes-mpi` split between `mpi_impl`/`tcp_impl` and the pure sieve
//! math. This module only provides the pure, synchronous pieces: computing
//! a shard's bounds, running a shard, and combining shard sums once they
//! have been gathered.

use crate::error::{P2Error, P2Result};
use crate::intmath::{ceil_div, isqrt, Int};
use crate::orchestrator::{c_ab, run_rounds, StatusConfig};
use crate::primes::{pi_simple, SievedPrimeTable};

/// The static, equal partition of `[2, z)` into `ranks` contiguous shards;
/// the last shard absorbs the remainder.
pub fn shard_bounds(z: i64, ranks: usize, rank: usize) -> P2Result<(i64, i64)> {
    if rank >= ranks {
        return Err(P2Error::InvalidRank { rank, ranks });
    }
    let total = std::cmp::max(0, z - 2);
    let shard_size = ceil_div(std::cmp::max(total, 1), ranks as i64);
    let start = 2 + shard_size * rank as i64;
    let end = if rank + 1 == ranks { z } else { std::cmp::min(start + shard_size, z) };
    Ok((std::cmp::min(start, z), std::cmp::max(std::cmp::min(start, z), end)))
}

/// Everything one rank needs to contribute to the final collective
/// reduction: its local shard sum plus (on rank 0 only, by convention) the
/// `C(a,b)` closed-form term, which must be subtracted exactly once.
#[derive(Debug, Clone, Copy)]
pub struct ShardResult<T> {
    pub shard_sum: T,
    pub c_ab_term: Option<T>,
}

/// Run the round loop over one rank's shard. `table` must already be
/// extended to at least `z`; the rank computes its own `pix_low` seed
/// independently from the same oracle, per spec.md §4.4: it is
/// `π(min(⌊x/shard_start⌋, ⌊√x⌋))`, the prime count at the *top* of this
/// shard's range (mirroring how the single-process path seeds with `b`,
/// the prime count at the top of the whole range).
pub fn run_shard<T: Int>(
    x: T,
    y: i64,
    z: i64,
    threads: usize,
    rank: usize,
    ranks: usize,
    table: &SievedPrimeTable,
    status: Option<StatusConfig>,
) -> P2Result<ShardResult<T>> {
    let (shard_start, shard_end) = shard_bounds(z, ranks, rank)?;
    let sqrt_x = isqrt(x).to_i64();
    let shard_top = std::cmp::min((x / T::from_i64(std::cmp::max(shard_start, 1))).to_i64(), sqrt_x);
    let pix_low = pi_simple(table, shard_top)?;

    let shard_sum = if shard_start < shard_end {
        run_rounds(x, y, shard_end, shard_start, pix_low, threads, table, status)?
    } else {
        T::ZERO
    };

    let c_ab_term = if rank == 0 {
        let a = pi_simple(table, y)?;
        let b = pi_simple(table, sqrt_x)?;
        Some(if a >= b { T::ZERO } else { c_ab::<T>(a, b) })
    } else {
        None
    };

    Ok(ShardResult { shard_sum, c_ab_term })
}

/// The collective sum-reduction of spec.md §4.4: add every shard's local
/// sum, then subtract the (single) `C(a,b)` term contributed by whichever
/// rank computed it -- the same closed-form correction the single-process
/// path applies once at the end of `orchestrator::p2`.
pub fn combine_shards<T: Int>(results: &[ShardResult<T>]) -> T {
    let mut total = T::ZERO;
    for r in results {
        total = total + r.shard_sum;
        if let Some(c) = r.c_ab_term {
            total = total - c;
        }
    }
    total
}

/// Run every rank's shard in-process and combine the results. This is the
/// single-process fallback `apps/p2-dist` uses when no MPI/TCP process
/// group is present, and it also lets invariant 3 of spec.md §8
/// ("single-rank and multi-rank runs... agree exactly") be tested without
/// real inter-process transport.
pub fn p2_distributed_simulated<T: Int>(
    x: T,
    y: i64,
    threads: usize,
    ranks: usize,
    status: Option<StatusConfig>,
) -> P2Result<T> {
    if ranks == 0 {
        return Err(P2Error::InvalidRank { rank: 0, ranks });
    }
    if x < T::ZERO {
        return Err(P2Error::NegativeX { value: x.to_f64() as i128 });
    }
    if y < 0 {
        return Err(P2Error::NegativeY { value: y });
    }
    if threads == 0 {
        return Err(P2Error::ZeroThreads { value: threads });
    }

    if x < T::from_i64(4) {
        return Ok(T::ZERO);
    }

    let sqrt_x = isqrt(x).to_i64();
    let z = (x / T::from_i64(std::cmp::max(y, 1))).to_i64();
    let table = SievedPrimeTable::new(std::cmp::max(sqrt_x, z).max(2) as u64)?;
    table.extend_to(z.max(2) as u64)?;

    let a = pi_simple(&table, y)?;
    let b = pi_simple(&table, sqrt_x)?;
    if a >= b {
        return Ok(T::ZERO);
    }

    let mut results = Vec::with_capacity(ranks);
    for rank in 0..ranks {
        results.push(run_shard(x, y, z, threads, rank, ranks, &table, status)?);
    }

    Ok(combine_shards(&results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::p2;

    #[test]
    fn shard_bounds_cover_range_without_gaps() {
        let z = 1_000_000;
        let ranks = 4;
        let mut prev_end = 2;
        for rank in 0..ranks {
            let (start, end) = shard_bounds(z, ranks, rank).unwrap();
            assert_eq!(start, prev_end);
            prev_end = end;
        }
        assert_eq!(prev_end, z);
    }

    #[test]
    fn single_rank_matches_single_process() {
        let x = 1_000_000i64;
        let y = 100;
        let single = p2::<i64>(x, y, 4, None).unwrap();
        let distributed = p2_distributed_simulated::<i64>(x, y, 4, 1, None).unwrap();
        assert_eq!(single, distributed);
    }

    #[test]
    fn multi_rank_matches_single_process() {
        let x = 1_000_000i64;
        let y = 100;
        let single = p2::<i64>(x, y, 2, None).unwrap();
        for ranks in [2, 3, 5] {
            let distributed = p2_distributed_simulated::<i64>(x, y, 2, ranks, None).unwrap();
            assert_eq!(single, distributed, "mismatch at ranks={}", ranks);
        }
    }
}
