//! Computational core of a prime-counting engine: the distributed-parallel
//! evaluation of the second partial sieve function P2(x, y).
//!
//! See `SPEC_FULL.md` at the workspace root for the full requirements this
//! crate implements. In short: four layers, leaves first --
//! [`primes`] (the prime iterator service), [`intmath`] (the generic
//! integer math kernel), [`worker`] (the pure per-window P2 worker) and
//! [`orchestrator`] (the round loop, adaptive stride and serial stitch).
//! [`distributed`] adds the static-shard, multi-rank variant of the
//! orchestrator's round loop.

pub mod cache;
pub mod distributed;
pub mod error;
pub mod intmath;
pub mod orchestrator;
pub mod primes;
pub mod worker;

pub use error::{P2Error, P2Result};
pub use orchestrator::StatusConfig;

/// `P2(x: i64, y: i64, threads) -> i64` (spec.md §6).
pub fn p2_i64(x: i64, y: i64, threads: usize, status: Option<StatusConfig>) -> P2Result<i64> {
    orchestrator::p2(x, y, threads, status)
}

/// `P2(x: i128, y: i64, threads) -> i128`, the optional wide path of
/// spec.md §6, for `x` beyond `i64::MAX`.
pub fn p2_i128(x: i128, y: i64, threads: usize, status: Option<StatusConfig>) -> P2Result<i128> {
    orchestrator::p2(x, y, threads, status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i64_and_i128_paths_agree_on_small_inputs() {
        let a = p2_i64(1_000_000, 100, 4, None).unwrap();
        let b = p2_i128(1_000_000, 100, 4, None).unwrap();
        assert_eq!(a as i128, b);
    }
}
