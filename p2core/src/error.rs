//! Error taxonomy for the P2 core (spec.md §7).
//!
//! Precondition violations (negative inputs, zero threads) are programming
//! errors; we still return them as `Result` rather than panicking so a host
//! binary can print a clean message instead of a backtrace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum P2Error {
    #[error("x must be non-negative, got {value}")]
    NegativeX { value: i128 },

    #[error("y must be non-negative, got {value}")]
    NegativeY { value: i64 },

    #[error("threads must be at least 1, got {value}")]
    ZeroThreads { value: usize },

    #[error("prime sieve could not extend to bound {bound}: {reason}")]
    SieveExhausted { bound: u64, reason: String },

    #[error("rank {rank} is out of range for a {ranks}-rank process group")]
    InvalidRank { rank: usize, ranks: usize },
}

pub type P2Result<T> = Result<T, P2Error>;
