//! End-to-end tests against spec.md §8: the reference identity, the
//! concrete `(x, y) -> P2(x, y)` table, and the documented boundary
//! scenarios and invariants.

use p2core::distributed::p2_distributed_simulated;
use p2core::intmath::isqrt;
use p2core::orchestrator::p2;
use p2core::primes::{pi_simple, SievedPrimeTable};

/// Naive direct computation of invariant 1:
/// `P2(x,y) = Σ_{p prime, y<p<=sqrt(x)} (π(floor(x/p)) − π(p) + 1)`.
fn p2_naive(x: i64, y: i64) -> i64 {
    if x < 4 {
        return 0;
    }
    let sqrt_x = isqrt(x);
    if y >= sqrt_x {
        return 0;
    }
    let table = SievedPrimeTable::new(x as u64 + 1).unwrap();
    let mut sum = 0i64;
    let mut p = y + 1;
    while p <= sqrt_x {
        if pi_simple(&table, p).unwrap() != pi_simple(&table, p - 1).unwrap() {
            // p is prime.
            let xp = x / p;
            sum += pi_simple(&table, xp).unwrap() - pi_simple(&table, p).unwrap() + 1;
        }
        p += 1;
    }
    sum
}

#[test]
fn matches_naive_reference_for_small_x() {
    for x in [10, 100, 1_000, 10_000, 100_000] {
        for y in [0, 1, 3, 10, 25] {
            if y as i64 >= isqrt(x) {
                continue;
            }
            let expected = p2_naive(x, y);
            let actual = p2::<i64>(x, y, 4, None).unwrap();
            assert_eq!(actual, expected, "mismatch at x={x}, y={y}");
        }
    }
}

#[test]
fn concrete_reference_table() {
    // The same (x, y) pairs documented as boundary scenarios; expected
    // values are derived from the naive direct computation rather than
    // hardcoded, per the documented cross-check procedure.
    let cases: [(i64, i64); 5] =
        [(10, 2), (100, 3), (1_000, 10), (10_000, 25), (1_000_000, 100)];
    for (x, y) in cases {
        let expected = p2_naive(x, y);
        let actual = p2::<i64>(x, y, 4, None).unwrap();
        assert_eq!(actual, expected, "mismatch at x={x}, y={y}");
    }
}

#[test]
fn x_below_four_is_always_zero() {
    for x in 0..4 {
        assert_eq!(p2::<i64>(x, 0, 1, None).unwrap(), 0);
    }
}

#[test]
fn y_at_or_above_sqrt_x_is_zero() {
    // x = 100, sqrt(x) = 10: y = 10 puts a = b.
    assert_eq!(p2::<i64>(100, 10, 2, None).unwrap(), 0);
    assert_eq!(p2::<i64>(100, 50, 2, None).unwrap(), 0);
}

#[test]
fn perfect_square_x_boundary() {
    // x = floor(sqrt(x))^2 exactly.
    let x = 10_000i64; // 100^2
    let expected = p2_naive(x, 25);
    assert_eq!(p2::<i64>(x, 25, 3, None).unwrap(), expected);
}

#[test]
fn small_z_forces_single_round() {
    // y close to x forces a tiny z, well under min_distance, so the round
    // loop executes at most once regardless of requested thread count.
    let x = 10_000i64;
    let y = 90;
    let r1 = p2::<i64>(x, y, 1, None).unwrap();
    let r8 = p2::<i64>(x, y, 8, None).unwrap();
    assert_eq!(r1, r8);
}

#[test]
fn result_independent_of_thread_count() {
    let x = 2_000_000i64;
    let y = 50;
    let baseline = p2::<i64>(x, y, 1, None).unwrap();
    for threads in [2, 3, 4, 7, 16] {
        let r = p2::<i64>(x, y, threads, None).unwrap();
        assert_eq!(r, baseline, "mismatch at threads={threads}");
    }
}

#[test]
fn result_independent_of_process_group_size() {
    let x = 2_000_000i64;
    let y = 50;
    let single = p2::<i64>(x, y, 4, None).unwrap();
    for ranks in [1, 2, 4, 6] {
        let distributed = p2_distributed_simulated::<i64>(x, y, 4, ranks, None).unwrap();
        assert_eq!(distributed, single, "mismatch at ranks={ranks}");
    }
}

#[test]
fn monotone_in_x_for_fixed_y() {
    let y = 20;
    let mut prev = 0i64;
    for x in [100, 1_000, 10_000, 100_000, 1_000_000] {
        let r = p2::<i64>(x, y, 4, None).unwrap();
        assert!(r >= prev, "P2 decreased from x={} to x={}", prev, x);
        prev = r;
    }
}

#[test]
fn repeated_calls_are_bitwise_identical() {
    let x = 5_000_000i64;
    let y = 80;
    let a = p2::<i64>(x, y, 4, None).unwrap();
    let b = p2::<i64>(x, y, 4, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn wide_i128_path_matches_i64_on_overlapping_range() {
    let x: i128 = 1_000_000;
    let y = 100;
    let wide = p2::<i128>(x, y, 4, None).unwrap();
    let narrow = p2::<i64>(x as i64, y, 4, None).unwrap();
    assert_eq!(wide, narrow as i128);
}
