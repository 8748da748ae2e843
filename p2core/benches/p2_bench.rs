use criterion::{black_box, criterion_group, criterion_main, Criterion};
use p2core::orchestrator::p2;
use p2core::primes::SievedPrimeTable;

fn benchmark_p2_thread_scaling(c: &mut Criterion) {
    let x: i64 = 50_000_000;
    let y: i64 = 1_000;

    let mut group = c.benchmark_group("P2 thread scaling");

    for threads in [1usize, 2, 4, 8] {
        group.bench_function(format!("{threads} threads"), |b| {
            b.iter(|| p2::<i64>(black_box(x), black_box(y), threads, None).unwrap())
        });
    }

    group.finish();
}

fn benchmark_sieve_extend(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sieve extend");

    group.bench_function("extend to 1_000_000", |b| {
        b.iter(|| {
            let table = SievedPrimeTable::new(2).unwrap();
            table.extend_to(black_box(1_000_000)).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_p2_thread_scaling, benchmark_sieve_extend);
criterion_main!(benches);
