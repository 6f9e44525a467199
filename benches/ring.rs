//! Criterion benchmarks for the ring buffer's enqueue/dequeue fast
//! paths, single-party and multi-party.
//!
//! Run with:
//!   cargo bench --bench ring

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use dplane::{Ring, RingFlags};

fn bench_spsc_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_spsc_roundtrip");
    group.throughput(Throughput::Elements(1));
    group.bench_function("enqueue_dequeue", |b| {
        let ring: Ring<u64> = Ring::create(1024, RingFlags::SP_ENQ | RingFlags::SC_DEQ).unwrap();
        let mut i = 0u64;
        b.iter(|| {
            ring.enqueue(i).unwrap();
            ring.dequeue().unwrap();
            i = i.wrapping_add(1);
        })
    });
    group.finish();
}

fn bench_mpmc_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_mpmc_roundtrip");

    for &cap in &[64u32, 1024, 8192] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("enqueue_dequeue", cap), &cap, |b, &cap| {
            let ring: Ring<u64> = Ring::create(cap, RingFlags::EXACT_SZ).unwrap();
            let mut i = 0u64;
            b.iter(|| {
                ring.enqueue(i).unwrap();
                ring.dequeue().unwrap();
                i = i.wrapping_add(1);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_spsc_roundtrip, bench_mpmc_roundtrip);
criterion_main!(benches);
