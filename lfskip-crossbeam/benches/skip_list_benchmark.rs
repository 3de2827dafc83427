//! Benchmark comparing the epoch-reclaimed SkipList against crossbeam-skiplist.
//!
//! Run with: cargo bench --package lfskip-crossbeam --bench skip_list_benchmark

use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use crossbeam_skiplist::SkipMap;
use lfskip_crossbeam::{EpochSkipList, SkipList};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const OPS_PER_THREAD: usize = 10_000;
const THREAD_COUNTS: [usize; 5] = [1, 2, 4, 8, 16];

/// The operations both maps are measured on.
trait BenchMap: Send + Sync + 'static {
    fn create() -> Self;
    fn set(&self, key: i64, value: i64);
    fn delete(&self, key: &i64);
    fn contains(&self, key: &i64) -> bool;
}

impl BenchMap for EpochSkipList<i64, i64> {
    fn create() -> Self {
        EpochSkipList::default()
    }

    fn set(&self, key: i64, value: i64) {
        SkipList::set(self, key, value);
    }

    fn delete(&self, key: &i64) {
        SkipList::delete(self, key);
    }

    fn contains(&self, key: &i64) -> bool {
        self.contains_key(key)
    }
}

impl BenchMap for SkipMap<i64, i64> {
    fn create() -> Self {
        SkipMap::new()
    }

    // get_or_insert keeps the first value, matching SkipList::set
    fn set(&self, key: i64, value: i64) {
        self.get_or_insert(key, value);
    }

    fn delete(&self, key: &i64) {
        self.remove(key);
    }

    fn contains(&self, key: &i64) -> bool {
        self.contains_key(key)
    }
}

fn run_threads<M, F>(map: &Arc<M>, thread_count: usize, work: F)
where
    M: BenchMap,
    F: Fn(&M, usize) + Send + Sync + Copy + 'static,
{
    let handles: Vec<_> = (0..thread_count)
        .map(|t| {
            let map = Arc::clone(map);
            thread::spawn(move || work(&map, t))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// Disjoint key ranges per thread, insert only
fn bench_insert<M: BenchMap>(thread_count: usize, ops_per_thread: usize) {
    let map = Arc::new(M::create());
    run_threads(&map, thread_count, move |map, t| {
        let base = (t * ops_per_thread) as i64;
        for i in 0..ops_per_thread as i64 {
            map.set(base + i, i);
        }
    });
}

/// 50% contains, 25% set, 25% delete over a shared key range
fn bench_mixed<M: BenchMap>(thread_count: usize, ops_per_thread: usize) {
    let map = Arc::new(M::create());
    let key_range = (ops_per_thread * 2) as i64;
    for key in (0..key_range).step_by(2) {
        map.set(key, key);
    }

    run_threads(&map, thread_count, move |map, t| {
        let mut rng = fastrand::Rng::with_seed(t as u64);
        for _ in 0..ops_per_thread {
            let key = rng.i64(0..key_range);
            match rng.u8(..4) {
                0 | 1 => {
                    black_box(map.contains(&key));
                }
                2 => {
                    map.set(key, key);
                }
                _ => {
                    map.delete(&key);
                }
            }
        }
    });
}

/// Every thread set/deletes the same handful of keys
fn bench_contention<M: BenchMap>(thread_count: usize, ops_per_thread: usize) {
    let map = Arc::new(M::create());
    run_threads(&map, thread_count, move |map, t| {
        for i in 0..ops_per_thread {
            let key = ((t + i) % 16) as i64;
            map.set(key, key);
            map.delete(&key);
        }
    });
}

fn compare<F, G>(c: &mut Criterion, name: &str, skiplist: F, crossbeam: G)
where
    F: Fn(usize, usize),
    G: Fn(usize, usize),
{
    let mut group = c.benchmark_group(name);

    for threads in THREAD_COUNTS {
        group.bench_with_input(
            BenchmarkId::new(format!("{}_lfskip", name), threads),
            &threads,
            |b, &threads| b.iter(|| skiplist(black_box(threads), black_box(OPS_PER_THREAD))),
        );

        group.bench_with_input(
            BenchmarkId::new(format!("{}_crossbeam", name), threads),
            &threads,
            |b, &threads| b.iter(|| crossbeam(black_box(threads), black_box(OPS_PER_THREAD))),
        );
    }

    group.finish();
}

fn insert_benchmark(c: &mut Criterion) {
    compare(
        c,
        "insert",
        bench_insert::<EpochSkipList<i64, i64>>,
        bench_insert::<SkipMap<i64, i64>>,
    );
}

fn mixed_benchmark(c: &mut Criterion) {
    compare(
        c,
        "mixed",
        bench_mixed::<EpochSkipList<i64, i64>>,
        bench_mixed::<SkipMap<i64, i64>>,
    );
}

fn contention_benchmark(c: &mut Criterion) {
    compare(
        c,
        "contention",
        bench_contention::<EpochSkipList<i64, i64>>,
        bench_contention::<SkipMap<i64, i64>>,
    );
}

criterion_group!(benches, insert_benchmark, mixed_benchmark, contention_benchmark);
criterion_main!(benches);
