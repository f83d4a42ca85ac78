//! MPMC throughput under contention
//!
//! Compares the Michael & Scott queue against crossbeam's SegQueue and a
//! parking_lot mutex around a VecDeque. Head/tail cache-line isolation shows
//! up here as the gap at higher thread counts.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossbeam::queue::SegQueue;
use message_queue::{LockFreeQueue, MessagePool};
use parking_lot::Mutex;

const ITEMS_PER_PRODUCER: u64 = 10_000;

trait Mpmc: Send + Sync + 'static {
    fn push(&self, item: u64);
    fn pop(&self) -> Option<u64>;
}

impl Mpmc for LockFreeQueue<u64> {
    fn push(&self, item: u64) {
        self.enqueue(item);
    }
    fn pop(&self) -> Option<u64> {
        self.try_dequeue()
    }
}

impl Mpmc for SegQueue<u64> {
    fn push(&self, item: u64) {
        SegQueue::push(self, item);
    }
    fn pop(&self) -> Option<u64> {
        SegQueue::pop(self)
    }
}

impl Mpmc for Mutex<VecDeque<u64>> {
    fn push(&self, item: u64) {
        self.lock().push_back(item);
    }
    fn pop(&self) -> Option<u64> {
        self.lock().pop_front()
    }
}

fn run<Q: Mpmc>(queue: Arc<Q>, threads: usize) {
    let total = threads as u64 * ITEMS_PER_PRODUCER;
    let per_consumer = total / threads as u64;

    let producers: Vec<_> = (0..threads)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..ITEMS_PER_PRODUCER {
                    queue.push(i);
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..threads)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut taken = 0;
                while taken < per_consumer {
                    if let Some(item) = queue.pop() {
                        black_box(item);
                        taken += 1;
                    } else {
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    for handle in producers.into_iter().chain(consumers) {
        let _ = handle.join();
    }
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc_contention");
    group.sample_size(20);

    for threads in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * ITEMS_PER_PRODUCER));

        group.bench_with_input(BenchmarkId::new("michael_scott", threads), &threads, |b, &t| {
            b.iter(|| run(Arc::new(LockFreeQueue::<u64>::new()), t));
        });
        group.bench_with_input(BenchmarkId::new("crossbeam_segqueue", threads), &threads, |b, &t| {
            b.iter(|| run(Arc::new(SegQueue::<u64>::new()), t));
        });
        group.bench_with_input(BenchmarkId::new("mutex_vecdeque", threads), &threads, |b, &t| {
            b.iter(|| run(Arc::new(Mutex::new(VecDeque::<u64>::new())), t));
        });
    }

    group.finish();
}

fn bench_single_thread(c: &mut Criterion) {
    let queue = LockFreeQueue::new();
    c.bench_function("enqueue_dequeue_uncontended", |b| {
        b.iter(|| {
            queue.enqueue(black_box(1u64));
            black_box(queue.try_dequeue());
        });
    });

    let pool = MessagePool::new(64, 64, 256);
    c.bench_function("pool_rent_release", |b| {
        b.iter(|| {
            let wrapper = pool.rent();
            pool.release(black_box(wrapper));
        });
    });
}

criterion_group!(benches, bench_contention, bench_single_thread);
criterion_main!(benches);
