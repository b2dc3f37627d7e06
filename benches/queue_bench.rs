use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

use bounded_mpmc::{Queue, QueueFull};
use crossbeam_channel::bounded;
use flume::bounded as flume_bounded;

const MESSAGES: usize = 1_000_000;
const BUFFER_SIZE: usize = 1024;

const TOPOLOGIES: [(usize, usize); 4] = [(1, 1), (4, 1), (1, 4), (4, 4)];

/// Producers push `MESSAGES` in total; consumers split the same number.
fn run_bounded_mpmc(producers: usize, consumers: usize) {
    let queue = Arc::new(Queue::<usize>::new(BUFFER_SIZE).unwrap());
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;
    let mut handles = vec![];

    for p in 0..producers {
        let q = queue.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                let mut item = black_box(p * per_producer + i);
                while let Err(QueueFull(back)) = q.enqueue(item) {
                    item = back;
                    std::hint::spin_loop();
                }
            }
        }));
    }

    for _ in 0..consumers {
        let q = queue.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                while q.dequeue().is_err() {
                    std::hint::spin_loop();
                }
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

fn run_crossbeam(producers: usize, consumers: usize) {
    let (tx, rx) = bounded::<usize>(BUFFER_SIZE);
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;
    let mut handles = vec![];

    for p in 0..producers {
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                tx.send(black_box(p * per_producer + i)).unwrap();
            }
        }));
    }
    for _ in 0..consumers {
        let rx = rx.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                rx.recv().unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

fn run_flume(producers: usize, consumers: usize) {
    let (tx, rx) = flume_bounded::<usize>(BUFFER_SIZE);
    let per_producer = MESSAGES / producers;
    let per_consumer = MESSAGES / consumers;
    let mut handles = vec![];

    for p in 0..producers {
        let tx = tx.clone();
        handles.push(thread::spawn(move || {
            for i in 0..per_producer {
                tx.send(black_box(p * per_producer + i)).unwrap();
            }
        }));
    }
    for _ in 0..consumers {
        let rx = rx.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..per_consumer {
                rx.recv().unwrap();
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }
}

fn bench_topologies(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Elements(MESSAGES as u64));
    group.sample_size(10);

    for (producers, consumers) in TOPOLOGIES {
        let label = format!("{producers}p_{consumers}c");
        group.bench_with_input(
            BenchmarkId::new("bounded_mpmc", &label),
            &(producers, consumers),
            |b, &(p, c)| b.iter(|| run_bounded_mpmc(p, c)),
        );
        group.bench_with_input(
            BenchmarkId::new("crossbeam_channel", &label),
            &(producers, consumers),
            |b, &(p, c)| b.iter(|| run_crossbeam(p, c)),
        );
        group.bench_with_input(
            BenchmarkId::new("flume", &label),
            &(producers, consumers),
            |b, &(p, c)| b.iter(|| run_flume(p, c)),
        );
    }

    group.finish();
}

fn bench_single_thread_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.throughput(Throughput::Elements(1));

    let ints = Queue::<u64>::new(BUFFER_SIZE).unwrap();
    group.bench_function("inline_u64", |b| {
        b.iter(|| {
            ints.enqueue(black_box(7)).unwrap();
            black_box(ints.dequeue().unwrap());
        })
    });

    let wide = Queue::<[u64; 8]>::new(BUFFER_SIZE).unwrap();
    group.bench_function("boxed_64_bytes", |b| {
        b.iter(|| {
            wide.enqueue(black_box([7; 8])).unwrap();
            black_box(wide.dequeue().unwrap());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_topologies, bench_single_thread_round_trip);
criterion_main!(benches);
