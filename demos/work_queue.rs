//! Worker pool fed by one queue and reporting through another.
//!
//! Run with `cargo run --example work_queue --features tracing` to see the
//! queue lifecycle events.

use bounded_mpmc::{Queue, QueueFull};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NUM_WORKERS: usize = 4;
const NUM_JOBS: usize = 20;

fn push<T>(queue: &Queue<T>, mut item: T) {
    while let Err(QueueFull(back)) = queue.enqueue(item) {
        item = back;
        thread::yield_now();
    }
}

fn main() -> Result<(), bounded_mpmc::InitError> {
    bounded_mpmc::init_tracing();
    println!("Work Queue Example\n");

    // Jobs are `String`s, wider than a word, so they travel boxed.
    let jobs = Arc::new(Queue::<String>::new(8)?);
    let results = Arc::new(Queue::<String>::new(32)?);
    let started = Arc::new(AtomicUsize::new(0));

    let jobs_tx = jobs.clone();
    let producer = thread::spawn(move || {
        for i in 0..NUM_JOBS {
            let job = format!("Job-{i:02}");
            println!("Enqueued: {job}");
            push(&jobs_tx, job);
        }
        println!("All jobs enqueued");
    });

    let mut workers = vec![];
    for worker_id in 0..NUM_WORKERS {
        let jobs_rx = jobs.clone();
        let results_tx = results.clone();
        let started = started.clone();

        workers.push(thread::spawn(move || {
            let mut processed = 0;
            while started.load(Ordering::Relaxed) < NUM_JOBS {
                match jobs_rx.dequeue() {
                    Ok(job) => {
                        started.fetch_add(1, Ordering::Relaxed);
                        thread::sleep(Duration::from_millis(20));
                        push(&results_tx, format!("{job} -> completed by worker {worker_id}"));
                        processed += 1;
                    }
                    Err(_) => thread::sleep(Duration::from_millis(1)),
                }
            }
            println!("Worker {worker_id} finished ({processed} jobs)");
        }));
    }

    let results_rx = results.clone();
    let collector = thread::spawn(move || {
        let mut collected = 0;
        while collected < NUM_JOBS {
            match results_rx.dequeue() {
                Ok(result) => {
                    println!("Result: {result}");
                    collected += 1;
                }
                Err(_) => thread::yield_now(),
            }
        }
        println!("All results collected");
    });

    producer.join().unwrap();
    for worker in workers {
        worker.join().unwrap();
    }
    collector.join().unwrap();

    println!("\nWork queue example completed");
    Ok(())
}
