//! Two-stage pipeline: jobs -> workers -> collector.
//!
//! Workers are consumers of the job queue and producers on the result queue.
//! Each one registers on the result queue up front and deregisters once the
//! job queue drains, so the collector finishes exactly when the last worker
//! does. Nobody counts messages.

use pc_queue::{Entry, PcQueue};
use std::thread;
use std::time::Duration;

const NUM_WORKERS: usize = 4;
const NUM_JOBS: usize = 20;

fn main() {
    env_logger::init();
    println!("Pipeline Example\n");

    let jobs = PcQueue::<String>::builder(8)
        .on_dequeue(|entry: Entry<'_, String>| {
            if let Entry::Item(job) = entry {
                log::debug!("handing out {job}");
            }
            Ok(())
        })
        .build()
        .expect("jobs queue");
    let results = PcQueue::<String>::new(8).expect("results queue");

    thread::scope(|s| {
        let producer = jobs.producer().expect("register job producer");
        s.spawn(move || {
            for i in 0..NUM_JOBS {
                let job = format!("Job-{:02}", i);
                println!("📝 Enqueued: {}", job);
                producer.send(job).expect("enqueue job");
            }
            producer.finish().expect("deregister job producer");
            println!("✅ All jobs enqueued!");
        });

        for worker_id in 0..NUM_WORKERS {
            let out = results.producer().expect("register worker");
            let jobs = &jobs;
            s.spawn(move || {
                let mut processed = 0;
                for job in jobs {
                    let job = job.expect("dequeue job");
                    println!("🔨 Worker {} processing: {}", worker_id, job);
                    thread::sleep(Duration::from_millis(20));
                    out.send(format!("{} -> completed by worker {}", job, worker_id))
                        .expect("enqueue result");
                    processed += 1;
                }
                out.finish().expect("deregister worker");
                println!("Worker {} finished ({} jobs)", worker_id, processed);
            });
        }

        let results = &results;
        s.spawn(move || {
            let mut collected = 0;
            for result in results {
                println!("✨ Result: {}", result.expect("dequeue result"));
                collected += 1;
            }
            println!("✅ All {} results collected!", collected);
        });
    });

    println!("\n🎉 Pipeline example completed!");
}
