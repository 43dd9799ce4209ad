//! Tail stdin and keep a live ranking of the most frequent lines.
//!
//! Run with: `tail -f access.log | cargo run --example top_tail`
//!
//! Every second the screen redraws with the top rows and their per-second
//! rates; lines not seen for 30 seconds are evicted. A synthetic `total`
//! row tracks the whole stream. Set `RUST_LOG=debug` to see prune sweeps.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use topkit::prelude::*;

const ROWS: usize = 20;
const REFRESH_INTERVAL: Duration = Duration::from_secs(1);
const PRUNE_INTERVAL: Duration = Duration::from_secs(30);

fn render(index: &RankIndex, rates: &rustc_hash::FxHashMap<Arc<str>, f64>) {
    print!("\x1b[2J\x1b[H");
    for entry in index.top_n(ROWS) {
        let rate = rates.get(entry.id.as_ref()).copied().unwrap_or(0.0);
        println!("{:>8} {} ({:.2}/s)", entry.count, entry.id, rate);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let index = Arc::new(RankIndex::new());
    let monitor = Arc::new(RateMonitor::new());
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let index = Arc::clone(&index);
        let monitor = Arc::clone(&monitor);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let now = Timestamp::now();
                if let Err(err) = index
                    .increment(&line, now)
                    .and_then(|_| index.increment("total", now))
                {
                    eprintln!("error: {err}");
                    break;
                }
                monitor.record(&line);
                monitor.record("total");
            }
            done.store(true, Ordering::Relaxed);
        })
    };

    // First snapshot only establishes the rate baseline.
    monitor.snapshot();
    let mut last_prune = Instant::now();

    while !done.load(Ordering::Relaxed) {
        thread::sleep(REFRESH_INTERVAL);

        if last_prune.elapsed() >= PRUNE_INTERVAL {
            let cutoff = Timestamp::from_nanos(
                Timestamp::now()
                    .as_nanos()
                    .saturating_sub(PRUNE_INTERVAL.as_nanos() as u64),
            );
            if let Err(err) = index.prune_before(cutoff) {
                eprintln!("error: {err}");
                break;
            }
            last_prune = Instant::now();
        }

        let rates = monitor.snapshot();
        render(&index, &rates);
    }

    let _ = reader.join();
    render(&index, &rustc_hash::FxHashMap::default());
}
