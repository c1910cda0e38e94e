//! Deduplicates a stream of ids across worker threads.
//!
//! Each worker claims ids with `try_set`; only the worker that flips a bit
//! first counts the id as new. Run with `cargo run --example dedup`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Context, Result};
use sparse_atomic_bitset::{buckets_for, AtomicSparseBitset};

const MAX_ID: usize = 1 << 24;
const CAPACITY: usize = buckets_for(MAX_ID, 16);
const WORKERS: usize = 4;

type Seen = AtomicSparseBitset<CAPACITY>;

fn ids_for(worker: usize) -> impl Iterator<Item = usize> {
    // Overlapping strided ranges, so most ids are seen by several workers.
    (0..50_000).map(move |i| (i * 7 + worker * 13_000) % (MAX_ID / 64))
}

fn main() -> Result<()> {
    // Lost install races are reported at debug level.
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let seen = Seen::new();
    let unique = AtomicUsize::new(0);

    thread::scope(|s| -> Result<()> {
        let handles: Vec<_> = (0..WORKERS)
            .map(|w| {
                let seen = &seen;
                let unique = &unique;
                s.spawn(move || -> Result<()> {
                    for id in ids_for(w) {
                        if seen.try_set(id).with_context(|| format!("claiming id {id}"))? {
                            unique.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Ok(())
                })
            })
            .collect();
        for h in handles {
            h.join()
                .map_err(|_| anyhow::anyhow!("worker panicked"))??;
        }
        Ok(())
    })?;

    let stats = seen.stats();
    println!("unique ids: {}", unique.load(Ordering::Relaxed));
    println!("{}", serde_json::to_string_pretty(&stats)?);
    anyhow::ensure!(
        stats.set_bits == unique.load(Ordering::Relaxed),
        "set bits and claimed ids disagree"
    );
    Ok(())
}
