#![cfg(not(loom))]

use std::sync::atomic::{AtomicU32, AtomicU8};
use std::sync::{Arc, Barrier};
use std::thread;

use crossbeam_utils::thread as cb_thread;
use sparse_atomic_bitset::{AtomicSparseBitset, Status};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn bitset_is_send_sync() {
    assert_send_sync::<AtomicSparseBitset<8>>();
    assert_send_sync::<AtomicSparseBitset<8, 4, AtomicU8, 4, u16>>();
}

/// N threads flip disjoint bits of the same word; none may be lost.
#[test]
fn disjoint_bits_same_word_no_lost_update() {
    const THREADS: usize = 8;
    for _ in 0..200 {
        let s: Arc<AtomicSparseBitset<1, 5, AtomicU32>> = Arc::new(AtomicSparseBitset::new());
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let s = Arc::clone(&s);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    // Even bits only, all inside word 0.
                    s.set(t * 2)
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Status::Success);
        }

        for pos in 0..32 {
            let expected = if pos % 2 == 0 && pos < THREADS * 2 {
                Status::Yes
            } else {
                Status::No
            };
            assert_eq!(s.test(pos), expected, "bit {pos}");
        }
        assert_eq!(s.allocated_buckets(), 1);
    }
}

/// Many threads race to be the first writer into the same empty bucket.
#[test]
fn racing_installs_keep_every_bit() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 64;
    for _ in 0..50 {
        let s: AtomicSparseBitset<4, 12> = AtomicSparseBitset::new();
        let barrier = Barrier::new(THREADS);
        cb_thread::scope(|scope| {
            for t in 0..THREADS {
                let s = &s;
                let barrier = &barrier;
                scope.spawn(move |_| {
                    barrier.wait();
                    for i in 0..PER_THREAD {
                        // Interleave so every thread hits every bucket.
                        let pos = (i % 4) * 4096 + t * PER_THREAD + i;
                        assert_eq!(s.set(pos), Status::Success);
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(s.allocated_buckets(), 4);
        assert_eq!(s.count_ones(), THREADS * PER_THREAD);
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                assert_eq!(s.test((i % 4) * 4096 + t * PER_THREAD + i), Status::Yes);
            }
        }
    }
}

#[test]
fn concurrent_set_and_reset_on_separate_bits() {
    let s: AtomicSparseBitset<2, 8, AtomicU8> = AtomicSparseBitset::new();
    for pos in (0..512).step_by(2) {
        assert_eq!(s.set(pos), Status::Success);
    }
    cb_thread::scope(|scope| {
        // Clear even bits while setting odd bits in the same words.
        scope.spawn(|_| {
            for pos in (0..512).step_by(2) {
                assert_eq!(s.reset(pos), Status::Success);
            }
        });
        scope.spawn(|_| {
            for pos in (1..512).step_by(2) {
                assert_eq!(s.set(pos), Status::Success);
            }
        });
    })
    .unwrap();

    for pos in 0..512 {
        let expected = if pos % 2 == 1 { Status::Yes } else { Status::No };
        assert_eq!(s.test(pos), expected, "bit {pos}");
    }
}

/// Bulk reset racing with setters: each bit ends in a state some
/// serialization allows. Bits set after the reset finished must survive.
#[test]
fn bulk_reset_races_with_setters() {
    let s: AtomicSparseBitset<8, 10> = AtomicSparseBitset::new();
    let phase = Barrier::new(3);
    cb_thread::scope(|scope| {
        for t in 0..2usize {
            let s = &s;
            let phase = &phase;
            scope.spawn(move |_| {
                for i in 0..2000 {
                    assert_eq!(s.set((t * 2000 + i) % 8192), Status::Success);
                }
                phase.wait();
                // After the barrier the reset below has completed.
                phase.wait();
                for i in 0..100 {
                    assert_eq!(s.set(t * 4096 + i), Status::Success);
                }
            });
        }
        phase.wait();
        assert_eq!(s.reset_all(), Status::Success);
        phase.wait();
    })
    .unwrap();

    // Every bit written before the reset is gone unless rewritten afterwards.
    let survivors: Vec<usize> = s.iter_ones().collect();
    let mut expected: Vec<usize> = (0..2usize)
        .flat_map(|t| (0..100).map(move |i| t * 4096 + i))
        .collect();
    expected.sort_unstable();
    assert_eq!(survivors, expected);
}

/// Fully overlapping bulk reset: no stray bits appear, and writes made after
/// the racing resets have joined all stick.
#[test]
fn overlapping_bulk_reset_is_per_bit_consistent() {
    let s: AtomicSparseBitset<4, 10> = AtomicSparseBitset::new();
    let evens = || (0..4096usize).step_by(2);
    cb_thread::scope(|scope| {
        scope.spawn(|_| {
            for i in evens() {
                assert_eq!(s.set(i), Status::Success);
            }
        });
        scope.spawn(|_| {
            for _ in 0..50 {
                assert_eq!(s.reset_all(), Status::Success);
            }
        });
    })
    .unwrap();

    // Only even bits were ever written.
    assert!(s.iter_ones().all(|p| p % 2 == 0));

    for i in evens() {
        assert_eq!(s.set(i), Status::Success);
    }
    for pos in 0..4096 {
        let expected = if pos % 2 == 0 { Status::Yes } else { Status::No };
        assert_eq!(s.test(pos), expected, "bit {pos}");
    }
    assert_eq!(s.count_ones(), 2048);
    assert_eq!(s.allocated_buckets(), 4);
}
