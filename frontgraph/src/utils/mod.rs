/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Miscellaneous utilities: thread pools, worker identity, parallel scans,
//! and the atomic helpers used by update functions.

use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

mod granularity;
pub use granularity::*;

/// Utility macro to create [`thread_pools`](`rayon::ThreadPool`).
///
/// There are two forms of this macro:
/// * Create a [`ThreadPool`](rayon::ThreadPool) with the default settings:
/// ```
/// # use frontgraph::thread_pool;
/// let t: rayon::ThreadPool = thread_pool![];
/// ```
/// * Create a [`ThreadPool`](rayon::ThreadPool) with a given number of threads:
/// ```
/// # use frontgraph::thread_pool;
/// let t: rayon::ThreadPool = thread_pool![7];
/// assert_eq!(t.current_num_threads(), 7);
/// ```
#[macro_export]
macro_rules! thread_pool {
    () => {
        rayon::ThreadPoolBuilder::new()
            .build()
            .expect("Cannot build a ThreadPool with default parameters")
    };
    ($num_threads:expr) => {
        rayon::ThreadPoolBuilder::new()
            .num_threads($num_threads)
            .build()
            .unwrap_or_else(|_| {
                panic!(
                    "Cannot build a ThreadPool with default parameters and {} threads",
                    $num_threads,
                )
            })
    };
}

/// Returns the number of workers of the thread pool the caller is running
/// on, or of the global pool outside any pool.
pub fn num_workers() -> usize {
    rayon::current_num_threads()
}

/// Returns the stable index of the current worker in `[0..num_workers())`,
/// or `num_workers()` for threads that are not part of a pool.
///
/// Per-worker structures (e.g., the free lists of
/// [`BlockAllocator`](crate::alloc::BlockAllocator)) index by this value.
pub fn worker_id() -> usize {
    rayon::current_thread_index().unwrap_or_else(num_workers)
}

/// Returns the total physical memory of the machine, in bytes.
pub fn total_memory() -> usize {
    let system = sysinfo::System::new_with_specifics(
        sysinfo::RefreshKind::nothing()
            .with_memory(sysinfo::MemoryRefreshKind::nothing().with_ram()),
    );
    usize::try_from(system.total_memory()).expect("System memory overflows usize")
}

/// In-place exclusive prefix sum over `xs`, parallelized by chunks; returns
/// the overall total.
///
/// `xs[i]` becomes the sum of the original values at indices `< i`; the sum
/// of all original values is returned (callers typically keep it in a
/// trailing slot themselves).
pub fn scan_add_inplace(xs: &mut [usize]) -> usize {
    const CHUNK: usize = 1 << 16;
    if xs.len() <= CHUNK {
        let mut acc = 0;
        for x in xs.iter_mut() {
            let v = *x;
            *x = acc;
            acc += v;
        }
        return acc;
    }

    let mut sums: Vec<usize> = xs.par_chunks(CHUNK).map(|c| c.iter().sum()).collect();
    let total = {
        let mut acc = 0;
        for s in sums.iter_mut() {
            let v = *s;
            *s = acc;
            acc += v;
        }
        acc
    };
    xs.par_chunks_mut(CHUNK)
        .zip(sums.par_iter())
        .for_each(|(chunk, &base)| {
            let mut acc = base;
            for x in chunk.iter_mut() {
                let v = *x;
                *x = acc;
                acc += v;
            }
        });
    total
}

/// Atomically lowers `cell` to `value` if `value` is smaller; returns true
/// if the stored value was lowered by this call.
#[inline]
pub fn write_min(cell: &AtomicU32, value: u32) -> bool {
    let mut cur = cell.load(Ordering::Relaxed);
    while value < cur {
        match cell.compare_exchange_weak(cur, value, Ordering::Release, Ordering::Relaxed) {
            Ok(_) => return true,
            Err(c) => cur = c,
        }
    }
    false
}

/// Atomically adds `inc` to an `f64` stored as bits in `cell`.
#[inline]
pub fn fetch_add_f64(cell: &AtomicU64, inc: f64) {
    let mut cur = cell.load(Ordering::Relaxed);
    loop {
        let new = f64::from_bits(cur) + inc;
        match cell.compare_exchange_weak(cur, new.to_bits(), Ordering::Release, Ordering::Relaxed)
        {
            Ok(_) => return,
            Err(c) => cur = c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_add_inplace() {
        let mut xs = vec![1_usize; 10];
        assert_eq!(scan_add_inplace(&mut xs), 10);
        assert_eq!(xs, (0..10).collect::<Vec<_>>());

        let mut xs: Vec<usize> = (0..200_000).map(|i| i % 7).collect();
        let expected_total: usize = xs.iter().sum();
        let seq: Vec<usize> = {
            let mut acc = 0;
            xs.iter()
                .map(|&v| {
                    let r = acc;
                    acc += v;
                    r
                })
                .collect()
        };
        assert_eq!(scan_add_inplace(&mut xs), expected_total);
        assert_eq!(xs, seq);
    }

    #[test]
    fn test_write_min() {
        let cell = AtomicU32::new(10);
        assert!(write_min(&cell, 5));
        assert!(!write_min(&cell, 7));
        assert_eq!(cell.load(Ordering::Relaxed), 5);
    }
}
