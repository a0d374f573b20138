/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Priority-layered identifier sets for iterative peeling.
//!
//! A [`Buckets`] structure distributes identifiers in `[0..n)` over
//! priority layers and extracts the layers in priority order. A window of
//! [`num_open`](Buckets::num_open) *open* buckets covers the next
//! priorities; identifiers whose priority falls beyond the window wait in
//! an *overflow* bucket, which is re-partitioned into a fresh window
//! whenever the current one is exhausted (amortized `O(n/num_open)` per
//! slide).
//!
//! The structure does not store priorities: the caller owns them and
//! passes an accessor to the methods that need current values. Entries are
//! deleted lazily: moving an identifier just inserts it into its new
//! bucket, and stale copies are filtered against the accessor on
//! extraction. The priority [`INFINITE_PRIORITY`] places an identifier
//! outside all buckets; it is never extracted.
//!
//! Priorities must evolve in the configured [`Direction`]: with
//! [`Increasing`](Direction::Increasing) extraction, an identifier's
//! priority may never drop below the layer currently being extracted
//! (symmetrically for [`Decreasing`](Direction::Decreasing)). Feeding
//! priorities of the opposite polarity is a contract violation with
//! unspecified results.

use crate::types::VertexId;
use rayon::prelude::*;

/// The priority of an identifier. [`INFINITE_PRIORITY`] is reserved.
pub type Priority = u32;

/// The priority placing an identifier outside all buckets.
pub const INFINITE_PRIORITY: Priority = Priority::MAX;

/// The default number of open buckets.
pub const DEFAULT_NUM_BUCKETS: usize = 128;

/// Extraction order over priorities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// The destination of a moving identifier, as computed by
/// [`Buckets::get_bucket`]: an open bucket of the current window, or the
/// overflow bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BucketDest {
    Open(u32),
    Overflow,
}

/// A non-empty priority layer extracted by [`Buckets::next_bucket`].
pub struct Bucket {
    /// The priority shared by all extracted identifiers.
    pub priority: Priority,
    pub ids: Vec<VertexId>,
}

pub struct Buckets {
    n: usize,
    num_open: usize,
    direction: Direction,
    /// Key of the first priority of the window (keys are priorities,
    /// complemented for decreasing extraction). Kept 64-bit so the window
    /// end never wraps.
    base: u64,
    /// Next window slot to extract.
    cur: usize,
    open: Vec<Vec<VertexId>>,
    overflow: Vec<VertexId>,
}

impl Buckets {
    /// Creates a bucketing over identifiers `[0..n)` seeded with the
    /// priorities returned by `priority`.
    pub fn new(
        n: usize,
        direction: Direction,
        num_buckets: usize,
        priority: impl Fn(VertexId) -> Priority + Sync,
    ) -> Self {
        assert!(num_buckets >= 1);
        let mut buckets = Buckets {
            n,
            num_open: num_buckets,
            direction,
            base: 0,
            cur: 0,
            open: (0..num_buckets).map(|_| Vec::new()).collect(),
            overflow: Vec::new(),
        };

        const CHUNK: usize = 1 << 14;
        let shards: Vec<(Vec<Vec<VertexId>>, Vec<VertexId>)> = (0..n.div_ceil(CHUNK))
            .into_par_iter()
            .map(|chunk| {
                let mut open = vec![Vec::new(); num_buckets];
                let mut overflow = Vec::new();
                for id in (chunk * CHUNK) as VertexId..((chunk + 1) * CHUNK).min(n) as VertexId {
                    match buckets.key(priority(id)) {
                        None => {}
                        Some(key) if key < num_buckets as u64 => open[key as usize].push(id),
                        Some(_) => overflow.push(id),
                    }
                }
                (open, overflow)
            })
            .collect();
        for (open, overflow) in shards {
            for (dst, src) in buckets.open.iter_mut().zip(open) {
                dst.extend(src);
            }
            buckets.overflow.extend(overflow);
        }
        buckets
    }

    /// The number of open buckets of the sliding window.
    pub fn num_open(&self) -> usize {
        self.num_open
    }

    /// Maps a priority into key space (monotone in extraction order); None
    /// for the infinite priority.
    #[inline(always)]
    fn key(&self, priority: Priority) -> Option<u64> {
        if priority == INFINITE_PRIORITY {
            return None;
        }
        Some(match self.direction {
            Direction::Increasing => priority as u64,
            Direction::Decreasing => (Priority::MAX - 1 - priority) as u64,
        })
    }

    /// The inverse of [`key`](Self::key).
    #[inline(always)]
    fn priority_of(&self, key: u64) -> Priority {
        match self.direction {
            Direction::Increasing => key as Priority,
            Direction::Decreasing => Priority::MAX - 1 - key as Priority,
        }
    }

    /// Computes the destination of an identifier whose priority changes
    /// from `prev` to `new`, or None if no move is needed.
    pub fn get_bucket(&self, prev: Priority, new: Priority) -> Option<BucketDest> {
        let new_dest = self.dest_of(new)?;
        match self.dest_of(prev) {
            Some(prev_dest) if prev_dest == new_dest => None,
            _ => Some(new_dest),
        }
    }

    #[inline]
    fn dest_of(&self, priority: Priority) -> Option<BucketDest> {
        let key = self.key(priority)?;
        if key < self.base {
            // settled layers need no reinsertion
            return None;
        }
        let slot = key - self.base;
        Some(if slot < self.num_open as u64 {
            BucketDest::Open(slot as u32)
        } else {
            BucketDest::Overflow
        })
    }

    /// Accepts `len` indexed updates: `f(i)` returns the identifier and
    /// the [destination](Buckets::get_bucket) of the `i`-th update, or
    /// None for updates that move nothing. Evaluation is parallel,
    /// insertion sequential.
    pub fn update_buckets(
        &mut self,
        len: usize,
        f: impl Fn(usize) -> Option<(VertexId, BucketDest)> + Sync,
    ) {
        let moved: Vec<(VertexId, BucketDest)> =
            (0..len).into_par_iter().filter_map(&f).collect();
        for (id, dest) in moved {
            match dest {
                BucketDest::Open(slot) => {
                    debug_assert!(
                        (slot as usize) >= self.cur,
                        "identifier {id} moved into an already-extracted layer"
                    );
                    self.open[slot as usize].push(id);
                }
                BucketDest::Overflow => self.overflow.push(id),
            }
        }
    }

    /// Extracts the next non-empty priority layer, or None once every
    /// finite-priority identifier has been extracted.
    ///
    /// `priority` must report current priorities; stale bucket entries are
    /// filtered against it.
    pub fn next_bucket(
        &mut self,
        priority: impl Fn(VertexId) -> Priority + Sync,
    ) -> Option<Bucket> {
        loop {
            while self.cur < self.num_open {
                let slot = self.cur;
                if !self.open[slot].is_empty() {
                    let layer_key = self.base + slot as u64;
                    let candidates = std::mem::take(&mut self.open[slot]);
                    let ids: Vec<VertexId> = candidates
                        .into_iter()
                        .filter(|&id| self.key(priority(id)) == Some(layer_key))
                        .collect();
                    if !ids.is_empty() {
                        self.cur = slot + 1;
                        return Some(Bucket {
                            priority: self.priority_of(layer_key),
                            ids,
                        });
                    }
                }
                self.cur += 1;
            }

            // Window exhausted: re-partition the overflow into the window
            // containing the smallest live key.
            let live: Vec<(VertexId, u64)> = std::mem::take(&mut self.overflow)
                .into_par_iter()
                .filter_map(|id| {
                    let key = self.key(priority(id))?;
                    // keys below the window end were extracted via an open
                    // bucket; their overflow copies are stale
                    (key >= self.base + self.num_open as u64).then_some((id, key))
                })
                .collect();
            let min_key = live.iter().map(|&(_, key)| key).min()?;
            self.base = min_key / self.num_open as u64 * self.num_open as u64;
            self.cur = (min_key - self.base) as usize;
            let window_end = self.base + self.num_open as u64;
            for (id, key) in live {
                if key < window_end {
                    self.open[(key - self.base) as usize].push(id);
                } else {
                    self.overflow.push(id);
                }
            }
        }
    }
}
