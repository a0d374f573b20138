/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bucketed weighted breadth-first search (single-source shortest paths
//! with nonnegative integer weights).
//!
//! Distances are peeled in priority order with a
//! [bucketing structure](frontgraph::buckets::Buckets): each round
//! extracts the bucket of settled vertices, relaxes their out-edges, and
//! moves the improved destinations to their new distance buckets. A
//! tentative distance carries its top bit while the vertex is freshly
//! improved in the current round; the bit is stripped when the vertex is
//! handed to the bucketing structure, and the stripped value of the *first*
//! improvement is threaded through the edge map as payload so the old
//! bucket of each moved vertex is known.
//!
//! Requires integer weights by construction; call sites with unweighted
//! graphs should use [`bfs`](crate::bfs::bfs) instead.

use dsi_progress_logger::prelude::*;
use frontgraph::buckets::{Buckets, Direction, Priority, DEFAULT_NUM_BUCKETS, INFINITE_PRIORITY};
use frontgraph::edge_map::{edge_map_data, EdgeMapDataF, Flags, Threshold};
use frontgraph::frontier::VertexSubset;
use frontgraph::traits::Graph;
use frontgraph::types::VertexId;
use frontgraph::utils::write_min;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU32, Ordering};

/// The unreached distance.
const INFINITE_DIST: u32 = i32::MAX as u32;
/// Marks a distance improved in the current round.
const TOP_BIT: u32 = 1 << 31;
const VAL_MASK: u32 = !TOP_BIT;

struct VisitF<'a> {
    dists: &'a [AtomicU32],
}

impl EdgeMapDataF<i32> for VisitF<'_> {
    /// The destination's distance before its first improvement this round.
    type Data = u32;

    fn update(&self, src: VertexId, dst: VertexId, w: i32) -> Option<u32> {
        debug_assert!(w >= 0, "negative weight on edge ({src}, {dst})");
        let oval = self.dists[dst as usize].load(Ordering::Relaxed);
        let dist = oval | TOP_BIT;
        let new_dist = (self.dists[src as usize].load(Ordering::Relaxed) | TOP_BIT) + w as u32;
        if new_dist < dist {
            self.dists[dst as usize].store(new_dist, Ordering::Relaxed);
            if oval & TOP_BIT == 0 {
                // first improvement this round
                return Some(oval);
            }
        }
        None
    }

    fn update_atomic(&self, src: VertexId, dst: VertexId, w: i32) -> Option<u32> {
        debug_assert!(w >= 0, "negative weight on edge ({src}, {dst})");
        let oval = self.dists[dst as usize].load(Ordering::Relaxed);
        let dist = oval | TOP_BIT;
        let new_dist = (self.dists[src as usize].load(Ordering::Relaxed) | TOP_BIT) + w as u32;
        if new_dist < dist {
            if oval & TOP_BIT == 0
                && self.dists[dst as usize]
                    .compare_exchange(oval, new_dist, Ordering::Release, Ordering::Relaxed)
                    .is_ok()
            {
                // first improvement this round
                return Some(oval);
            }
            write_min(&self.dists[dst as usize], new_dist);
        }
        None
    }
}

/// Distances and round statistics of a weighted visit.
pub struct WbfsResult {
    /// The distance of each vertex from the source; [`INFINITE_DIST`]
    /// (`i32::MAX`) for unreached vertices.
    pub dists: Box<[u32]>,
    pub rounds: usize,
}

impl WbfsResult {
    /// The largest finite distance.
    pub fn max_dist(&self) -> u32 {
        self.dists
            .iter()
            .copied()
            .filter(|&d| d != INFINITE_DIST)
            .max()
            .unwrap_or(0)
    }
}

#[inline(always)]
fn bucket_of(dist: u32) -> Priority {
    if dist == INFINITE_DIST {
        INFINITE_PRIORITY
    } else {
        dist
    }
}

/// Runs a bucketed weighted breadth-first visit from `src` over
/// nonnegative `i32` weights.
pub fn wbfs<G: Graph<i32>>(
    graph: &G,
    src: VertexId,
    num_buckets: usize,
    pool: &ThreadPool,
) -> WbfsResult {
    let n = graph.num_vertices();
    assert!((src as usize) < n, "source {src} out of range");
    let dists: Box<[AtomicU32]> = (0..n).map(|_| AtomicU32::new(INFINITE_DIST)).collect();
    dists[src as usize].store(0, Ordering::Relaxed);

    let mut pl = progress_logger![item_name = "bucket"];
    pl.start("Peeling distance buckets...");

    let mut buckets = Buckets::new(n, Direction::Increasing, num_buckets, |v| {
        bucket_of(dists[v as usize].load(Ordering::Relaxed) & VAL_MASK)
    });
    let visit = VisitF { dists: &dists };
    let flags = Flags::DENSE_FORWARD | Flags::NO_DENSE | Flags::SPARSE_BLOCKED;
    let mut rounds = 0;

    while let Some(bucket) =
        buckets.next_bucket(|v| bucket_of(dists[v as usize].load(Ordering::Relaxed) & VAL_MASK))
    {
        pl.update();
        let mut active = VertexSubset::from_vertices(n, bucket.ids);
        let improved = edge_map_data(graph, &mut active, &visit, Threshold::Auto, flags, pool);
        // Strip the fresh-visit bits and compute the destination bucket of
        // every improved vertex; the payload is its pre-round distance.
        let len = if improved.dense() { n } else { improved.size() };
        let updates: Vec<(VertexId, frontgraph::buckets::BucketDest)> = pool.install(|| {
            (0..len)
                .into_par_iter()
                .filter_map(|i| {
                    let (v, old_dist) = improved.entry(i)?;
                    let new_dist = dists[v as usize].load(Ordering::Relaxed) & VAL_MASK;
                    dists[v as usize].store(new_dist, Ordering::Relaxed);
                    buckets
                        .get_bucket(bucket_of(old_dist), bucket_of(new_dist))
                        .map(|dest| (v, dest))
                })
                .collect()
        });
        buckets.update_buckets(updates.len(), |i| Some(updates[i]));
        rounds += 1;
    }
    pl.done();

    WbfsResult {
        dists: dists.iter().map(|d| d.load(Ordering::Relaxed)).collect(),
        rounds,
    }
}

/// The default-parameter entry point.
pub fn wbfs_default<G: Graph<i32>>(graph: &G, src: VertexId, pool: &ThreadPool) -> WbfsResult {
    wbfs(graph, src, DEFAULT_NUM_BUCKETS, pool)
}
