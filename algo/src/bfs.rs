/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel breadth-first search.
//!
//! Each round expands the frontier through an update function that claims
//! unvisited destinations with a compare-and-swap on the parent array, so
//! every reached vertex records the frontier vertex that discovered it.
//!
//! # Examples
//!
//! ```
//! use frontgraph::prelude::*;
//! use frontgraph_algo::bfs::bfs;
//!
//! let g = CsrGraph::<Empty>::from_undirected_edges(4, &[(0, 1), (1, 2), (2, 3)]);
//! let result = bfs(&g, 0, &thread_pool![]);
//! assert_eq!(&*result.parents, &[0, 0, 1, 2]);
//! assert_eq!(result.reachable(), 4);
//! ```

use dsi_progress_logger::prelude::*;
use frontgraph::edge_map::{edge_map, EdgeMapF, Flags, Threshold};
use frontgraph::frontier::VertexSubset;
use frontgraph::traits::Graph;
use frontgraph::types::{EdgeWeight, VertexId, UNDEFINED};
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU32, Ordering};

pub(crate) struct BfsF<'a> {
    pub(crate) parents: &'a [AtomicU32],
}

impl<W: EdgeWeight> EdgeMapF<W> for BfsF<'_> {
    #[inline(always)]
    fn update(&self, src: VertexId, dst: VertexId, _w: W) -> bool {
        if self.parents[dst as usize].load(Ordering::Relaxed) == UNDEFINED {
            self.parents[dst as usize].store(src, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn update_atomic(&self, src: VertexId, dst: VertexId, _w: W) -> bool {
        self.parents[dst as usize]
            .compare_exchange(UNDEFINED, src, Ordering::Release, Ordering::Relaxed)
            .is_ok()
    }

    #[inline(always)]
    fn cond(&self, dst: VertexId) -> bool {
        self.parents[dst as usize].load(Ordering::Relaxed) == UNDEFINED
    }
}

/// The parent array and per-round frontier sizes of a visit.
pub struct BfsResult {
    /// The parent of each reached vertex in the BFS tree (the source is
    /// its own parent); [`UNDEFINED`] for unreached vertices.
    pub parents: Box<[VertexId]>,
    pub frontier_sizes: Vec<usize>,
}

impl BfsResult {
    /// The number of vertices reached, source included.
    pub fn reachable(&self) -> usize {
        self.parents.iter().filter(|&&p| p != UNDEFINED).count()
    }
}

/// Runs a breadth-first visit from `src`.
pub fn bfs<W: EdgeWeight, G: Graph<W>>(graph: &G, src: VertexId, pool: &ThreadPool) -> BfsResult {
    let n = graph.num_vertices();
    assert!((src as usize) < n, "source {src} out of range");
    let parents: Box<[AtomicU32]> = (0..n).map(|_| AtomicU32::new(UNDEFINED)).collect();
    parents[src as usize].store(src, Ordering::Relaxed);

    let mut pl = progress_logger![item_name = "vertex", expected_updates = Some(n)];
    pl.start("Visiting graph...");

    let mut frontier = VertexSubset::singleton(n, src);
    let mut frontier_sizes = Vec::new();
    while !frontier.is_empty() {
        frontier_sizes.push(frontier.size());
        pl.update_with_count(frontier.size());
        frontier = edge_map(
            graph,
            &mut frontier,
            &BfsF { parents: &parents },
            Threshold::Auto,
            Flags::SPARSE_BLOCKED | Flags::DENSE_PARALLEL | Flags::NO_DEDUP,
            pool,
        );
    }
    pl.done();

    BfsResult {
        parents: parents.iter().map(|p| p.load(Ordering::Relaxed)).collect(),
        frontier_sizes,
    }
}
