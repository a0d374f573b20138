/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Spanning forest of a symmetric graph.
//!
//! Components are claimed one root at a time by a parallel breadth-first
//! visit; every vertex reached from a root contributes the edge to the
//! frontier vertex that claimed it. The result is one tree per component,
//! `n - #components` edges in total.

use crate::bfs::BfsF;
use dsi_progress_logger::prelude::*;
use frontgraph::edge_map::{edge_map, Flags, Threshold};
use frontgraph::frontier::VertexSubset;
use frontgraph::traits::Graph;
use frontgraph::types::{EdgeWeight, VertexId, UNDEFINED};
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU32, Ordering};

/// Computes a spanning forest as `(parent, child)` edge pairs.
pub fn spanning_forest<W: EdgeWeight, G: Graph<W>>(
    graph: &G,
    pool: &ThreadPool,
) -> Vec<(VertexId, VertexId)> {
    assert!(
        graph.is_symmetric(),
        "spanning forest requires a symmetric graph"
    );
    let n = graph.num_vertices();
    let parents: Box<[AtomicU32]> = (0..n).map(|_| AtomicU32::new(UNDEFINED)).collect();

    let mut pl = progress_logger![item_name = "vertex", expected_updates = Some(n)];
    pl.start("Claiming components...");

    for root in 0..n as VertexId {
        if parents[root as usize].load(Ordering::Relaxed) != UNDEFINED {
            continue;
        }
        parents[root as usize].store(root, Ordering::Relaxed);
        let mut frontier = VertexSubset::singleton(n, root);
        while !frontier.is_empty() {
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
    }
    pl.done();

    (0..n as VertexId)
        .filter_map(|v| {
            let parent = parents[v as usize].load(Ordering::Relaxed);
            (parent != v).then_some((parent, v))
        })
        .collect()
}
