/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Connectivity of symmetric graphs by parallel min-label propagation.
//!
//! Every vertex starts with its own id as label; each round the frontier
//! pushes labels along edges with an atomic write-min, and the vertices
//! whose label dropped form the next frontier. At the fixed point all
//! vertices of a component carry the smallest id of the component.

use dsi_progress_logger::prelude::*;
use frontgraph::edge_map::{edge_map, EdgeMapF, Flags, Threshold};
use frontgraph::frontier::VertexSubsetData;
use frontgraph::traits::Graph;
use frontgraph::types::{EdgeWeight, VertexId};
use frontgraph::utils::write_min;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU32, Ordering};

struct CcF<'a> {
    labels: &'a [AtomicU32],
}

impl<W: EdgeWeight> EdgeMapF<W> for CcF<'_> {
    #[inline(always)]
    fn update(&self, src: VertexId, dst: VertexId, _w: W) -> bool {
        let label = self.labels[src as usize].load(Ordering::Relaxed);
        if label < self.labels[dst as usize].load(Ordering::Relaxed) {
            self.labels[dst as usize].store(label, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    #[inline(always)]
    fn update_atomic(&self, src: VertexId, dst: VertexId, _w: W) -> bool {
        let label = self.labels[src as usize].load(Ordering::Relaxed);
        write_min(&self.labels[dst as usize], label)
    }
}

/// Computes the component labels of a symmetric graph: every vertex is
/// labeled with the smallest vertex id of its component.
pub fn cc<W: EdgeWeight, G: Graph<W>>(graph: &G, pool: &ThreadPool) -> Box<[VertexId]> {
    assert!(graph.is_symmetric(), "connectivity requires a symmetric graph");
    let n = graph.num_vertices();
    let labels: Box<[AtomicU32]> = (0..n as VertexId).map(AtomicU32::new).collect();

    let mut pl = progress_logger![item_name = "round"];
    pl.start("Propagating labels...");

    let mut frontier = VertexSubsetData::full(n);
    while !frontier.is_empty() {
        pl.update();
        frontier = edge_map(
            graph,
            &mut frontier,
            &CcF { labels: &labels },
            Threshold::Auto,
            Flags::DENSE_FORWARD,
            pool,
        );
    }
    pl.done();

    labels.iter().map(|l| l.load(Ordering::Relaxed)).collect()
}

/// The number of distinct components in a labeling.
pub fn num_components(labels: &[VertexId]) -> usize {
    let mut sorted: Vec<VertexId> = labels.to_vec();
    sorted.par_sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// The size of the largest component in a labeling.
pub fn largest_component(labels: &[VertexId]) -> usize {
    let mut counts = vec![0usize; labels.len()];
    for &label in labels {
        counts[label as usize] += 1;
    }
    counts.into_iter().max().unwrap_or(0)
}
