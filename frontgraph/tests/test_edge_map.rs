/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use frontgraph::edge_map::{edge_map, edge_map_pack, EdgeMapF, Flags, Threshold};
use frontgraph::frontier::VertexSubset;
use frontgraph::graphs::{CompressedGraph, CsrGraph};
use frontgraph::thread_pool;
use frontgraph::traits::Graph;
use frontgraph::types::{EdgeWeight, Empty, VertexId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::Ordering;
use sux::bits::AtomicBitVec;

/// Claims each unvisited destination exactly once.
struct MarkF {
    visited: AtomicBitVec,
}

impl MarkF {
    fn new(n: usize) -> Self {
        MarkF {
            visited: AtomicBitVec::new(n),
        }
    }
}

impl<W: EdgeWeight> EdgeMapF<W> for MarkF {
    fn update(&self, _src: VertexId, dst: VertexId, _w: W) -> bool {
        if self.visited.get(dst as usize, Ordering::Relaxed) {
            false
        } else {
            self.visited.set(dst as usize, true, Ordering::Relaxed);
            true
        }
    }

    fn update_atomic(&self, _src: VertexId, dst: VertexId, _w: W) -> bool {
        !self.visited.swap(dst as usize, true, Ordering::Relaxed)
    }

    fn cond(&self, dst: VertexId) -> bool {
        !self.visited.get(dst as usize, Ordering::Relaxed)
    }
}

fn random_symmetric_edges(rng: &mut SmallRng, n: u32, edges: usize) -> Vec<(VertexId, VertexId)> {
    let mut set = std::collections::BTreeSet::new();
    while set.len() < edges {
        let u = rng.random_range(0..n);
        let v = rng.random_range(0..n);
        if u != v {
            set.insert((u.min(v), u.max(v)));
        }
    }
    set.into_iter().collect()
}

fn accepted_with<W: EdgeWeight, G: Graph<W>>(
    graph: &G,
    frontier_vertices: &[VertexId],
    threshold: Threshold,
    flags: Flags,
) -> Vec<VertexId> {
    let pool = thread_pool![4];
    let n = graph.num_vertices();
    let f = MarkF::new(n);
    for &v in frontier_vertices {
        f.visited.set(v as usize, true, Ordering::Relaxed);
    }
    let mut frontier = VertexSubset::from_vertices(n, frontier_vertices.to_vec());
    let mut output = edge_map(graph, &mut frontier, &f, threshold, flags, &pool);
    output.vertices()
}

/// The same frontier expanded under every scheduling mode accepts the same
/// destination set.
#[test]
fn test_mode_equivalence() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = SmallRng::seed_from_u64(7);
    let edges = random_symmetric_edges(&mut rng, 300, 900);
    let csr = CsrGraph::<Empty>::from_undirected_edges(300, &edges);
    let compressed = csr.compress();

    let frontier: Vec<VertexId> = (0..300).filter(|_| rng.random_bool(0.2)).collect();
    let reference = accepted_with(&csr, &frontier, Threshold::AlwaysSparse, Flags::empty());
    assert!(!reference.is_empty());

    let modes = [
        (Threshold::AlwaysSparse, Flags::SPARSE_BLOCKED),
        (Threshold::AlwaysSparse, Flags::NO_DEDUP),
        (Threshold::Edges(0), Flags::empty()),
        (Threshold::Edges(0), Flags::DENSE_PARALLEL),
        (Threshold::Edges(0), Flags::DENSE_FORWARD),
        (Threshold::Auto, Flags::empty()),
    ];
    for (threshold, flags) in modes {
        assert_eq!(
            accepted_with(&csr, &frontier, threshold, flags),
            reference,
            "csr mode {flags:?} / {threshold:?}"
        );
        assert_eq!(
            accepted_with(&compressed, &frontier, threshold, flags),
            reference,
            "compressed mode {flags:?} / {threshold:?}"
        );
    }
}

#[test]
fn test_high_degree_blocked() {
    // a hub of degree > PARALLEL_DEGREE exercises the block scheduler
    let edges: Vec<(VertexId, VertexId)> = (1..2600).map(|v| (0, v)).collect();
    let csr = CsrGraph::<Empty>::from_undirected_edges(2600, &edges);
    let compressed = csr.compress();
    let accepted = accepted_with(&csr, &[0], Threshold::AlwaysSparse, Flags::SPARSE_BLOCKED);
    assert_eq!(accepted, (1..2600).collect::<Vec<_>>());
    let accepted = accepted_with(
        &compressed,
        &[0],
        Threshold::AlwaysSparse,
        Flags::SPARSE_BLOCKED,
    );
    assert_eq!(accepted, (1..2600).collect::<Vec<_>>());
}

#[test]
fn test_no_output() {
    let csr = CsrGraph::<Empty>::from_undirected_edges(4, &[(0, 1), (1, 2)]);
    let pool = thread_pool![2];
    let f = MarkF::new(4);
    let mut frontier = VertexSubset::singleton(4, 1);
    let output = edge_map(
        &csr,
        &mut frontier,
        &f,
        Threshold::AlwaysSparse,
        Flags::NO_OUTPUT,
        &pool,
    );
    assert!(output.is_empty());
    // the updates still ran
    assert!(f.visited.get(0, Ordering::Relaxed));
    assert!(f.visited.get(2, Ordering::Relaxed));
}

#[test]
fn test_empty_frontier() {
    let csr = CsrGraph::<Empty>::from_undirected_edges(4, &[(0, 1)]);
    let pool = thread_pool![2];
    let f = MarkF::new(4);
    let mut frontier = VertexSubset::from_vertices(4, vec![]);
    let output = edge_map(
        &csr,
        &mut frontier,
        &f,
        Threshold::Auto,
        Flags::empty(),
        &pool,
    );
    assert!(output.is_empty());
}

#[test]
fn test_edge_map_pack() {
    let mut rng = SmallRng::seed_from_u64(11);
    let edges = random_symmetric_edges(&mut rng, 100, 400);
    let mut graph = CsrGraph::<Empty>::from_undirected_edges(100, &edges);
    let pool = thread_pool![4];
    let before: Vec<usize> = (0..100).map(|v| graph.out_degree(v)).collect();
    let mut frontier = VertexSubset::from_vertices(100, (0..50).collect());
    let packed = edge_map_pack(
        &mut graph,
        &mut frontier,
        |_, dst, _| dst % 3 != 0,
        false,
        &pool,
    );
    assert_eq!(packed.size(), 50);
    for i in 0..packed.size() {
        let (v, new_degree) = packed.entry(i).unwrap();
        assert_eq!(new_degree as usize, graph.out_degree(v));
        graph.map_out_nghs(v, |_, dst, _| {
            assert!(dst % 3 != 0);
            true
        });
    }
    // untouched vertices keep their degree
    for v in 50..100 {
        assert_eq!(graph.out_degree(v), before[v as usize]);
    }
    // the count invariant survives packing
    for v in 0..100 {
        assert_eq!(graph.count_out_nghs(v, |_, _, _| true), graph.out_degree(v));
    }
}

#[test]
fn test_edge_map_pack_compressed() {
    let edges: Vec<(VertexId, VertexId)> = (1..2500).map(|v| (0, v)).collect();
    let mut graph = CsrGraph::<Empty>::from_undirected_edges(2500, &edges).compress();
    let pool = thread_pool![4];
    let mut frontier = VertexSubset::singleton(2500, 0);
    let packed = edge_map_pack(
        &mut graph,
        &mut frontier,
        |_, dst, _| dst % 2 == 1,
        false,
        &pool,
    );
    assert_eq!(packed.entry(0), Some((0, 1250)));
    assert_eq!(graph.out_degree(0), 1250);
    let mut nghs = Vec::new();
    graph.map_out_nghs(0, |_, dst, _| {
        nghs.push(dst);
        true
    });
    assert_eq!(nghs, (0..1250).map(|i| 2 * i + 1).collect::<Vec<_>>());
}
