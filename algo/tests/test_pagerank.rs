/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use frontgraph::graphs::CsrGraph;
use frontgraph::thread_pool;
use frontgraph::types::Empty;
use frontgraph_algo::pagerank::pagerank;

#[test]
fn test_stochastic_on_cycle() {
    // on a directed cycle the rank is uniform
    let n = 10u32;
    let arcs: Vec<(u32, u32, Empty)> = (0..n).map(|v| (v, (v + 1) % n, Empty)).collect();
    let g = CsrGraph::from_edges(n as usize, &arcs, false);
    let pool = thread_pool![4];
    let rank = pagerank(&g, 1E-9, 100, &pool);
    assert_eq!(rank.len(), n as usize);
    assert!((rank.iter().sum::<f64>() - 1.0).abs() < 1E-6);
    for &r in rank.iter() {
        assert!((r - 0.1).abs() < 1E-6);
    }
}

#[test]
fn test_hub_attracts_rank() {
    // 1, 2, 3 all point at 0; 0 points at 1
    let arcs = [
        (1, 0, Empty),
        (2, 0, Empty),
        (3, 0, Empty),
        (0, 1, Empty),
    ];
    let g = CsrGraph::from_edges(4, &arcs, false);
    let pool = thread_pool![2];
    let rank = pagerank(&g, 1E-9, 200, &pool);
    assert!(rank[0] > rank[1]);
    assert!(rank[1] > rank[2]);
    assert_eq!(rank[2], rank[3]);

    let rank_compressed = pagerank(&g.compress(), 1E-9, 200, &pool);
    for (a, b) in rank.iter().zip(rank_compressed.iter()) {
        assert!((a - b).abs() < 1E-9);
    }
}

#[test]
fn test_symmetric_matches_degree_distribution() {
    // on a connected symmetric graph the walk favors high-degree vertices
    let g = CsrGraph::<Empty>::from_undirected_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
    let pool = thread_pool![4];
    let rank = pagerank(&g, 1E-9, 200, &pool);
    assert!((rank.iter().sum::<f64>() - 1.0).abs() < 1E-6);
    assert!(rank[0] > rank[1]);
}
