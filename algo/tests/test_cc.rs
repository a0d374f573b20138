/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use frontgraph::graphs::CsrGraph;
use frontgraph::thread_pool;
use frontgraph::types::Empty;
use frontgraph_algo::cc::{cc, largest_component, num_components};

#[test]
fn test_two_cliques() {
    // two disjoint triangles
    let g = CsrGraph::<Empty>::from_undirected_edges(
        6,
        &[(0, 1), (0, 2), (1, 2), (3, 4), (3, 5), (4, 5)],
    );
    let pool = thread_pool![4];

    let labels = cc(&g, &pool);
    assert_eq!(&*labels, &[0, 0, 0, 3, 3, 3]);
    assert_eq!(num_components(&labels), 2);
    assert_eq!(largest_component(&labels), 3);

    let labels = cc(&g.compress(), &pool);
    assert_eq!(&*labels, &[0, 0, 0, 3, 3, 3]);
}

#[test]
fn test_isolated_vertices() {
    let g = CsrGraph::<Empty>::from_undirected_edges(5, &[(1, 3)]);
    let pool = thread_pool![2];
    let labels = cc(&g, &pool);
    assert_eq!(&*labels, &[0, 1, 2, 1, 4]);
    assert_eq!(num_components(&labels), 4);
    assert_eq!(largest_component(&labels), 2);
}

/// Against a sequential union-find reference on a random graph.
#[test]
fn test_random_components() {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    let mut rng = SmallRng::seed_from_u64(23);
    let n = 400u32;
    // sparse enough to leave several components
    let edges: Vec<(u32, u32)> = (0..300)
        .map(|_| {
            let u = rng.random_range(0..n);
            let v = rng.random_range(0..n);
            (u.min(v), u.max(v))
        })
        .filter(|&(u, v)| u != v)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    let g = CsrGraph::<Empty>::from_undirected_edges(n as usize, &edges);
    let pool = thread_pool![4];
    let labels = cc(&g, &pool);

    // union-find reference
    let mut root: Vec<u32> = (0..n).collect();
    fn find(root: &mut [u32], v: u32) -> u32 {
        let mut v = v;
        while root[v as usize] != v {
            root[v as usize] = root[root[v as usize] as usize];
            v = root[v as usize];
        }
        v
    }
    for &(u, v) in &edges {
        let (ru, rv) = (find(&mut root, u), find(&mut root, v));
        root[ru as usize] = rv;
    }

    // same partition: equal labels iff same union-find root
    for u in 0..n {
        for v in u + 1..n.min(u + 50) {
            let same_label = labels[u as usize] == labels[v as usize];
            let same_root = find(&mut root, u) == find(&mut root, v);
            assert_eq!(same_label, same_root, "vertices {u}, {v}");
        }
    }
    // labels are the component minima
    for v in 0..n {
        assert!(labels[v as usize] <= v);
    }
}
