/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! PageRank by edge-map power iteration.
//!
//! Each iteration pushes `rank(v)/outdegree(v)` over every edge with an
//! atomic floating-point accumulation (the frontier is the full vertex
//! set and produces no output), applies damping, and stops when the L1
//! distance between successive rank vectors falls below `eps` or after
//! `max_iters` iterations.
//!
//! Dangling vertices retain only the damping constant, so on graphs with
//! dangling vertices the vector sums to less than one.

use dsi_progress_logger::prelude::*;
use frontgraph::edge_map::{edge_map, EdgeMapF, Flags, Threshold};
use frontgraph::frontier::VertexSubsetData;
use frontgraph::traits::Graph;
use frontgraph::types::{EdgeWeight, VertexId};
use frontgraph::utils::fetch_add_f64;
use log::debug;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::{AtomicU64, Ordering};

const DAMPING: f64 = 0.85;

struct PrF<'a> {
    rank: &'a [AtomicU64],
    contribution: &'a [AtomicU64],
    degrees: &'a [u32],
}

impl<W: EdgeWeight> EdgeMapF<W> for PrF<'_> {
    #[inline(always)]
    fn update(&self, src: VertexId, dst: VertexId, _w: W) -> bool {
        let inc = f64::from_bits(self.rank[src as usize].load(Ordering::Relaxed))
            / self.degrees[src as usize] as f64;
        fetch_add_f64(&self.contribution[dst as usize], inc);
        true
    }

    #[inline(always)]
    fn update_atomic(&self, src: VertexId, dst: VertexId, w: W) -> bool {
        <Self as EdgeMapF<W>>::update(self, src, dst, w)
    }
}

/// Computes PageRank with damping 0.85; stops at L1 distance `eps` or
/// after `max_iters` iterations. Returns the rank vector.
pub fn pagerank<W: EdgeWeight, G: Graph<W>>(
    graph: &G,
    eps: f64,
    max_iters: usize,
    pool: &ThreadPool,
) -> Box<[f64]> {
    let n = graph.num_vertices();
    assert!(n > 0);
    let added_constant = (1.0 - DAMPING) / n as f64;
    let degrees: Box<[u32]> = (0..n as VertexId)
        .map(|v| graph.out_degree(v).max(1) as u32)
        .collect();
    let rank: Box<[AtomicU64]> = (0..n)
        .map(|_| AtomicU64::new((1.0 / n as f64).to_bits()))
        .collect();
    let contribution: Box<[AtomicU64]> = (0..n).map(|_| AtomicU64::new(0)).collect();

    let mut pl = progress_logger![item_name = "iteration"];
    pl.start("Iterating...");

    let mut frontier = VertexSubsetData::full(n);
    for iteration in 0..max_iters {
        pl.update();
        edge_map(
            graph,
            &mut frontier,
            &PrF {
                rank: &rank,
                contribution: &contribution,
                degrees: &degrees,
            },
            Threshold::Edges(0),
            Flags::DENSE_FORWARD | Flags::NO_OUTPUT,
            pool,
        );

        let l1_norm: f64 = pool.install(|| {
            (0..n)
                .into_par_iter()
                .map(|v| {
                    let next =
                        DAMPING * f64::from_bits(contribution[v].load(Ordering::Relaxed))
                            + added_constant;
                    let delta = (next - f64::from_bits(rank[v].load(Ordering::Relaxed))).abs();
                    rank[v].store(next.to_bits(), Ordering::Relaxed);
                    contribution[v].store(0, Ordering::Relaxed);
                    delta
                })
                .sum()
        });
        debug!("iteration {iteration}: L1 norm {l1_norm}");
        if l1_norm < eps {
            break;
        }
    }
    pl.done();

    rank.iter()
        .map(|r| f64::from_bits(r.load(Ordering::Relaxed)))
        .collect()
}
