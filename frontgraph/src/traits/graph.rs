/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::types::{EdgeWeight, VertexId};
use rayon::prelude::*;

/// An immutable graph over vertices `[0..num_vertices())` with per-vertex
/// neighbor access, implemented both by
/// [`CompressedGraph`](crate::graphs::CompressedGraph) and
/// [`CsrGraph`](crate::graphs::CsrGraph).
///
/// Neighbor access is callback-driven: the `map_*` methods invoke a
/// function on `(vertex, neighbor, weight)` triples, sequentially with
/// early exit (the callback returns false to stop) or block-parallel.
/// Symmetric graphs serve in-neighbor queries from the out-neighbor lists;
/// asymmetric graphs carry an independent in-neighbor representation.
///
/// The only mutation allowed after construction is packing, which filters
/// a vertex's out-neighbor list in place. For any vertex `v`,
/// `count_out_nghs(v, |..| true) == out_degree(v)` holds before and after
/// packing.
pub trait Graph<W: EdgeWeight>: Send + Sync + Sized {
    fn num_vertices(&self) -> usize;

    /// The number of directed edges the graph was built with. Not updated
    /// by packing; sum [`out_degree`](Graph::out_degree) for the live
    /// count.
    fn num_edges(&self) -> usize;

    fn is_symmetric(&self) -> bool;

    fn out_degree(&self, v: VertexId) -> usize;

    fn in_degree(&self, v: VertexId) -> usize;

    /// Sequentially invokes `f(v, ngh, weight)` on the out-neighbors of
    /// `v`; stops when `f` returns false.
    fn map_out_nghs<F: FnMut(VertexId, VertexId, W) -> bool>(&self, v: VertexId, f: F);

    /// Sequentially invokes `f(v, ngh, weight)` on the in-neighbors of
    /// `v`; stops when `f` returns false.
    fn map_in_nghs<F: FnMut(VertexId, VertexId, W) -> bool>(&self, v: VertexId, f: F);

    /// Like [`map_out_nghs`](Graph::map_out_nghs), but blocks are scanned
    /// in parallel; returning false only short-circuits a block.
    fn map_out_nghs_par<F: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, v: VertexId, f: F);

    /// Like [`map_in_nghs`](Graph::map_in_nghs), but blocks are scanned in
    /// parallel; returning false only short-circuits a block.
    fn map_in_nghs_par<F: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, v: VertexId, f: F);

    /// Random access to the `i`-th out-neighbor of `v`.
    fn get_out_ngh(&self, v: VertexId, i: usize) -> (VertexId, W);

    /// The number of decodable blocks of `v`'s out-neighbor list.
    fn num_out_blocks(&self, v: VertexId) -> usize;

    /// Invokes `f(v, ngh, weight)` on the edges of block `block` of `v`'s
    /// out-neighbor list.
    fn map_out_block<F: FnMut(VertexId, VertexId, W)>(&self, v: VertexId, block: usize, f: F);

    /// Folds `map(v, ngh, weight)` over the out-neighbors of `v` with an
    /// associative `reduce`, in parallel across blocks where profitable.
    fn reduce_out_nghs<T, M, R>(&self, v: VertexId, map: M, identity: T, reduce: R) -> T
    where
        T: Clone + Send + Sync,
        M: Fn(VertexId, VertexId, W) -> T + Sync,
        R: Fn(T, T) -> T + Send + Sync;

    /// Counts the out-neighbors of `v` satisfying `pred`.
    fn count_out_nghs<P: Fn(VertexId, VertexId, W) -> bool + Sync>(
        &self,
        v: VertexId,
        pred: P,
    ) -> usize {
        self.reduce_out_nghs(v, |s, d, w| pred(s, d, w) as usize, 0, |a, b| a + b)
    }

    /// In-place filter of `v`'s out-neighbor list; returns the surviving
    /// degree.
    fn pack_out_nghs<P: Fn(VertexId, VertexId, W) -> bool>(&mut self, v: VertexId, pred: P)
        -> usize;

    /// Packs the out-neighbor lists of all `targets` in parallel; `targets`
    /// must be duplicate-free. Returns the surviving degrees, aligned with
    /// `targets`.
    fn pack_out_nghs_many<P: Fn(VertexId, VertexId, W) -> bool + Sync + Send>(
        &mut self,
        targets: &[VertexId],
        pred: P,
    ) -> Box<[u32]>;

    /// Invokes `f(u, v, weight)` on every directed edge, in parallel across
    /// source vertices.
    fn map_edges<F: Fn(VertexId, VertexId, W) + Sync>(&self, f: F) {
        (0..self.num_vertices() as VertexId)
            .into_par_iter()
            .for_each(|v| {
                self.map_out_nghs(v, |s, d, w| {
                    f(s, d, w);
                    true
                });
            });
    }

    /// Builds a new graph containing only the edges satisfying
    /// `pred(u, v, weight)`. The result is asymmetric in general (e.g., a
    /// low-to-high-rank orientation).
    fn filter<P: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, pred: P) -> Self;
}
