/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{arcs_to_adjacencies, debug_assert_sorted, SendPtr};
use crate::codecs::byte_pd::PARALLEL_DEGREE;
use crate::traits::Graph;
use crate::types::{EdgeWeight, VertexId};
use rayon::prelude::*;
use sync_cell_slice::SyncSlice;

struct CsrLists<W> {
    degrees: Box<[u32]>,
    offsets: Box<[u64]>,
    nghs: Box<[VertexId]>,
    wghs: Box<[W]>,
}

impl<W: EdgeWeight> CsrLists<W> {
    fn build(adj: &[Vec<(VertexId, W)>]) -> Self {
        let n = adj.len();
        let degrees: Box<[u32]> = adj.iter().map(|l| l.len() as u32).collect();
        let mut offsets = Vec::with_capacity(n + 1);
        let mut acc = 0u64;
        for list in adj {
            offsets.push(acc);
            acc += list.len() as u64;
        }
        offsets.push(acc);
        let mut nghs = Vec::with_capacity(acc as usize);
        let mut wghs = Vec::with_capacity(acc as usize);
        for list in adj {
            for &(v, w) in list {
                nghs.push(v);
                wghs.push(w);
            }
        }
        CsrLists {
            degrees,
            offsets: offsets.into_boxed_slice(),
            nghs: nghs.into_boxed_slice(),
            wghs: wghs.into_boxed_slice(),
        }
    }

    #[inline(always)]
    fn degree(&self, v: VertexId) -> usize {
        self.degrees[v as usize] as usize
    }

    /// The live slice of `v`'s neighbor list (shrinks under packing).
    #[inline(always)]
    fn slices(&self, v: VertexId) -> (&[VertexId], &[W]) {
        let start = self.offsets[v as usize] as usize;
        let end = start + self.degree(v);
        (&self.nghs[start..end], &self.wghs[start..end])
    }
}

/// An immutable uncompressed CSR graph: one neighbor array, one weight
/// array, per-vertex degrees and edge offsets.
///
/// Packing compacts a vertex's live neighbors to the front of its range and
/// lowers its degree; the slack is never reclaimed.
pub struct CsrGraph<W: EdgeWeight = crate::types::Empty> {
    n: usize,
    m: usize,
    out: CsrLists<W>,
    in_: Option<CsrLists<W>>,
}

impl<W: EdgeWeight> CsrGraph<W> {
    /// Builds a graph from per-vertex sorted adjacency lists; pass
    /// `in_adj` for an asymmetric graph, `None` for a symmetric one.
    pub fn from_adjacencies(
        out_adj: Vec<Vec<(VertexId, W)>>,
        in_adj: Option<Vec<Vec<(VertexId, W)>>>,
    ) -> Self {
        debug_assert_sorted(&out_adj);
        let n = out_adj.len();
        let m = out_adj.iter().map(Vec::len).sum();
        let out = CsrLists::build(&out_adj);
        let in_ = in_adj.map(|adj| {
            assert_eq!(adj.len(), n);
            debug_assert_sorted(&adj);
            CsrLists::build(&adj)
        });
        CsrGraph { n, m, out, in_ }
    }

    /// Builds a graph from directed arcs. With `symmetric` the arc list
    /// must already contain both directions of every edge; otherwise an
    /// independent in-neighbor side is derived from the reversed arcs.
    pub fn from_edges(n: usize, arcs: &[(VertexId, VertexId, W)], symmetric: bool) -> Self {
        let out_adj = arcs_to_adjacencies(n, arcs);
        let in_adj = (!symmetric).then(|| {
            let reversed: Vec<_> = arcs.iter().map(|&(u, v, w)| (v, u, w)).collect();
            arcs_to_adjacencies(n, &reversed)
        });
        Self::from_adjacencies(out_adj, in_adj)
    }

    /// Builds a symmetric graph from undirected edges, mirroring each.
    pub fn from_undirected_edges(n: usize, edges: &[(VertexId, VertexId)]) -> Self
    where
        W: Default,
    {
        let mut arcs = Vec::with_capacity(edges.len() * 2);
        for &(u, v) in edges {
            arcs.push((u, v, W::default()));
            arcs.push((v, u, W::default()));
        }
        Self::from_edges(n, &arcs, true)
    }

    /// Builds a graph directly from CSR arrays (`offsets` holds the `n + 1`
    /// degree prefix sums).
    pub fn from_csr(
        offsets: Vec<u64>,
        nghs: Vec<VertexId>,
        wghs: Vec<W>,
        symmetric: bool,
    ) -> Self {
        let n = offsets.len() - 1;
        let m = nghs.len();
        assert_eq!(offsets[n] as usize, m);
        assert_eq!(wghs.len(), m);
        let degrees: Box<[u32]> = offsets.windows(2).map(|p| (p[1] - p[0]) as u32).collect();
        let out = CsrLists {
            degrees,
            offsets: offsets.into_boxed_slice(),
            nghs: nghs.into_boxed_slice(),
            wghs: wghs.into_boxed_slice(),
        };
        let mut g = CsrGraph {
            n,
            m,
            out,
            in_: None,
        };
        if !symmetric {
            let reversed: Vec<_> = (0..n as VertexId)
                .flat_map(|v| {
                    let (nghs, wghs) = g.out.slices(v);
                    nghs.iter()
                        .zip(wghs)
                        .map(move |(&d, &w)| (d, v, w))
                        .collect::<Vec<_>>()
                })
                .collect();
            let in_adj = arcs_to_adjacencies(n, &reversed);
            g.in_ = Some(CsrLists::build(&in_adj));
        }
        g
    }

    /// Re-encodes the graph with the byte codec.
    pub fn compress(&self) -> super::CompressedGraph<W> {
        let extract = |lists: &CsrLists<W>| {
            (0..self.n as VertexId)
                .map(|v| {
                    let (nghs, wghs) = lists.slices(v);
                    nghs.iter().copied().zip(wghs.iter().copied()).collect()
                })
                .collect::<Vec<Vec<_>>>()
        };
        super::CompressedGraph::from_adjacencies(
            extract(&self.out),
            self.in_.as_ref().map(extract),
        )
    }

    fn in_lists(&self) -> &CsrLists<W> {
        self.in_.as_ref().unwrap_or(&self.out)
    }

    fn map_slices<F: FnMut(VertexId, VertexId, W) -> bool>(
        v: VertexId,
        nghs: &[VertexId],
        wghs: &[W],
        mut f: F,
    ) {
        for (&d, &w) in nghs.iter().zip(wghs) {
            if !f(v, d, w) {
                return;
            }
        }
    }
}

impl<W: EdgeWeight> Graph<W> for CsrGraph<W> {
    #[inline(always)]
    fn num_vertices(&self) -> usize {
        self.n
    }

    #[inline(always)]
    fn num_edges(&self) -> usize {
        self.m
    }

    #[inline(always)]
    fn is_symmetric(&self) -> bool {
        self.in_.is_none()
    }

    #[inline(always)]
    fn out_degree(&self, v: VertexId) -> usize {
        self.out.degree(v)
    }

    #[inline(always)]
    fn in_degree(&self, v: VertexId) -> usize {
        self.in_lists().degree(v)
    }

    fn map_out_nghs<F: FnMut(VertexId, VertexId, W) -> bool>(&self, v: VertexId, f: F) {
        let (nghs, wghs) = self.out.slices(v);
        Self::map_slices(v, nghs, wghs, f);
    }

    fn map_in_nghs<F: FnMut(VertexId, VertexId, W) -> bool>(&self, v: VertexId, f: F) {
        let (nghs, wghs) = self.in_lists().slices(v);
        Self::map_slices(v, nghs, wghs, f);
    }

    fn map_out_nghs_par<F: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, v: VertexId, f: F) {
        let (nghs, wghs) = self.out.slices(v);
        nghs.par_chunks(PARALLEL_DEGREE)
            .zip(wghs.par_chunks(PARALLEL_DEGREE))
            .for_each(|(nghs, wghs)| Self::map_slices(v, nghs, wghs, &f));
    }

    fn map_in_nghs_par<F: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, v: VertexId, f: F) {
        let (nghs, wghs) = self.in_lists().slices(v);
        nghs.par_chunks(PARALLEL_DEGREE)
            .zip(wghs.par_chunks(PARALLEL_DEGREE))
            .for_each(|(nghs, wghs)| Self::map_slices(v, nghs, wghs, &f));
    }

    #[inline(always)]
    fn get_out_ngh(&self, v: VertexId, i: usize) -> (VertexId, W) {
        let (nghs, wghs) = self.out.slices(v);
        (nghs[i], wghs[i])
    }

    #[inline]
    fn num_out_blocks(&self, v: VertexId) -> usize {
        self.out.degree(v).div_ceil(PARALLEL_DEGREE)
    }

    fn map_out_block<F: FnMut(VertexId, VertexId, W)>(&self, v: VertexId, block: usize, mut f: F) {
        let (nghs, wghs) = self.out.slices(v);
        let start = block * PARALLEL_DEGREE;
        let end = (start + PARALLEL_DEGREE).min(nghs.len());
        Self::map_slices(v, &nghs[start..end], &wghs[start..end], |s, d, w| {
            f(s, d, w);
            true
        });
    }

    fn reduce_out_nghs<T, M, R>(&self, v: VertexId, map: M, identity: T, reduce: R) -> T
    where
        T: Clone + Send + Sync,
        M: Fn(VertexId, VertexId, W) -> T + Sync,
        R: Fn(T, T) -> T + Send + Sync,
    {
        let (nghs, wghs) = self.out.slices(v);
        if nghs.len() > 2 * PARALLEL_DEGREE {
            nghs.par_iter()
                .zip(wghs.par_iter())
                .map(|(&d, &w)| map(v, d, w))
                .reduce(|| identity.clone(), &reduce)
        } else {
            nghs.iter()
                .zip(wghs)
                .fold(identity, |acc, (&d, &w)| reduce(acc, map(v, d, w)))
        }
    }

    fn pack_out_nghs<P: Fn(VertexId, VertexId, W) -> bool>(
        &mut self,
        v: VertexId,
        pred: P,
    ) -> usize {
        let vi = v as usize;
        let start = self.out.offsets[vi] as usize;
        let degree = self.out.degrees[vi] as usize;
        let mut kept = 0;
        for i in 0..degree {
            let (d, w) = (self.out.nghs[start + i], self.out.wghs[start + i]);
            if pred(v, d, w) {
                self.out.nghs[start + kept] = d;
                self.out.wghs[start + kept] = w;
                kept += 1;
            }
        }
        self.out.degrees[vi] = kept as u32;
        kept
    }

    fn pack_out_nghs_many<P: Fn(VertexId, VertexId, W) -> bool + Sync + Send>(
        &mut self,
        targets: &[VertexId],
        pred: P,
    ) -> Box<[u32]> {
        let old: Vec<u32> = targets.iter().map(|&v| self.out.degrees[v as usize]).collect();
        let CsrLists {
            degrees,
            offsets,
            nghs,
            wghs,
        } = &mut self.out;
        let nghs_base = SendPtr(nghs.as_mut_ptr());
        let wghs_base = SendPtr(wghs.as_mut_ptr());
        let degrees = degrees.as_sync_slice();
        targets
            .par_iter()
            .zip(old.par_iter())
            .map(|(&v, &degree)| {
                let nghs_base = &nghs_base;
                let wghs_base = &wghs_base;
                let vi = v as usize;
                let start = offsets[vi] as usize;
                let degree = degree as usize;
                // SAFETY: `targets` is duplicate-free, so the edge ranges
                // (and degree slots) touched by this loop are pairwise
                // disjoint.
                let (nghs, wghs) = unsafe {
                    (
                        std::slice::from_raw_parts_mut(nghs_base.0.add(start), degree),
                        std::slice::from_raw_parts_mut(wghs_base.0.add(start), degree),
                    )
                };
                let mut kept = 0;
                for i in 0..degree {
                    let (d, w) = (nghs[i], wghs[i]);
                    if pred(v, d, w) {
                        nghs[kept] = d;
                        wghs[kept] = w;
                        kept += 1;
                    }
                }
                unsafe { degrees[vi].set(kept as u32) };
                kept as u32
            })
            .collect::<Vec<_>>()
            .into_boxed_slice()
    }

    fn filter<P: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, pred: P) -> Self {
        let out_adj: Vec<Vec<(VertexId, W)>> = (0..self.n as VertexId)
            .into_par_iter()
            .map(|v| {
                let (nghs, wghs) = self.out.slices(v);
                nghs.iter()
                    .zip(wghs)
                    .filter(|&(&d, &w)| pred(v, d, w))
                    .map(|(&d, &w)| (d, w))
                    .collect()
            })
            .collect();
        let mut in_adj = vec![Vec::new(); self.n];
        for (u, list) in out_adj.iter().enumerate() {
            for &(v, w) in list {
                in_adj[v as usize].push((u as VertexId, w));
            }
        }
        Self::from_adjacencies(out_adj, Some(in_adj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Empty;

    #[test]
    fn test_path_graph() {
        let g = CsrGraph::<Empty>::from_undirected_edges(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(g.num_edges(), 6);
        assert_eq!(g.out_degree(1), 2);
        assert_eq!(g.get_out_ngh(1, 0), (0, Empty));
        assert_eq!(g.get_out_ngh(1, 1), (2, Empty));
    }

    #[test]
    fn test_pack_compacts() {
        let mut g = CsrGraph::<Empty>::from_undirected_edges(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        let kept = g.pack_out_nghs(0, |_, d, _| d % 2 == 1);
        assert_eq!(kept, 2);
        assert_eq!(g.out_degree(0), 2);
        let mut nghs = Vec::new();
        g.map_out_nghs(0, |_, d, _| {
            nghs.push(d);
            true
        });
        assert_eq!(nghs, [1, 3]);
        assert_eq!(g.count_out_nghs(0, |_, _, _| true), g.out_degree(0));
    }

    #[test]
    fn test_compress_matches() {
        let g = CsrGraph::<i32>::from_edges(
            3,
            &[(0, 1, 1), (1, 0, 1), (0, 2, 5), (2, 0, 5), (1, 2, 1), (2, 1, 1)],
            true,
        );
        let cg = g.compress();
        assert_eq!(cg.num_edges(), 6);
        for v in 0..3 {
            assert_eq!(cg.out_degree(v), g.out_degree(v));
            let mut a = Vec::new();
            let mut b = Vec::new();
            g.map_out_nghs(v, |_, d, w| {
                a.push((d, w));
                true
            });
            cg.map_out_nghs(v, |_, d, w| {
                b.push((d, w));
                true
            });
            assert_eq!(a, b);
        }
    }
}
