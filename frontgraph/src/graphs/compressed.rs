/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{arcs_to_adjacencies, debug_assert_sorted, SendPtr};
use crate::codecs::byte_pd;
use crate::traits::Graph;
use crate::types::{EdgeWeight, VertexId};
use crate::utils::scan_add_inplace;
use rayon::prelude::*;
use std::marker::PhantomData;
use sync_cell_slice::SyncSlice;

/// The encoded adjacency of one direction: per-vertex degrees, byte
/// offsets (`n + 1` of them) and one owned byte region.
struct EncodedLists {
    degrees: Box<[u32]>,
    offsets: Box<[u64]>,
    bytes: Box<[u8]>,
}

impl EncodedLists {
    fn encode<W: EdgeWeight>(adj: &[Vec<(VertexId, W)>]) -> Self {
        let n = adj.len();
        let degrees: Box<[u32]> = adj.iter().map(|l| l.len() as u32).collect();
        let mut sizes: Vec<usize> = adj
            .par_iter()
            .enumerate()
            .map(|(v, l)| byte_pd::compressed_size(v as VertexId, l))
            .collect();
        sizes.push(0);
        let total = scan_add_inplace(&mut sizes);
        debug_assert_eq!(sizes[n], total);

        let mut bytes = vec![0u8; total].into_boxed_slice();
        let base = SendPtr(bytes.as_mut_ptr());
        adj.par_iter().enumerate().for_each(|(v, l)| {
            let base = &base;
            let (start, end) = (sizes[v], sizes[v + 1]);
            // SAFETY: the windows [start..end) are pairwise disjoint across
            // the sources of this loop.
            let window = unsafe { std::slice::from_raw_parts_mut(base.0.add(start), end - start) };
            let written = byte_pd::compress(v as VertexId, l, window);
            debug_assert_eq!(written, end - start);
        });

        let offsets: Box<[u64]> = sizes.iter().map(|&s| s as u64).collect();
        EncodedLists {
            degrees,
            offsets,
            bytes,
        }
    }

    #[inline(always)]
    fn region(&self, v: VertexId) -> &[u8] {
        &self.bytes[self.offsets[v as usize] as usize..self.offsets[v as usize + 1] as usize]
    }

    #[inline(always)]
    fn degree(&self, v: VertexId) -> usize {
        self.degrees[v as usize] as usize
    }
}

/// An immutable graph whose neighbor lists are encoded with the
/// [block-amortized variable-byte codec](crate::codecs::byte_pd).
///
/// Symmetric graphs store a single encoded region serving both neighbor
/// directions; asymmetric graphs carry an independent in-neighbor region.
/// The graph is immutable except for packing, which shrinks out-neighbor
/// lists in place.
pub struct CompressedGraph<W: EdgeWeight = crate::types::Empty> {
    n: usize,
    m: usize,
    out: EncodedLists,
    in_: Option<EncodedLists>,
    _marker: PhantomData<W>,
}

impl<W: EdgeWeight> CompressedGraph<W> {
    /// Builds a graph from per-vertex sorted adjacency lists; pass
    /// `in_adj` for an asymmetric graph, `None` for a symmetric one.
    pub fn from_adjacencies(
        out_adj: Vec<Vec<(VertexId, W)>>,
        in_adj: Option<Vec<Vec<(VertexId, W)>>>,
    ) -> Self {
        debug_assert_sorted(&out_adj);
        let n = out_adj.len();
        let m = out_adj.iter().map(Vec::len).sum();
        let out = EncodedLists::encode(&out_adj);
        let in_ = in_adj.map(|adj| {
            assert_eq!(adj.len(), n);
            debug_assert_sorted(&adj);
            EncodedLists::encode(&adj)
        });
        CompressedGraph {
            n,
            m,
            out,
            in_,
            _marker: PhantomData,
        }
    }

    /// Builds a graph from directed arcs. With `symmetric` the arc list
    /// must already contain both directions of every edge; otherwise an
    /// independent in-neighbor region is derived from the reversed arcs.
    pub fn from_edges(n: usize, arcs: &[(VertexId, VertexId, W)], symmetric: bool) -> Self {
        let out_adj = arcs_to_adjacencies(n, arcs);
        let in_adj = (!symmetric).then(|| {
            let reversed: Vec<_> = arcs.iter().map(|&(u, v, w)| (v, u, w)).collect();
            arcs_to_adjacencies(n, &reversed)
        });
        Self::from_adjacencies(out_adj, in_adj)
    }

    /// Builds a symmetric graph from undirected edges, mirroring each.
    pub fn from_undirected_edges(n: usize, edges: &[(VertexId, VertexId, W)]) -> Self {
        let mut arcs = Vec::with_capacity(edges.len() * 2);
        for &(u, v, w) in edges {
            arcs.push((u, v, w));
            arcs.push((v, u, w));
        }
        Self::from_edges(n, &arcs, true)
    }

    fn in_lists(&self) -> &EncodedLists {
        self.in_.as_ref().unwrap_or(&self.out)
    }

    /// The virtual degree of `v`'s out-neighbor list (spare capacity
    /// bookkeeping under packing).
    pub fn out_virtual_degree(&self, v: VertexId) -> usize {
        byte_pd::virtual_degree(self.out.region(v), self.out.degree(v))
    }

    /// Sums the live out-degrees (the edge count after packing).
    pub fn live_edges(&self) -> usize {
        self.out.degrees.par_iter().map(|&d| d as usize).sum()
    }
}

impl<W: EdgeWeight> Graph<W> for CompressedGraph<W> {
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

    fn map_out_nghs<F: FnMut(VertexId, VertexId, W) -> bool>(&self, v: VertexId, mut f: F) {
        byte_pd::decode(self.out.region(v), v, self.out.degree(v), |s, d, w, _| {
            f(s, d, w)
        });
    }

    fn map_in_nghs<F: FnMut(VertexId, VertexId, W) -> bool>(&self, v: VertexId, mut f: F) {
        let lists = self.in_lists();
        byte_pd::decode(lists.region(v), v, lists.degree(v), |s, d, w, _| f(s, d, w));
    }

    fn map_out_nghs_par<F: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, v: VertexId, f: F) {
        byte_pd::decode_parallel(self.out.region(v), v, self.out.degree(v), |s, d, w, _| {
            f(s, d, w)
        });
    }

    fn map_in_nghs_par<F: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, v: VertexId, f: F) {
        let lists = self.in_lists();
        byte_pd::decode_parallel(lists.region(v), v, lists.degree(v), |s, d, w, _| {
            f(s, d, w)
        });
    }

    #[inline]
    fn get_out_ngh(&self, v: VertexId, i: usize) -> (VertexId, W) {
        byte_pd::get_ith(self.out.region(v), v, self.out.degree(v), i)
    }

    #[inline]
    fn num_out_blocks(&self, v: VertexId) -> usize {
        byte_pd::num_blocks(self.out.region(v), self.out.degree(v))
    }

    fn map_out_block<F: FnMut(VertexId, VertexId, W)>(&self, v: VertexId, block: usize, mut f: F) {
        byte_pd::decode_block(
            self.out.region(v),
            v,
            self.out.degree(v),
            block,
            |s, d, w, _| {
                f(s, d, w);
                true
            },
        );
    }

    fn reduce_out_nghs<T, M, R>(&self, v: VertexId, map: M, identity: T, reduce: R) -> T
    where
        T: Clone + Send + Sync,
        M: Fn(VertexId, VertexId, W) -> T + Sync,
        R: Fn(T, T) -> T + Send + Sync,
    {
        byte_pd::map_reduce(
            self.out.region(v),
            v,
            self.out.degree(v),
            map,
            identity,
            reduce,
            true,
        )
    }

    fn pack_out_nghs<P: Fn(VertexId, VertexId, W) -> bool>(
        &mut self,
        v: VertexId,
        pred: P,
    ) -> usize {
        let vi = v as usize;
        let degree = self.out.degrees[vi] as usize;
        let range = self.out.offsets[vi] as usize..self.out.offsets[vi + 1] as usize;
        let surviving = byte_pd::pack(&mut self.out.bytes[range], v, degree, pred);
        self.out.degrees[vi] = surviving as u32;
        surviving
    }

    fn pack_out_nghs_many<P: Fn(VertexId, VertexId, W) -> bool + Sync + Send>(
        &mut self,
        targets: &[VertexId],
        pred: P,
    ) -> Box<[u32]> {
        let old: Vec<u32> = targets.iter().map(|&v| self.out.degrees[v as usize]).collect();
        let EncodedLists {
            degrees,
            offsets,
            bytes,
        } = &mut self.out;
        let base = SendPtr(bytes.as_mut_ptr());
        let degrees = degrees.as_sync_slice();
        targets
            .par_iter()
            .zip(old.par_iter())
            .map(|(&v, &degree)| {
                let base = &base;
                let vi = v as usize;
                let (start, end) = (offsets[vi] as usize, offsets[vi + 1] as usize);
                // SAFETY: `targets` is duplicate-free, so the encoded
                // regions (and degree slots) touched by this loop are
                // pairwise disjoint.
                let region =
                    unsafe { std::slice::from_raw_parts_mut(base.0.add(start), end - start) };
                let surviving = byte_pd::pack(region, v, degree as usize, &pred) as u32;
                unsafe { degrees[vi].set(surviving) };
                surviving
            })
            .collect::<Vec<_>>()
            .into_boxed_slice()
    }

    fn filter<P: Fn(VertexId, VertexId, W) -> bool + Sync>(&self, pred: P) -> Self {
        let out_adj: Vec<Vec<(VertexId, W)>> = (0..self.n as VertexId)
            .into_par_iter()
            .map(|v| {
                let mut list = Vec::new();
                self.map_out_nghs(v, |s, d, w| {
                    if pred(s, d, w) {
                        list.push((d, w));
                    }
                    true
                });
                list
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
