/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Vertex subsets (frontiers).
//!
//! A [`VertexSubsetData`] is a set of vertices in `[0..n)`, optionally
//! carrying a payload per member, in one of two representations: *sparse*
//! (a sorted sequence of members) or *dense* (a bit vector of length `n`
//! plus a payload slot per vertex). The representation produced by
//! [`edge_map`](crate::edge_map::edge_map) follows the traversal mode;
//! conversions are lazy and cached. [`VertexSubset`] is the payload-free
//! alias.

use crate::types::{Empty, VertexId};
use rayon::prelude::*;
use std::sync::atomic::Ordering;
use sux::bits::AtomicBitVec;
use sync_cell_slice::SyncSlice;

/// The payload carried by each member of a data-carrying subset.
pub trait SubsetData: Copy + Default + Send + Sync + 'static {}

impl<T: Copy + Default + Send + Sync + 'static> SubsetData for T {}

/// A set of vertices with a payload per member.
pub struct VertexSubsetData<D: SubsetData> {
    n: usize,
    count: usize,
    /// Members in increasing order, when materialized.
    sparse: Option<Box<[(VertexId, D)]>>,
    /// Membership bits and per-vertex payload slots, when materialized.
    dense: Option<(AtomicBitVec, Box<[D]>)>,
    /// Which representation is authoritative (both may be cached).
    is_dense: bool,
}

/// A payload-free vertex subset.
pub type VertexSubset = VertexSubsetData<Empty>;

impl VertexSubset {
    /// The subset containing only `v`.
    pub fn singleton(n: usize, v: VertexId) -> Self {
        Self::from_sparse(n, vec![(v, Empty)])
    }

    /// A sparse subset over the given members.
    pub fn from_vertices(n: usize, mut vertices: Vec<VertexId>) -> Self {
        vertices.sort_unstable();
        Self::from_sparse(n, vertices.into_iter().map(|v| (v, Empty)).collect())
    }
}

impl<D: SubsetData> VertexSubsetData<D> {
    /// The empty subset.
    pub fn empty(n: usize) -> Self {
        VertexSubsetData {
            n,
            count: 0,
            sparse: Some(Vec::new().into_boxed_slice()),
            dense: None,
            is_dense: false,
        }
    }

    /// The full subset `[0..n)` (dense), with default payloads.
    pub fn full(n: usize) -> Self {
        let bits = AtomicBitVec::new(n);
        (0..n)
            .into_par_iter()
            .for_each(|v| bits.set(v, true, Ordering::Relaxed));
        VertexSubsetData {
            n,
            count: n,
            sparse: None,
            dense: Some((bits, vec![D::default(); n].into_boxed_slice())),
            is_dense: true,
        }
    }

    /// A sparse subset from members sorted by vertex id, without
    /// duplicates.
    pub fn from_sparse(n: usize, members: Vec<(VertexId, D)>) -> Self {
        debug_assert!(members.windows(2).all(|p| p[0].0 < p[1].0));
        VertexSubsetData {
            n,
            count: members.len(),
            sparse: Some(members.into_boxed_slice()),
            dense: None,
            is_dense: false,
        }
    }

    /// A dense subset from membership bits and per-vertex payload slots
    /// (meaningful only where the bit is set).
    pub fn from_dense(n: usize, bits: AtomicBitVec, data: Box<[D]>) -> Self {
        let count = (0..n)
            .into_par_iter()
            .filter(|&v| bits.get(v, Ordering::Relaxed))
            .count();
        VertexSubsetData {
            n,
            count,
            sparse: None,
            dense: Some((bits, data)),
            is_dense: true,
        }
    }

    /// The size of the ground set `[0..n)`.
    pub fn num_vertices(&self) -> usize {
        self.n
    }

    /// The number of members.
    pub fn size(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether the authoritative representation is dense.
    pub fn dense(&self) -> bool {
        self.is_dense
    }

    pub fn contains(&self, v: VertexId) -> bool {
        if let Some((bits, _)) = &self.dense {
            bits.get(v as usize, Ordering::Relaxed)
        } else {
            self.sparse
                .as_ref()
                .unwrap()
                .binary_search_by_key(&v, |e| e.0)
                .is_ok()
        }
    }

    /// Materializes the sparse representation (sorted by vertex id).
    pub fn to_sparse(&mut self) {
        if self.sparse.is_none() {
            let (bits, data) = self.dense.as_ref().unwrap();
            let members: Vec<(VertexId, D)> = (0..self.n)
                .into_par_iter()
                .filter_map(|v| {
                    bits.get(v, Ordering::Relaxed)
                        .then(|| (v as VertexId, data[v]))
                })
                .collect();
            debug_assert_eq!(members.len(), self.count);
            self.sparse = Some(members.into_boxed_slice());
        }
        self.is_dense = false;
    }

    /// Materializes the dense representation.
    pub fn to_dense(&mut self) {
        if self.dense.is_none() {
            let bits = AtomicBitVec::new(self.n);
            let mut data = vec![D::default(); self.n].into_boxed_slice();
            {
                let data = data.as_sync_slice();
                self.sparse.as_ref().unwrap().par_iter().for_each(|&(v, x)| {
                    bits.set(v as usize, true, Ordering::Relaxed);
                    // SAFETY: members are unique, so each slot is written
                    // at most once.
                    unsafe { data[v as usize].set(x) };
                });
            }
            self.dense = Some((bits, data));
        }
        self.is_dense = true;
    }

    /// The sorted members; the sparse representation must have been
    /// materialized.
    pub fn sparse(&self) -> &[(VertexId, D)] {
        self.sparse
            .as_ref()
            .expect("sparse representation not materialized")
    }

    /// The member ids, materializing the sparse representation.
    pub fn vertices(&mut self) -> Vec<VertexId> {
        self.to_sparse();
        self.sparse().iter().map(|&(v, _)| v).collect()
    }

    /// The accessor driving
    /// [`Buckets::update_buckets`](crate::buckets::Buckets::update_buckets):
    /// entry `i` of a sparse subset is its `i`-th member, entry `i` of a
    /// dense subset is vertex `i` if present. Iterate up to
    /// [`size`](Self::size) entries in the sparse case, `n` in the dense
    /// case.
    pub fn entry(&self, i: usize) -> Option<(VertexId, D)> {
        if self.is_dense {
            let (bits, data) = self.dense.as_ref().unwrap();
            bits.get(i, Ordering::Relaxed).then(|| (i as VertexId, data[i]))
        } else {
            self.sparse.as_ref().unwrap().get(i).copied()
        }
    }

    /// Invokes `f(v, payload)` on every member, in parallel.
    pub fn map<F: Fn(VertexId, D) + Sync>(&self, f: F) {
        if self.is_dense {
            let (bits, data) = self.dense.as_ref().unwrap();
            (0..self.n).into_par_iter().for_each(|v| {
                if bits.get(v, Ordering::Relaxed) {
                    f(v as VertexId, data[v]);
                }
            });
        } else {
            self.sparse
                .as_ref()
                .unwrap()
                .par_iter()
                .for_each(|&(v, x)| f(v, x));
        }
    }
}

/// Invokes `f(v)` on every member of `subset`, in parallel.
pub fn vertex_map<D: SubsetData, F: Fn(VertexId) + Sync>(subset: &VertexSubsetData<D>, f: F) {
    subset.map(|v, _| f(v));
}

/// The sparse subset of members of `subset` satisfying `pred`.
pub fn vertex_filter<D: SubsetData, P: Fn(VertexId, D) -> bool + Sync>(
    subset: &VertexSubsetData<D>,
    pred: P,
) -> VertexSubsetData<D> {
    let len = if subset.dense() {
        subset.num_vertices()
    } else {
        subset.size()
    };
    let members: Vec<(VertexId, D)> = (0..len)
        .into_par_iter()
        .filter_map(|i| subset.entry(i).filter(|&(v, x)| pred(v, x)))
        .collect();
    VertexSubsetData::from_sparse(subset.num_vertices(), members)
}
