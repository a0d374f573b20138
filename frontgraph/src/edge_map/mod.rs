/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The frontier-expansion kernel.
//!
//! [`edge_map`] derives from a frontier the subset of destinations accepted
//! by a user [update function](EdgeMapF), traversing the graph in *sparse*
//! (push) or *dense* (pull) mode depending on the outgoing edge mass of the
//! frontier against a [`Threshold`]. [`edge_map_data`] additionally threads
//! a payload from the update function to the output subset, and
//! [`edge_map_pack`] filters the out-neighbor lists of the frontier in
//! place instead of producing a frontier.
//!
//! Within one call, updates to different destinations may race: the
//! [`update_atomic`](EdgeMapF::update_atomic) implementation must be
//! linearizable (and commutative for the algorithm to be deterministic).
//! The join point at the end of the call is a full barrier, so all writes
//! of one edge map are visible to the next.

use crate::alloc::BlockAllocator;
use crate::codecs::byte_pd::PARALLEL_DEGREE;
use crate::frontier::{SubsetData, VertexSubset, VertexSubsetData};
use crate::traits::Graph;
use crate::types::{EdgeWeight, Empty, VertexId};
use crate::utils::{scan_add_inplace, Granularity};
use parallel_frontier::Frontier;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::Ordering;
use std::sync::OnceLock;
use sux::bits::AtomicBitVec;
use sync_cell_slice::SyncSlice;

bitflags::bitflags! {
    /// Scheduling hints. Apart from [`NO_OUTPUT`](Flags::NO_OUTPUT), flags
    /// never change which destinations are accepted, only how the work is
    /// scheduled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u32 {
        /// Schedule sparse mode per codec block rather than per source
        /// vertex (better load balance under skewed degrees).
        const SPARSE_BLOCKED = 1 << 0;
        /// Scan each destination's in-neighbor blocks in parallel in dense
        /// mode.
        const DENSE_PARALLEL = 1 << 1;
        /// Dense mode iterates sources forward over all their edges using
        /// atomic updates, instead of pulling per destination with early
        /// exit. Required by update functions that must see every edge
        /// (e.g. rank accumulation, min-label propagation).
        const DENSE_FORWARD = 1 << 2;
        /// Never switch to dense mode.
        const NO_DENSE = 1 << 3;
        /// Discard the output subset.
        const NO_OUTPUT = 1 << 4;
        /// Skip duplicate removal in sparse mode; sound only when
        /// `update_atomic` accepts each destination at most once (e.g.
        /// compare-and-swap claims).
        const NO_DEDUP = 1 << 5;
    }
}

/// The sparse/dense switch-over point: dense mode is used when the
/// frontier size plus its outgoing edge mass exceeds the threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Threshold {
    /// One twentieth of the edge count.
    Auto,
    /// An explicit edge mass.
    Edges(usize),
    /// Never switch to dense mode.
    AlwaysSparse,
}

/// An edge-map update function.
///
/// `update` is called in contexts where its destination is owned by one
/// task; `update_atomic` wherever destinations may be shared. Both return
/// whether the destination enters the output subset. `cond` guards
/// destinations that need no further processing (e.g. already-visited
/// vertices); it defaults to always true.
pub trait EdgeMapF<W: EdgeWeight>: Sync {
    fn update(&self, src: VertexId, dst: VertexId, w: W) -> bool;

    fn update_atomic(&self, src: VertexId, dst: VertexId, w: W) -> bool;

    #[inline(always)]
    fn cond(&self, _dst: VertexId) -> bool {
        true
    }
}

/// The payload-producing variant of [`EdgeMapF`]: accepted destinations
/// carry a [`Data`](EdgeMapDataF::Data) value into the output subset.
pub trait EdgeMapDataF<W: EdgeWeight>: Sync {
    type Data: SubsetData;

    fn update(&self, src: VertexId, dst: VertexId, w: W) -> Option<Self::Data>;

    fn update_atomic(&self, src: VertexId, dst: VertexId, w: W) -> Option<Self::Data>;

    #[inline(always)]
    fn cond(&self, _dst: VertexId) -> bool {
        true
    }
}

struct WithEmptyData<'a, F>(&'a F);

impl<W: EdgeWeight, F: EdgeMapF<W>> EdgeMapDataF<W> for WithEmptyData<'_, F> {
    type Data = Empty;

    #[inline(always)]
    fn update(&self, src: VertexId, dst: VertexId, w: W) -> Option<Empty> {
        self.0.update(src, dst, w).then_some(Empty)
    }

    #[inline(always)]
    fn update_atomic(&self, src: VertexId, dst: VertexId, w: W) -> Option<Empty> {
        self.0.update_atomic(src, dst, w).then_some(Empty)
    }

    #[inline(always)]
    fn cond(&self, dst: VertexId) -> bool {
        self.0.cond(dst)
    }
}

/// Expands `frontier` through `f`, returning the subset of accepted
/// destinations.
pub fn edge_map<W: EdgeWeight, G: Graph<W>, F: EdgeMapF<W>>(
    graph: &G,
    frontier: &mut VertexSubset,
    f: &F,
    threshold: Threshold,
    flags: Flags,
    pool: &ThreadPool,
) -> VertexSubset {
    edge_map_data(graph, frontier, &WithEmptyData(f), threshold, flags, pool)
}

/// Expands `frontier` through `f`, returning the accepted destinations
/// with the payloads produced by the update function.
pub fn edge_map_data<W: EdgeWeight, G: Graph<W>, F: EdgeMapDataF<W>>(
    graph: &G,
    frontier: &mut VertexSubset,
    f: &F,
    threshold: Threshold,
    flags: Flags,
    pool: &ThreadPool,
) -> VertexSubsetData<F::Data> {
    let n = graph.num_vertices();
    if frontier.is_empty() {
        return VertexSubsetData::empty(n);
    }
    let threshold = match threshold {
        Threshold::Auto => graph.num_edges() / 20,
        Threshold::Edges(edges) => edges,
        Threshold::AlwaysSparse => usize::MAX,
    };
    let out_edges: usize = pool.install(|| {
        if frontier.dense() {
            let frontier = &*frontier;
            (0..n as VertexId)
                .into_par_iter()
                .filter(|&v| frontier.contains(v))
                .map(|v| graph.out_degree(v))
                .sum()
        } else {
            frontier
                .sparse()
                .par_iter()
                .map(|&(v, _)| graph.out_degree(v))
                .sum()
        }
    });
    if !flags.contains(Flags::NO_DENSE) && frontier.size() + out_edges > threshold {
        log::trace!(
            "dense edge map: {} vertices, {out_edges} out edges",
            frontier.size()
        );
        edge_map_dense(graph, frontier, f, flags, pool)
    } else {
        log::trace!(
            "sparse edge map: {} vertices, {out_edges} out edges",
            frontier.size()
        );
        edge_map_sparse(graph, frontier, f, flags, pool)
    }
}

fn edge_map_dense<W: EdgeWeight, G: Graph<W>, F: EdgeMapDataF<W>>(
    graph: &G,
    frontier: &mut VertexSubset,
    f: &F,
    flags: Flags,
    pool: &ThreadPool,
) -> VertexSubsetData<F::Data> {
    let n = graph.num_vertices();
    frontier.to_dense();
    let frontier: &VertexSubset = frontier;
    let next = AtomicBitVec::new(n);
    let mut data = vec![F::Data::default(); n].into_boxed_slice();
    let data_sync = data.as_sync_slice();
    let grain = Granularity::default().granularity(n, pool.current_num_threads());

    pool.install(|| {
        if flags.contains(Flags::DENSE_FORWARD) {
            (0..n as VertexId)
                .into_par_iter()
                .with_min_len(grain)
                .for_each(|v| {
                    if frontier.contains(v) {
                        graph.map_out_nghs(v, |s, d, w| {
                            if f.cond(d) {
                                if let Some(x) = f.update_atomic(s, d, w) {
                                    if !next.swap(d as usize, true, Ordering::Relaxed) {
                                        // SAFETY: the swap claims each slot
                                        // exactly once.
                                        unsafe { data_sync[d as usize].set(x) };
                                    }
                                }
                            }
                            true
                        });
                    }
                });
        } else {
            (0..n as VertexId)
                .into_par_iter()
                .with_min_len(grain)
                .for_each(|d| {
                    if !f.cond(d) {
                        return;
                    }
                    if flags.contains(Flags::DENSE_PARALLEL) {
                        graph.map_in_nghs_par(d, |d, s, w| {
                            if frontier.contains(s) {
                                if let Some(x) = f.update_atomic(s, d, w) {
                                    if !next.swap(d as usize, true, Ordering::Relaxed) {
                                        // SAFETY: as above.
                                        unsafe { data_sync[d as usize].set(x) };
                                    }
                                }
                            }
                            true
                        });
                    } else {
                        graph.map_in_nghs(d, |d, s, w| {
                            if !frontier.contains(s) {
                                return true;
                            }
                            match f.update(s, d, w) {
                                Some(x) => {
                                    next.set(d as usize, true, Ordering::Relaxed);
                                    // SAFETY: this task owns destination `d`.
                                    unsafe { data_sync[d as usize].set(x) };
                                    false
                                }
                                None => true,
                            }
                        });
                    }
                });
        }
    });

    if flags.contains(Flags::NO_OUTPUT) {
        return VertexSubsetData::empty(n);
    }
    VertexSubsetData::from_dense(n, next, data)
}

fn edge_map_sparse<W: EdgeWeight, G: Graph<W>, F: EdgeMapDataF<W>>(
    graph: &G,
    frontier: &mut VertexSubset,
    f: &F,
    flags: Flags,
    pool: &ThreadPool,
) -> VertexSubsetData<F::Data> {
    let n = graph.num_vertices();
    frontier.to_sparse();
    let members = frontier.sparse();
    let out: Frontier<(VertexId, F::Data)> = Frontier::with_threads(pool, None);
    let claimed = (!flags.contains(Flags::NO_DEDUP)).then(|| AtomicBitVec::new(n));
    let emit = |d: VertexId, x: F::Data| {
        if let Some(claimed) = &claimed {
            if claimed.swap(d as usize, true, Ordering::Relaxed) {
                return;
            }
        }
        out.push((d, x));
    };

    pool.install(|| {
        if flags.contains(Flags::SPARSE_BLOCKED) {
            // One task per codec block of a frontier vertex.
            let mut offsets: Vec<usize> = members
                .iter()
                .map(|&(v, _)| graph.num_out_blocks(v))
                .collect();
            offsets.push(0);
            let total = scan_add_inplace(&mut offsets);
            (0..total).into_par_iter().for_each(|task| {
                let i = offsets.partition_point(|&o| o <= task) - 1;
                let v = members[i].0;
                let block = task - offsets[i];
                let mut scratch = em_scratch().scratch::<(VertexId, W)>();
                assert!(scratch.capacity() >= PARALLEL_DEGREE);
                let buf = scratch.as_uninit_mut();
                let mut len = 0;
                graph.map_out_block(v, block, |_, d, w| {
                    buf[len].write((d, w));
                    len += 1;
                });
                for slot in &buf[..len] {
                    // SAFETY: the first `len` slots were just written.
                    let (d, w) = unsafe { slot.assume_init_read() };
                    if f.cond(d) {
                        if let Some(x) = f.update_atomic(v, d, w) {
                            emit(d, x);
                        }
                    }
                }
            });
        } else {
            members.par_iter().for_each(|&(v, _)| {
                graph.map_out_nghs_par(v, |s, d, w| {
                    if f.cond(d) {
                        if let Some(x) = f.update_atomic(s, d, w) {
                            emit(d, x);
                        }
                    }
                    true
                });
            });
        }
    });

    if flags.contains(Flags::NO_OUTPUT) {
        return VertexSubsetData::empty(n);
    }
    let accepted = pool.install(|| {
        let mut accepted: Vec<(VertexId, F::Data)> = out.par_iter().copied().collect();
        accepted.par_sort_unstable_by_key(|e| e.0);
        accepted
    });
    VertexSubsetData::from_sparse(n, accepted)
}

/// Packs the out-neighbor lists of the frontier vertices in place,
/// retaining the edges satisfying `pred`; returns the frontier with the
/// surviving degrees as payload (or the empty subset under `no_output`).
pub fn edge_map_pack<W: EdgeWeight, G: Graph<W>, P: Fn(VertexId, VertexId, W) -> bool + Sync + Send>(
    graph: &mut G,
    frontier: &mut VertexSubset,
    pred: P,
    no_output: bool,
    pool: &ThreadPool,
) -> VertexSubsetData<u32> {
    frontier.to_sparse();
    let targets: Vec<VertexId> = frontier.sparse().iter().map(|&(v, _)| v).collect();
    let new_degrees = pool.install(|| graph.pack_out_nghs_many(&targets, pred));
    if no_output {
        return VertexSubsetData::empty(graph.num_vertices());
    }
    VertexSubsetData::from_sparse(
        graph.num_vertices(),
        targets
            .into_iter()
            .zip(new_degrees.iter().copied())
            .collect(),
    )
}

/// Scratch blocks for the block scheduler: each task decodes one codec
/// block into allocator-backed scratch before applying the update
/// function.
const EM_SCRATCH_BLOCK_BYTES: usize = 16384;

static EM_SCRATCH: OnceLock<BlockAllocator> = OnceLock::new();

fn em_scratch() -> &'static BlockAllocator {
    EM_SCRATCH.get_or_init(|| BlockAllocator::with_config(EM_SCRATCH_BLOCK_BYTES, 64, None))
}
