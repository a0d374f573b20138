/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Basic vertex and edge-weight types.

use crate::codecs::byte_pd;

/// The type of vertex identifiers.
///
/// Graphs are limited to 2³² − 1 vertices; the all-ones value is reserved
/// as the [`UNDEFINED`] sentinel.
pub type VertexId = u32;

/// Sentinel denoting an absent or undefined vertex (e.g., the parent of an
/// unreached vertex in a BFS tree).
pub const UNDEFINED: VertexId = VertexId::MAX;

/// An edge weight that the adjacency codec knows how to interleave with
/// neighbor deltas.
///
/// Two implementations are provided: [`Empty`] (unit weight, zero bytes on
/// the wire) and `i32` (signed variable-byte encoding, sign bit in the first
/// byte). Algorithms that are weight-oblivious are generic over this trait;
/// algorithms that need integer weights (e.g., bucketed shortest paths)
/// require `i32` by construction.
pub trait EdgeWeight:
    Copy + Default + PartialEq + Send + Sync + core::fmt::Debug + 'static
{
    /// Decodes a weight from `bytes` starting at `*pos`, advancing `*pos`
    /// past it.
    fn decode(bytes: &[u8], pos: &mut usize) -> Self;

    /// Encodes the weight into `out` at `pos`, returning the position past
    /// the encoded bytes.
    fn encode(self, out: &mut [u8], pos: usize) -> usize;

    /// The number of bytes [`encode`](EdgeWeight::encode) will emit.
    fn encoded_len(self) -> usize;
}

/// The unit edge weight of unweighted graphs. Occupies no space in encoded
/// adjacency lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Empty;

impl EdgeWeight for Empty {
    #[inline(always)]
    fn decode(_bytes: &[u8], _pos: &mut usize) -> Self {
        Empty
    }

    #[inline(always)]
    fn encode(self, _out: &mut [u8], pos: usize) -> usize {
        pos
    }

    #[inline(always)]
    fn encoded_len(self) -> usize {
        0
    }
}

impl EdgeWeight for i32 {
    #[inline(always)]
    fn decode(bytes: &[u8], pos: &mut usize) -> Self {
        byte_pd::decode_signed(bytes, pos)
    }

    #[inline(always)]
    fn encode(self, out: &mut [u8], pos: usize) -> usize {
        byte_pd::encode_signed(out, pos, self as i64)
    }

    #[inline(always)]
    fn encoded_len(self) -> usize {
        byte_pd::signed_len(self as i64)
    }
}
