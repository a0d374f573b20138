/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Adjacency-list codecs.
//!
//! The only codec currently provided is the canonical block-amortized
//! variable-byte codec [`byte_pd`], which compresses a vertex's neighbor
//! list into independently decodable blocks so that long lists can be
//! traversed in parallel.

pub mod byte_pd;
