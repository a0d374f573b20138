/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unconditional_recursion)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(trivial_casts)]

pub mod alloc;
pub mod buckets;
pub mod codecs;
pub mod edge_map;
pub mod frontier;
pub mod graphs;
pub mod traits;
pub mod types;
pub mod utils;

pub use edge_map::{edge_map, edge_map_data, edge_map_pack};
pub use types::{EdgeWeight, Empty, VertexId, UNDEFINED};

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::buckets::*;
    pub use crate::edge_map::*;
    pub use crate::frontier::*;
    pub use crate::graphs::*;
    pub use crate::thread_pool;
    pub use crate::traits::*;
    pub use crate::types::*;
    pub use crate::utils::*;
}
