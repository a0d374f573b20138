/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

pub mod bfs;
pub mod cc;
pub mod pagerank;
pub mod spanning_forest;
pub mod wbfs;

pub mod prelude {
    pub use crate::bfs::*;
    pub use crate::cc::*;
    pub use crate::pagerank::*;
    pub use crate::spanning_forest::*;
    pub use crate::wbfs::*;
}
