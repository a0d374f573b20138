/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Binary CSR interchange format.
//!
//! The on-disk layout is: vertex count and edge count as 64-bit integers,
//! the `n + 1` degree prefix sums as 64-bit integers, the `m` neighbors as
//! 32-bit integers, and, for the weighted variant, the `m` weights as
//! signed 32-bit integers. Everything is little-endian. Whether the graph
//! is symmetric is caller knowledge, not recorded in the file.

use super::CsrGraph;
use crate::traits::Graph;
use crate::types::{Empty, VertexId};
use anyhow::{ensure, Context, Result};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

fn read_u64(reader: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_header(reader: &mut impl Read) -> Result<(usize, usize, Vec<u64>)> {
    let n = read_u64(reader)? as usize;
    let m = read_u64(reader)? as usize;
    let mut offsets = Vec::with_capacity(n + 1);
    for _ in 0..=n {
        offsets.push(read_u64(reader)?);
    }
    ensure!(
        offsets[n] as usize == m,
        "degree prefix sums end at {} but the header claims {m} edges",
        offsets[n]
    );
    Ok((n, m, offsets))
}

fn write_header(writer: &mut impl Write, n: usize, m: usize, offsets: &[u64]) -> Result<()> {
    writer.write_all(&(n as u64).to_le_bytes())?;
    writer.write_all(&(m as u64).to_le_bytes())?;
    for &offset in offsets {
        writer.write_all(&offset.to_le_bytes())?;
    }
    Ok(())
}

/// Reads an unweighted binary CSR graph.
pub fn read_graph(path: impl AsRef<Path>, symmetric: bool) -> Result<CsrGraph<Empty>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(
        std::fs::File::open(path).with_context(|| format!("Cannot open {}", path.display()))?,
    );
    let (_, m, offsets) = read_header(&mut reader)?;
    let mut nghs = Vec::with_capacity(m);
    for _ in 0..m {
        nghs.push(read_u32(&mut reader)?);
    }
    Ok(CsrGraph::from_csr(offsets, nghs, vec![Empty; m], symmetric))
}

/// Writes an unweighted binary CSR graph (live edges only).
pub fn write_graph(graph: &CsrGraph<Empty>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(
        std::fs::File::create(path)
            .with_context(|| format!("Cannot create {}", path.display()))?,
    );
    let (offsets, nghs, _) = live_csr(graph);
    write_header(&mut writer, graph.num_vertices(), nghs.len(), &offsets)?;
    for ngh in nghs {
        writer.write_all(&ngh.to_le_bytes())?;
    }
    Ok(())
}

/// Reads a weighted binary CSR graph (32-bit signed weights after the
/// neighbor array).
pub fn read_weighted_graph(path: impl AsRef<Path>, symmetric: bool) -> Result<CsrGraph<i32>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(
        std::fs::File::open(path).with_context(|| format!("Cannot open {}", path.display()))?,
    );
    let (_, m, offsets) = read_header(&mut reader)?;
    let mut nghs = Vec::with_capacity(m);
    for _ in 0..m {
        nghs.push(read_u32(&mut reader)?);
    }
    let mut wghs = Vec::with_capacity(m);
    for _ in 0..m {
        wghs.push(read_u32(&mut reader)? as i32);
    }
    Ok(CsrGraph::from_csr(offsets, nghs, wghs, symmetric))
}

/// Writes a weighted binary CSR graph (live edges only).
pub fn write_weighted_graph(graph: &CsrGraph<i32>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(
        std::fs::File::create(path)
            .with_context(|| format!("Cannot create {}", path.display()))?,
    );
    let (offsets, nghs, wghs) = live_csr(graph);
    write_header(&mut writer, graph.num_vertices(), nghs.len(), &offsets)?;
    for ngh in nghs {
        writer.write_all(&ngh.to_le_bytes())?;
    }
    for wgh in wghs {
        writer.write_all(&(wgh as u32).to_le_bytes())?;
    }
    Ok(())
}

/// Extracts the live (post-pack) CSR arrays of the out side.
fn live_csr<W: crate::types::EdgeWeight>(
    graph: &CsrGraph<W>,
) -> (Vec<u64>, Vec<VertexId>, Vec<W>) {
    let n = graph.num_vertices();
    let mut offsets = Vec::with_capacity(n + 1);
    let mut nghs = Vec::new();
    let mut wghs = Vec::new();
    for v in 0..n as VertexId {
        offsets.push(nghs.len() as u64);
        graph.map_out_nghs(v, |_, d, w| {
            nghs.push(d);
            wghs.push(w);
            true
        });
    }
    offsets.push(nghs.len() as u64);
    (offsets, nghs, wghs)
}
