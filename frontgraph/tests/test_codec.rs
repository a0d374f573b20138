/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use frontgraph::codecs::byte_pd::{
    compress, compressed_size, decode, decode_block_seq, decode_parallel, get_ith, intersect,
    intersect_f, map_reduce, pack, virtual_degree, EdgeIter, PARALLEL_DEGREE,
};
use frontgraph::types::{Empty, VertexId};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn encode<W: frontgraph::types::EdgeWeight>(source: VertexId, nghs: &[(VertexId, W)]) -> Vec<u8> {
    let mut bytes = vec![0u8; compressed_size(source, nghs)];
    let written = compress(source, nghs, &mut bytes);
    assert_eq!(written, bytes.len());
    bytes
}

fn decoded<W: frontgraph::types::EdgeWeight>(
    bytes: &[u8],
    source: VertexId,
    degree: usize,
) -> Vec<(VertexId, W)> {
    let mut result = Vec::new();
    decode::<W, _>(bytes, source, degree, |_, ngh, w, _| {
        result.push((ngh, w));
        true
    });
    result
}

fn random_nghs(rng: &mut SmallRng, degree: usize, universe: u32) -> Vec<(VertexId, i32)> {
    let mut ids = std::collections::BTreeSet::new();
    while ids.len() < degree {
        ids.insert(rng.random_range(0..universe));
    }
    ids.into_iter()
        .map(|v| (v, rng.random_range(-1000..1000)))
        .collect()
}

#[test]
fn test_wide_deltas_with_random_access() {
    // neighbors spanning a 15-bit jump, from source 0
    let nghs: Vec<(VertexId, Empty)> = [3, 7, 7 + (1 << 15), 7 + (1 << 15) + 1]
        .into_iter()
        .map(|v| (v, Empty))
        .collect();
    let bytes = encode(0, &nghs);
    assert_eq!(decoded::<Empty>(&bytes, 0, nghs.len()), nghs);
    assert_eq!(get_ith::<Empty>(&bytes, 0, nghs.len(), 2), (7 + (1 << 15), Empty));
    for (i, &pair) in nghs.iter().enumerate() {
        assert_eq!(get_ith::<Empty>(&bytes, 0, nghs.len(), i), pair);
    }
}

#[test]
fn test_weighted_roundtrip() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for degree in [1, 2, 999, 1000, 1001, 2500] {
        let nghs = random_nghs(&mut rng, degree, 1 << 24);
        let source = rng.random_range(0..1 << 24);
        let bytes = encode(source, &nghs);
        assert_eq!(decoded::<i32>(&bytes, source, degree), nghs);
        // spot-check random access
        for _ in 0..10 {
            let i = rng.random_range(0..degree);
            assert_eq!(get_ith::<i32>(&bytes, source, degree, i), nghs[i]);
        }
    }
}

#[test]
fn test_edge_indices_and_early_exit() {
    let nghs: Vec<(VertexId, Empty)> = (0..2500).map(|i| (3 * i, Empty)).collect();
    let bytes = encode(100, &nghs);
    let mut seen = 0;
    decode::<Empty, _>(&bytes, 100, nghs.len(), |_, ngh, _, i| {
        assert_eq!(ngh, 3 * i as u32);
        seen += 1;
        i < 1700
    });
    assert_eq!(seen, 1701);
}

#[test]
fn test_decode_parallel_matches() {
    let nghs: Vec<(VertexId, Empty)> = (0..5000).map(|i| (7 * i + 1, Empty)).collect();
    let bytes = encode(2, &nghs);
    let seen = std::sync::atomic::AtomicUsize::new(0);
    decode_parallel::<Empty, _>(&bytes, 2, nghs.len(), |_, ngh, _, i| {
        assert_eq!(ngh, 7 * i as u32 + 1);
        seen.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        true
    });
    assert_eq!(seen.into_inner(), 5000);
}

#[test]
fn test_decode_block_seq() {
    let nghs: Vec<(VertexId, Empty)> = (0..2500).map(|i| (2 * i, Empty)).collect();
    let bytes = encode(0, &nghs);
    let mut seen = Vec::new();
    decode_block_seq::<Empty, _>(&bytes, 0, nghs.len(), 2 * PARALLEL_DEGREE, 1, |_, ngh, _| {
        seen.push(ngh);
    });
    let expected: Vec<VertexId> = (2000..2500).map(|i| 2 * i).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_iter_cursor() {
    let nghs: Vec<(VertexId, i32)> = (0..2500).map(|i| (5 * i + 2, i as i32 - 70)).collect();
    let bytes = encode(9, &nghs);
    let mut iter = EdgeIter::<i32>::new(&bytes, 9, nghs.len());
    let mut result = vec![iter.cur()];
    while iter.has_next() {
        result.push(iter.next());
    }
    assert_eq!(result, nghs);
}

#[test]
fn test_map_reduce_sum() {
    let nghs: Vec<(VertexId, i32)> = (0..4321).map(|i| (2 * i + 1, 3)).collect();
    let bytes = encode(0, &nghs);
    let sum = map_reduce::<i32, usize, _, _>(
        &bytes,
        0,
        nghs.len(),
        |_, _, w| w as usize,
        0,
        |a, b| a + b,
        true,
    );
    assert_eq!(sum, 3 * 4321);
}

#[test]
fn test_intersection() {
    let a: Vec<(VertexId, Empty)> = (0..3000).map(|i| (2 * i, Empty)).collect();
    let b: Vec<(VertexId, Empty)> = (0..3000).map(|i| (3 * i, Empty)).collect();
    let a_bytes = encode(10, &a);
    let b_bytes = encode(20, &b);
    // shared neighbors are the multiples of 6 below 6000
    let count = intersect::<Empty>(&a_bytes, &b_bytes, a.len(), b.len(), 10, 20);
    assert_eq!(count, 1000);
    let mut shared = Vec::new();
    intersect_f::<Empty, _>(&a_bytes, &b_bytes, a.len(), b.len(), 10, 20, |u, v, ngh| {
        assert_eq!((u, v), (10, 20));
        shared.push(ngh);
    });
    assert_eq!(shared, (0..1000).map(|i| 6 * i).collect::<Vec<_>>());
}

#[test]
fn test_pack_keeps_odd_neighbors() {
    // degree 2500: dropping the evens keeps 1250, above the repack
    // threshold of a tenth of the virtual degree
    let nghs: Vec<(VertexId, Empty)> = (0..2500).map(|i| (i, Empty)).collect();
    let mut bytes = encode(0, &nghs);
    let surviving = pack::<Empty, _>(&mut bytes, 0, nghs.len(), |_, ngh, _| ngh % 2 == 1);
    assert_eq!(surviving, 1250);
    assert_eq!(virtual_degree(&bytes, surviving), 2500);
    let expected: Vec<(VertexId, Empty)> = (0..1250).map(|i| (2 * i + 1, Empty)).collect();
    assert_eq!(decoded::<Empty>(&bytes, 0, surviving), expected);
    for (i, &pair) in expected.iter().enumerate() {
        assert_eq!(get_ith::<Empty>(&bytes, 0, surviving, i), pair);
    }
    // the cursor skips emptied prefixes as well
    let mut iter = EdgeIter::<Empty>::new(&bytes, 0, surviving);
    let mut seen = vec![iter.cur()];
    while iter.has_next() {
        seen.push(iter.next());
    }
    assert_eq!(seen, expected);
}

#[test]
fn test_pack_triggers_repack() {
    let nghs: Vec<(VertexId, i32)> = (0..2500).map(|i| (i, i as i32)).collect();
    let mut bytes = encode(0, &nghs);
    // keep only multiples of 100: 25 survivors, below 2500/10
    let surviving = pack::<i32, _>(&mut bytes, 0, nghs.len(), |_, ngh, _| ngh % 100 == 0);
    assert_eq!(surviving, 25);
    assert_eq!(virtual_degree(&bytes, surviving), 25);
    let expected: Vec<(VertexId, i32)> = (0..25).map(|i| (100 * i, 100 * i as i32)).collect();
    assert_eq!(decoded::<i32>(&bytes, 0, surviving), expected);
}

#[test]
fn test_pack_empties_leading_blocks() {
    let nghs: Vec<(VertexId, Empty)> = (0..2500).map(|i| (i, Empty)).collect();
    let mut bytes = encode(0, &nghs);
    // blocks 0 and most of 1 empty out, no repack (1300 >= 250)
    let surviving = pack::<Empty, _>(&mut bytes, 0, nghs.len(), |_, ngh, _| ngh >= 1200);
    assert_eq!(surviving, 1300);
    let expected: Vec<(VertexId, Empty)> = (1200..2500).map(|i| (i, Empty)).collect();
    assert_eq!(decoded::<Empty>(&bytes, 0, surviving), expected);
    assert_eq!(get_ith::<Empty>(&bytes, 0, surviving, 0), (1200, Empty));
    let mut iter = EdgeIter::<Empty>::new(&bytes, 0, surviving);
    assert_eq!(iter.cur(), (1200, Empty));
    let mut count = 1;
    while iter.has_next() {
        iter.next();
        count += 1;
    }
    assert_eq!(count, surviving);
}

#[test]
fn test_pack_twice() {
    let nghs: Vec<(VertexId, Empty)> = (0..3000).map(|i| (i, Empty)).collect();
    let mut bytes = encode(1500, &nghs);
    let first = pack::<Empty, _>(&mut bytes, 1500, nghs.len(), |_, ngh, _| ngh % 2 == 0);
    assert_eq!(first, 1500);
    let second = pack::<Empty, _>(&mut bytes, 1500, first, |_, ngh, _| ngh % 4 == 0);
    assert_eq!(second, 750);
    let expected: Vec<(VertexId, Empty)> = (0..750).map(|i| (4 * i, Empty)).collect();
    assert_eq!(decoded::<Empty>(&bytes, 1500, second), expected);
}

#[test]
fn test_random_pack_matches_reference() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..20 {
        let degree = rng.random_range(1..4000);
        let nghs = random_nghs(&mut rng, degree, 1 << 20);
        let source = rng.random_range(0..1 << 20);
        let mut bytes = encode(source, &nghs);
        let threshold = rng.random_range(0..1 << 20);
        let surviving =
            pack::<i32, _>(&mut bytes, source, degree, |_, ngh, _| ngh < threshold);
        let expected: Vec<(VertexId, i32)> = nghs
            .iter()
            .copied()
            .filter(|&(ngh, _)| ngh < threshold)
            .collect();
        assert_eq!(surviving, expected.len());
        assert_eq!(decoded::<i32>(&bytes, source, surviving), expected);
    }
}
