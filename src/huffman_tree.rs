//! Canonical, length-limited Huffman tree construction for Huff0.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::error::{Error, Result};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub const HUF_MAX_NB_BITS: u8 = 16;
pub const HUF_DEFAULT_MAX_NB_BITS: u8 = 12;

#[derive(Debug, Clone)]
pub struct HuffmanTree {
    /// Code length in bits, 0 for a symbol absent from the histogram.
    pub nb_bits: Vec<u8>,
    /// Canonical code value, meaningful only where `nb_bits[s] > 0`.
    pub codes: Vec<u16>,
    pub max_symbol_value: usize,
    pub max_nb_bits: u8,
}

struct Node {
    weight: u64,
    parent: Option<usize>,
}

/// Build a canonical Huffman tree over `count` (indexed by symbol,
/// length `max_symbol_value + 1`), limited to `max_nb_bits` per code.
pub fn build(count: &[usize], max_nb_bits: u8) -> Result<HuffmanTree> {
    if !(1..=HUF_MAX_NB_BITS).contains(&max_nb_bits) {
        return Err(Error::BadArgument("huffman max_nb_bits out of [1, 16]"));
    }
    let max_symbol_value = count.len().saturating_sub(1);
    let present: Vec<(usize, usize)> = count
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c > 0)
        .map(|(s, &c)| (s, c))
        .collect();
    if present.is_empty() {
        return Err(Error::BadArgument("cannot build a huffman tree over an empty histogram"));
    }

    let mut nb_bits = vec![0u8; count.len()];

    if present.len() == 1 {
        nb_bits[present[0].0] = 1;
        return Ok(HuffmanTree {
            codes: assign_canonical_codes(&nb_bits, 1),
            nb_bits,
            max_symbol_value,
            max_nb_bits: 1,
        });
    }

    let mut nodes: Vec<Node> = present
        .iter()
        .map(|&(_, c)| Node { weight: c as u64, parent: None })
        .collect();
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> =
        nodes.iter().enumerate().map(|(i, n)| Reverse((n.weight, i))).collect();

    while heap.len() > 1 {
        let Reverse((w1, i1)) = heap.pop().unwrap();
        let Reverse((w2, i2)) = heap.pop().unwrap();
        let new_idx = nodes.len();
        nodes.push(Node { weight: w1 + w2, parent: None });
        nodes[i1].parent = Some(new_idx);
        nodes[i2].parent = Some(new_idx);
        heap.push(Reverse((w1 + w2, new_idx)));
    }

    for (leaf_idx, &(sym, _)) in present.iter().enumerate() {
        let mut depth = 0u32;
        let mut cur = leaf_idx;
        while let Some(p) = nodes[cur].parent {
            depth += 1;
            cur = p;
        }
        nb_bits[sym] = depth.min(HUF_MAX_NB_BITS as u32) as u8;
    }

    enforce_max_nb_bits(&mut nb_bits, &present, max_nb_bits)?;

    let codes = assign_canonical_codes(&nb_bits, max_nb_bits);
    Ok(HuffmanTree {
        nb_bits,
        codes,
        max_symbol_value,
        max_nb_bits,
    })
}

/// Clamp any code deeper than `max_nb_bits` and pay back the resulting
/// Kraft-sum excess by lengthening shallower codes, starting from the
/// deepest still-legal rank (cheapest payback per step) and working up.
fn enforce_max_nb_bits(nb_bits: &mut [u8], present: &[(usize, usize)], max_nb_bits: u8) -> Result<()> {
    let largest_bits = present.iter().map(|&(s, _)| nb_bits[s]).max().unwrap_or(0);
    if largest_bits <= max_nb_bits {
        return Ok(());
    }

    let base_cost: i64 = 1 << (largest_bits - max_nb_bits);
    let mut total_cost: i64 = 0;
    for &(s, _) in present {
        if nb_bits[s] > max_nb_bits {
            total_cost += base_cost - (1i64 << (largest_bits - nb_bits[s]));
            nb_bits[s] = max_nb_bits;
        }
    }
    total_cost >>= largest_bits - max_nb_bits;

    loop {
        if total_cost <= 0 {
            break;
        }
        let mut progressed = false;
        for depth in (1..max_nb_bits).rev() {
            if total_cost <= 0 {
                break;
            }
            if let Some(&(s, _)) = present.iter().find(|&&(s, _)| nb_bits[s] == depth) {
                let pay = 1i64 << (max_nb_bits - depth - 1);
                nb_bits[s] = depth + 1;
                total_cost -= pay;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    if total_cost != 0 {
        return Err(Error::CorruptedStream(
            "huffman tree could not be length-limited to an exact prefix code",
        ));
    }
    Ok(())
}

/// Canonical code assignment: walk ranks from `max_nb_bits` down to 1,
/// deriving each rank's starting code from the rank above
/// (`start(L-1) = (start(L) + count(L)) / 2`), then hand out consecutive
/// values within a rank in ascending symbol order.
pub(crate) fn assign_canonical_codes(nb_bits: &[u8], max_nb_bits: u8) -> Vec<u16> {
    let ranks = max_nb_bits as usize + 1;
    let mut count_per_rank = vec![0u32; ranks + 1];
    for &b in nb_bits {
        if b > 0 {
            count_per_rank[b as usize] += 1;
        }
    }
    let mut next_per_rank = vec![0u32; ranks + 1];
    let mut min = 0u32;
    for l in (1..=max_nb_bits as usize).rev() {
        next_per_rank[l] = min;
        min = (min + count_per_rank[l]) >> 1;
    }

    let mut codes = vec![0u16; nb_bits.len()];
    for (s, &b) in nb_bits.iter().enumerate() {
        if b > 0 {
            codes[s] = next_per_rank[b as usize] as u16;
            next_per_rank[b as usize] += 1;
        }
    }
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify_kraft(tree: &HuffmanTree) {
        let sum: f64 = tree.nb_bits.iter().filter(|&&b| b > 0).map(|&b| 2f64.powi(-(b as i32))).sum();
        assert!((sum - 1.0).abs() < 1e-9, "kraft sum {sum} != 1");
    }

    fn verify_prefix_free(tree: &HuffmanTree) {
        let bitstrings: Vec<String> = tree
            .nb_bits
            .iter()
            .zip(tree.codes.iter())
            .filter(|&(&b, _)| b > 0)
            .map(|(&b, &c)| format!("{:0width$b}", c, width = b as usize))
            .collect();
        for i in 0..bitstrings.len() {
            for j in 0..bitstrings.len() {
                if i == j {
                    continue;
                }
                assert!(
                    !bitstrings[j].starts_with(&bitstrings[i]),
                    "{} is a prefix of {}",
                    bitstrings[i],
                    bitstrings[j]
                );
            }
        }
    }

    #[test]
    fn builds_a_valid_prefix_code_for_a_skewed_histogram() {
        let count = vec![100, 1, 1, 1, 1, 1, 1, 1];
        let tree = build(&count, 12).unwrap();
        verify_kraft(&tree);
        verify_prefix_free(&tree);
        assert!(tree.nb_bits[0] < tree.nb_bits[1]);
    }

    #[test]
    fn single_symbol_gets_one_bit() {
        let count = vec![0, 42, 0];
        let tree = build(&count, 12).unwrap();
        assert_eq!(tree.nb_bits[1], 1);
    }

    #[test]
    fn enforces_max_nb_bits_on_highly_skewed_input() {
        // Fibonacci-like counts push naive Huffman depth past a tight cap.
        let mut count = vec![1usize; 40];
        let mut a = 1usize;
        let mut b = 1usize;
        for c in count.iter_mut() {
            *c = a;
            let next = a + b;
            a = b;
            b = next;
        }
        let tree = build(&count, 6).unwrap();
        verify_kraft(&tree);
        assert!(tree.nb_bits.iter().all(|&b| b as u8 <= 6));
    }

    #[test]
    fn rejects_empty_histogram() {
        assert!(build(&[0, 0, 0], 12).is_err());
    }
}
