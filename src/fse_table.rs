//! Build the encode (`CTable`) and decode (`DTable`) tables from a
//! normalized distribution, both derived from the same `spreads::spread`
//! permutation.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::error::Result;
use crate::spreads::spread;

/// Per-symbol encoding descriptor: how many bits a state emits before
/// transitioning, and where in `CTable::state_table` to look up the
/// transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolTransform {
    pub delta_find_state: i32,
    pub max_state: u32,
    pub min_bits_out: u8,
}

#[derive(Debug, Clone)]
pub struct CTable {
    pub table_log: usize,
    /// Indexed by `(state >> nb_bits) + symbol_tt[sym].delta_find_state`;
    /// holds the raw next state, already offset into `[T, 2T)`.
    pub state_table: Vec<u32>,
    pub symbol_tt: Vec<SymbolTransform>,
}

/// Build the encode table: for every symbol, where its block of states
/// starts (`cumul`) and how the spread assigned them determine both the
/// `state_table` transition and the per-symbol bit-count descriptor.
pub fn build_ctable(norm: &[i32], table_log: usize) -> Result<CTable> {
    let (table_symbol, _high_threshold) = spread(norm, table_log)?;
    let table_size = 1usize << table_log;

    let mut cumul = vec![0i32; norm.len() + 1];
    for s in 0..norm.len() {
        cumul[s + 1] = cumul[s] + norm[s].unsigned_abs() as i32;
    }

    let mut next_pos = cumul.clone();
    let mut state_table = vec![0u32; table_size];
    for (i, &sym) in table_symbol.iter().enumerate() {
        let sym = sym as usize;
        let pos = next_pos[sym] as usize;
        state_table[pos] = (table_size + i) as u32;
        next_pos[sym] += 1;
    }

    let mut symbol_tt = Vec::with_capacity(norm.len());
    for (s, &n) in norm.iter().enumerate() {
        let transform = match n {
            0 => SymbolTransform::default(),
            -1 | 1 => SymbolTransform {
                delta_find_state: cumul[s] - 1,
                max_state: (2 * table_size - 1) as u32,
                min_bits_out: table_log as u8,
            },
            n => {
                let n = n as u32;
                let hb = 31 - (n - 1).leading_zeros(); // floor(log2(n - 1))
                let min_bits_out = table_log as u32 - hb - 1;
                let max_state = ((n as u64) << (min_bits_out + 1)) - 1;
                SymbolTransform {
                    delta_find_state: cumul[s] - n as i32,
                    max_state: max_state as u32,
                    min_bits_out: min_bits_out as u8,
                }
            }
        };
        symbol_tt.push(transform);
    }

    Ok(CTable {
        table_log,
        state_table,
        symbol_tt,
    })
}

/// One decode-table slot: the symbol that state lands on, how many bits
/// to pull from the stream, and the baseline to add them to.
#[derive(Debug, Clone, Copy, Default)]
pub struct DTableEntry {
    pub symbol: u16,
    pub nb_bits: u8,
    pub new_state: u32,
}

#[derive(Debug, Clone)]
pub struct DTable {
    pub table_log: usize,
    pub entries: Vec<DTableEntry>,
    /// True when every symbol's maximum visit counter stayed below
    /// `table_size / 2`, i.e. `nb_bits >= 2` everywhere. A decode loop
    /// can use this to skip a `nb_bits == 0` special case.
    pub no_large: bool,
}

/// Build the decode table: walk the same spread in table-index order,
/// assigning each visit of a symbol the next rank in its own visit
/// sequence (`next_counter`, seeded with the symbol's normalized count,
/// not zero — this keeps the ascending bit-count property that makes
/// the single-table FSE decoder correct).
pub fn build_dtable(norm: &[i32], table_log: usize) -> Result<DTable> {
    let (table_symbol, _high_threshold) = spread(norm, table_log)?;
    let table_size = 1usize << table_log;

    let mut next_counter: Vec<u32> = norm.iter().map(|&n| n.unsigned_abs()).collect();
    let mut entries = Vec::with_capacity(table_size);
    let mut max_counter = 0u32;

    for &sym in &table_symbol {
        let counter = next_counter[sym as usize];
        next_counter[sym as usize] += 1;
        max_counter = max_counter.max(counter);

        let hb = 31 - counter.leading_zeros(); // floor(log2(counter)), counter >= 1
        let nb_bits = table_log as u32 - hb;
        let new_state = (counter << nb_bits) - table_size as u32;
        entries.push(DTableEntry {
            symbol: sym,
            nb_bits: nb_bits as u8,
            new_state,
        });
    }

    Ok(DTable {
        table_log,
        entries,
        no_large: max_counter < (table_size as u32 / 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm_abc() -> Vec<i32> {
        // A=7, B=6, C=3, table_log=4 — same distribution as the spread tests.
        vec![7, 6, 3]
    }

    #[test]
    fn ctable_state_table_covers_every_state_once() {
        let ct = build_ctable(&norm_abc(), 4).unwrap();
        let table_size = 1usize << 4;
        let mut seen = vec![false; table_size];
        for &state in &ct.state_table {
            let idx = state as usize - table_size;
            assert!(!seen[idx], "state {state} assigned twice");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn dtable_nb_bits_are_sane() {
        let dt = build_dtable(&norm_abc(), 4).unwrap();
        assert_eq!(dt.entries.len(), 16);
        for e in &dt.entries {
            assert!(e.nb_bits as usize <= 4);
        }
    }

    #[test]
    fn low_probability_symbol_gets_full_tablelog_bits() {
        let norm = vec![14i32, -1, -1];
        let dt = build_dtable(&norm, 4).unwrap();
        let ct = build_ctable(&norm, 4).unwrap();
        assert_eq!(ct.symbol_tt[1].min_bits_out, 4);
        assert_eq!(ct.symbol_tt[2].min_bits_out, 4);
        // The low-probability entries sit at the high end of the table.
        assert_eq!(dt.entries[15].symbol, 1);
        assert_eq!(dt.entries[14].symbol, 2);
        assert_eq!(dt.entries[15].nb_bits, 4);
    }
}
