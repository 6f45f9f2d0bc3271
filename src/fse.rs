//! The FSE symbol coder itself: turn a byte stream and a `CTable` into a
//! compressed bitstream, and invert that with a `DTable`.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::bitstream::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::fse_table::{CTable, DTable};

#[inline]
fn transition_bits(ct: &CTable, sym: usize, state: u32) -> u32 {
    let tt = &ct.symbol_tt[sym];
    let extra = if state > tt.max_state { 1 } else { 0 };
    tt.min_bits_out as u32 + extra
}

#[inline]
fn transition(ct: &CTable, sym: usize, state: u32, nb_bits: u32) -> u32 {
    ct.state_table[((state >> nb_bits) as i64 + ct.symbol_tt[sym].delta_find_state as i64) as usize]
}

/// Single-state encoder: the straightforward version of §4.6, walking
/// `src` back to front with one running state.
pub fn encode_1state(src: &[u8], ct: &CTable) -> Result<Vec<u8>> {
    if src.is_empty() {
        return Ok(BitWriter::new().close_c_stream(1));
    }
    let table_size = 1u32 << ct.table_log;
    let mut w = BitWriter::new();
    let mut state = table_size;

    for &b in src.iter().rev() {
        let sym = b as usize;
        let nb_bits = transition_bits(ct, sym, state);
        w.add_bits(state as u64, nb_bits);
        w.flush_bits();
        state = transition(ct, sym, state, nb_bits);
    }
    w.add_bits(state as u64, ct.table_log as u32);
    Ok(w.close_c_stream(1))
}

pub fn decode_1state(buf: &[u8], dt: &DTable, original_size: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; original_size];
    if original_size == 0 {
        return Ok(out);
    }
    let (mut r, streams) = BitReader::new(buf)?;
    if streams != 1 {
        return Err(Error::CorruptedStream("expected a single-state fse stream"));
    }
    let mut state = r.read_bits(dt.table_log as u32)? as usize;

    for slot in out.iter_mut() {
        let entry = dt.entries[state];
        *slot = entry.symbol as u8;
        let low_bits = r.read_bits(entry.nb_bits as u32)? as u32;
        state = (entry.new_state + low_bits) as usize;
    }
    if !r.is_empty() {
        return Err(Error::CorruptedStream("fse stream has trailing bits after decode"));
    }
    Ok(out)
}

/// 2-state interleaved encoder: halves the serial dependency chain on
/// decode by alternating which of two states absorbs each symbol.
pub fn encode_2state(src: &[u8], ct: &CTable) -> Result<Vec<u8>> {
    if src.len() < 2 {
        return encode_1state(src, ct);
    }
    let table_size = 1u32 << ct.table_log;
    let mut w = BitWriter::new();
    let mut state1 = table_size;
    let mut state2 = table_size;

    // Pair up (src[n-1], src[n-2]), (src[n-3], src[n-4]), ... from the
    // back; state2 always takes the higher index of a pair, state1 the
    // lower. An odd length leaves src[0] unpaired: it is encoded last,
    // alone, into state1, so it is the first symbol a decoder peels off
    // state1's chain and lands in out[0].
    let odd_tail = src.len() % 2 == 1;
    let paired = if odd_tail { &src[1..] } else { src };

    let mut iter = paired.iter().rev();
    while let (Some(&b2), Some(&b1)) = (iter.next(), iter.next()) {
        let sym2 = b2 as usize;
        let nb2 = transition_bits(ct, sym2, state2);
        w.add_bits(state2 as u64, nb2);
        state2 = transition(ct, sym2, state2, nb2);

        let sym1 = b1 as usize;
        let nb1 = transition_bits(ct, sym1, state1);
        w.add_bits(state1 as u64, nb1);
        state1 = transition(ct, sym1, state1, nb1);

        w.flush_bits();
    }

    if odd_tail {
        let sym = src[0] as usize;
        let nb = transition_bits(ct, sym, state1);
        w.add_bits(state1 as u64, nb);
        state1 = transition(ct, sym, state1, nb);
        w.flush_bits();
    }

    w.add_bits(state2 as u64, ct.table_log as u32);
    w.add_bits(state1 as u64, ct.table_log as u32);
    Ok(w.close_c_stream(2))
}

pub fn decode_2state(buf: &[u8], dt: &DTable, original_size: usize) -> Result<Vec<u8>> {
    if original_size < 2 {
        return decode_1state(buf, dt, original_size);
    }
    let (mut r, streams) = BitReader::new(buf)?;
    if streams != 2 {
        return Err(Error::CorruptedStream("expected a 2-state interleaved fse stream"));
    }
    let mut state1 = r.read_bits(dt.table_log as u32)? as usize;
    let mut state2 = r.read_bits(dt.table_log as u32)? as usize;

    let mut out = vec![0u8; original_size];
    let odd_tail = original_size % 2 == 1;
    let pairs = original_size / 2;
    let mut idx = 0usize;

    if odd_tail {
        let entry = dt.entries[state1];
        out[idx] = entry.symbol as u8;
        idx += 1;
        let low_bits = r.read_bits(entry.nb_bits as u32)? as u32;
        state1 = (entry.new_state + low_bits) as usize;
    }

    for _ in 0..pairs {
        let e1 = dt.entries[state1];
        out[idx] = e1.symbol as u8;
        idx += 1;
        let low1 = r.read_bits(e1.nb_bits as u32)? as u32;
        state1 = (e1.new_state + low1) as usize;

        let e2 = dt.entries[state2];
        out[idx] = e2.symbol as u8;
        idx += 1;
        let low2 = r.read_bits(e2.nb_bits as u32)? as u32;
        state2 = (e2.new_state + low2) as usize;
    }

    if !r.is_empty() {
        return Err(Error::CorruptedStream("fse stream has trailing bits after decode"));
    }
    Ok(out)
}

/// One segment of a 4-way interleaved block: independent lengths, each
/// compressed with the single-state encoder, so 4 cores can decode in
/// parallel. Used by Huff0 and by FSE itself once a block is large
/// enough to amortize the jump table's overhead.
pub fn split_into_segments(len: usize) -> [std::ops::Range<usize>; 4] {
    let seg = len.div_ceil(4);
    let s0 = 0..seg.min(len);
    let s1 = s0.end..(2 * seg).min(len);
    let s2 = s1.end..(3 * seg).min(len);
    let s3 = s2.end..len;
    [s0, s1, s2, s3]
}
