//! Huff0: canonical Huffman coding sharing the FSE bitstream and the
//! weight-array tree header, per-segment, with a direct lookup table on
//! decode.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::bitstream::{BitReader, BitWriter};
use crate::count;
use crate::error::{Error, Result};
use crate::fse;
use crate::fse_table;
use crate::header;
use crate::huffman_tree::{self, HuffmanTree, HUF_DEFAULT_MAX_NB_BITS};
use crate::normalization::{self, NormalizeOutcome};

#[derive(Debug, Clone)]
pub struct HuffCTable {
    pub tree: HuffmanTree,
}

/// A decode table slot. `symbol1`/`nb_bits1` alone are always valid (the
/// ordinary single-symbol lookup); when `length == 2`, `symbol2`/
/// `nb_bits2` describe a second code that immediately follows within the
/// same `dt_log`-bit window, so one lookup can emit two bytes.
#[derive(Debug, Clone, Copy, Default)]
struct DEntry {
    symbol1: u8,
    nb_bits1: u8,
    symbol2: u8,
    nb_bits2: u8,
    length: u8,
}

#[derive(Debug, Clone)]
pub struct HuffDTable {
    dt_log: u8,
    entries: Vec<DEntry>,
}

pub fn build_ctable(count: &[usize], max_nb_bits: u8) -> Result<HuffCTable> {
    let tree = huffman_tree::build(count, max_nb_bits)?;
    Ok(HuffCTable { tree })
}

/// Builds a double-symbol decode table (`fillDTableLevel2`-style): a
/// symbol's code occupies the top `nb_bits` bits of a `dt_log`-bit
/// window, broadcast across every value of the remaining low bits. A
/// second pass looks at those remaining low bits through the same
/// span-broadcast rule (reached by padding them into a full-width probe
/// against the already-built level-1 table) and, whenever a second code
/// fits entirely inside what's left, folds it into the same slot so one
/// lookup can emit two bytes instead of one.
pub fn build_dtable(tree: &HuffmanTree) -> HuffDTable {
    let dt_log = tree.max_nb_bits;
    let table_size = 1usize << dt_log;
    let mut entries = vec![DEntry::default(); table_size];
    for (s, &nb_bits) in tree.nb_bits.iter().enumerate() {
        if nb_bits == 0 {
            continue;
        }
        let code = tree.codes[s] as usize;
        let span = 1usize << (dt_log - nb_bits);
        let base = code << (dt_log - nb_bits);
        for slot in entries.iter_mut().skip(base).take(span) {
            *slot = DEntry { symbol1: s as u8, nb_bits1: nb_bits, symbol2: 0, nb_bits2: 0, length: 1 };
        }
    }

    let level1 = entries.clone();
    for (s1, &nb_bits1) in tree.nb_bits.iter().enumerate() {
        if nb_bits1 == 0 || nb_bits1 >= dt_log {
            continue;
        }
        let code1 = tree.codes[s1] as usize;
        let leftover = dt_log - nb_bits1;
        let span1 = 1usize << leftover;
        let base1 = code1 << leftover;
        for local in 0..span1 {
            let probe = local << nb_bits1;
            let second = level1[probe];
            if second.nb_bits1 == 0 || second.nb_bits1 > leftover {
                // Doesn't fit entirely inside what's left of the window;
                // keep the level-1 single-symbol fallback for this slot.
                continue;
            }
            entries[base1 + local] = DEntry {
                symbol1: s1 as u8,
                nb_bits1,
                symbol2: second.symbol1,
                nb_bits2: second.nb_bits1,
                length: 2,
            };
        }
    }

    HuffDTable { dt_log, entries }
}

/// Encode `src` against a prebuilt table. Symbols are pushed back to
/// front, mirroring the FSE encoder, so the shared backward bit reader
/// recovers them in original order.
pub fn encode(src: &[u8], ct: &HuffCTable) -> Result<Vec<u8>> {
    let mut w = BitWriter::new();
    for &b in src.iter().rev() {
        let nb_bits = ct.tree.nb_bits[b as usize];
        if nb_bits == 0 {
            return Err(Error::BadArgument("source byte has no assigned huffman code"));
        }
        w.add_bits(ct.tree.codes[b as usize] as u64, nb_bits as u32);
        w.flush_bits();
    }
    Ok(w.close_c_stream(1))
}

/// Peek a `dt_log`-bit lookup window, padding with zero low bits when
/// fewer than `dt_log` bits remain in the stream. Safe because a slot's
/// decode only ever depends on its top bits (the real code); the low
/// bits are "don't care" padding broadcast across during table build,
/// exactly the same reasoning `build_dtable`'s level-2 probe relies on.
fn peek_window(r: &BitReader, dt_log: u32) -> Result<usize> {
    let available = r.available_bits() as u32;
    if available >= dt_log {
        Ok(r.look_bits(dt_log)? as usize)
    } else if available == 0 {
        Err(Error::CorruptedStream("huff0 stream exhausted before expected end"))
    } else {
        let partial = r.look_bits(available)? as usize;
        Ok(partial << (dt_log - available))
    }
}

pub fn decode(buf: &[u8], dt: &HuffDTable, original_size: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(original_size);
    if original_size == 0 {
        return Ok(out);
    }
    let (mut r, streams) = BitReader::new(buf)?;
    if streams != 1 {
        return Err(Error::CorruptedStream("expected a single huff0 stream"));
    }

    // Bulk phase: each lookup may emit one or two bytes. Stop two bytes
    // short of the end so a two-symbol slot can never overrun the output;
    // the last byte (or two, for an odd tail) falls through to the
    // single-symbol phase below.
    while out.len() + 2 <= original_size {
        let window = peek_window(&r, dt.dt_log as u32)?;
        let entry = dt.entries[window];
        if entry.nb_bits1 == 0 {
            return Err(Error::CorruptedStream("huff0 decode table has a hole at this prefix"));
        }
        out.push(entry.symbol1);
        if entry.length == 2 {
            out.push(entry.symbol2);
            r.read_bits((entry.nb_bits1 + entry.nb_bits2) as u32)?;
        } else {
            r.read_bits(entry.nb_bits1 as u32)?;
        }
    }

    while out.len() < original_size {
        let window = peek_window(&r, dt.dt_log as u32)?;
        let entry = dt.entries[window];
        if entry.nb_bits1 == 0 {
            return Err(Error::CorruptedStream("huff0 decode table has a hole at this prefix"));
        }
        out.push(entry.symbol1);
        r.read_bits(entry.nb_bits1 as u32)?;
    }

    if !r.is_empty() {
        return Err(Error::CorruptedStream("huff0 stream has trailing bits after decode"));
    }
    Ok(out)
}

const RLE_LENGTHS: [usize; 14] = [1, 2, 3, 4, 7, 8, 15, 16, 31, 32, 63, 64, 127, 128];

fn direct_pack(weights: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(weights.len().div_ceil(2));
    for pair in weights.chunks(2) {
        let lo = pair[0] & 0xF;
        let hi = pair.get(1).copied().unwrap_or(0) & 0xF;
        out.push(lo | (hi << 4));
    }
    out
}

fn direct_unpack(buf: &[u8], count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let byte = buf[i / 2];
        let nibble = if i % 2 == 0 { byte & 0xF } else { byte >> 4 };
        out.push(nibble);
    }
    out
}

/// Serialize a Huff0 tree as a weight array (`weight = maxNbBits + 1 -
/// nbBits`, 0 for absent symbols), selecting the smallest of: a
/// single repeated value, a short run-length code, an FSE-compressed
/// stream, or a direct 4-bit packing.
pub fn write_tree_header(tree: &HuffmanTree) -> Result<Vec<u8>> {
    let weights: Vec<u8> = tree
        .nb_bits
        .iter()
        .map(|&b| if b == 0 { 0 } else { tree.max_nb_bits + 1 - b })
        .collect();

    if weights.iter().all(|&w| w == weights[0]) {
        return Ok(vec![0u8, weights[0]]);
    }

    if let Some(first) = weights.iter().position(|&w| w != 0) {
        let w = weights[first];
        let mut run = 0usize;
        while first + run < weights.len() && weights[first + run] == w {
            run += 1;
        }
        let rest_is_zero = weights[first + run..].iter().all(|&x| x == 0) && first == 0;
        if rest_is_zero {
            if let Some(code) = RLE_LENGTHS.iter().position(|&l| l == run) {
                return Ok(vec![1u8, w, code as u8]);
            }
        }
    }

    let direct = direct_pack(&weights);
    let mut best: Vec<u8> = {
        let mut out = vec![2u8];
        out.extend_from_slice(&direct);
        out
    };

    let max_symbol_value = 16usize;
    if let Ok(hist) = count::count_safe(&weights, max_symbol_value) {
        if let Ok(NormalizeOutcome::Normal { norm, table_log }) =
            normalization::normalize(&hist.count, weights.len(), 0)
        {
            if let (Ok(ctable), Ok(hdr)) =
                (fse_table::build_ctable(&norm, table_log), header::write_header(&norm, table_log))
            {
                if let Ok(payload) = fse::encode_1state(&weights, &ctable) {
                    let mut candidate = vec![3u8, hdr.len() as u8];
                    candidate.extend_from_slice(&hdr);
                    candidate.extend_from_slice(&payload);
                    if candidate.len() < best.len() {
                        best = candidate;
                    }
                }
            }
        }
    }

    Ok(best)
}

/// Mirror of `write_tree_header`; `max_symbol_value` must already be
/// known from the surrounding block framing.
pub fn read_tree_header(buf: &[u8], max_symbol_value: usize, max_nb_bits: u8) -> Result<HuffmanTree> {
    let symbol_count = max_symbol_value + 1;
    if buf.is_empty() {
        return Err(Error::CorruptedStream("empty huff0 tree header"));
    }
    let weights: Vec<u8> = match buf[0] {
        0 => {
            let w = *buf.get(1).ok_or(Error::CorruptedStream("truncated single-value huff0 header"))?;
            vec![w; symbol_count]
        }
        1 => {
            let w = *buf.get(1).ok_or(Error::CorruptedStream("truncated rle huff0 header"))?;
            let code = *buf.get(2).ok_or(Error::CorruptedStream("truncated rle huff0 header"))? as usize;
            let run = *RLE_LENGTHS
                .get(code)
                .ok_or(Error::CorruptedStream("huff0 header rle code out of range"))?;
            let mut weights = vec![0u8; symbol_count];
            for slot in weights.iter_mut().take(run.min(symbol_count)) {
                *slot = w;
            }
            weights
        }
        2 => direct_unpack(&buf[1..], symbol_count),
        3 => {
            let hdr_len = *buf.get(1).ok_or(Error::CorruptedStream("truncated fse huff0 header"))? as usize;
            let hdr_bytes = buf
                .get(2..2 + hdr_len)
                .ok_or(Error::CorruptedStream("truncated fse huff0 header"))?;
            let decoded = header::read_header(hdr_bytes, 16)?;
            let dtable = fse_table::build_dtable(&decoded.norm, decoded.table_log)?;
            let payload = &buf[2 + hdr_len..];
            fse::decode_1state(payload, &dtable, symbol_count)?
        }
        _ => return Err(Error::CorruptedStream("unknown huff0 tree header mode")),
    };

    let mut nb_bits = vec![0u8; symbol_count];
    for (s, &w) in weights.iter().enumerate() {
        if w > 0 {
            nb_bits[s] = max_nb_bits + 1 - w;
        }
    }
    let codes = huffman_tree::assign_canonical_codes(&nb_bits, max_nb_bits);
    Ok(HuffmanTree {
        nb_bits,
        codes,
        max_symbol_value,
        max_nb_bits,
    })
}

pub fn default_max_nb_bits() -> u8 {
    HUF_DEFAULT_MAX_NB_BITS
}

/// Full byte alphabet used by the standalone 4-segment block API below,
/// mirroring `block::BYTE_ALPHABET_MAX`: fixing it means the tree header
/// never needs to transmit it.
const BYTE_ALPHABET_MAX: usize = 255;
const JUMP_TABLE_BYTES: usize = 6;

/// A complete, self-framed Huff0 block: tree header, then the 4-segment
/// payload with its 6-byte jump table, so 4 segments can be decoded
/// independently. Standalone from `block`'s FSE-only mode dispatch.
pub fn compress(src: &[u8], max_nb_bits: u8) -> Result<Vec<u8>> {
    if src.is_empty() {
        return Ok(Vec::new());
    }
    let mut hist = vec![0usize; BYTE_ALPHABET_MAX + 1];
    for &b in src {
        hist[b as usize] += 1;
    }
    let ct = build_ctable(&hist, max_nb_bits)?;
    let tree_hdr = write_tree_header(&ct.tree)?;
    if tree_hdr.len() > u16::MAX as usize {
        return Err(Error::GenericError("huff0 tree header too large to frame"));
    }

    let segments = fse::split_into_segments(src.len());
    let mut seg_bytes: Vec<Vec<u8>> = Vec::with_capacity(4);
    for seg in &segments {
        if seg.is_empty() {
            seg_bytes.push(Vec::new());
        } else {
            seg_bytes.push(encode(&src[seg.clone()], &ct)?);
        }
    }
    for len in seg_bytes.iter().take(3).map(Vec::len) {
        if len > u16::MAX as usize {
            return Err(Error::GenericError("huff0 segment too large for its jump table slot"));
        }
    }

    let mut out = Vec::with_capacity(2 + tree_hdr.len() + JUMP_TABLE_BYTES + src.len());
    out.extend_from_slice(&(tree_hdr.len() as u16).to_le_bytes());
    out.extend_from_slice(&tree_hdr);
    for len in seg_bytes.iter().take(3).map(Vec::len) {
        out.extend_from_slice(&(len as u16).to_le_bytes());
    }
    for seg in &seg_bytes {
        out.extend_from_slice(seg);
    }
    Ok(out)
}

/// Mirror of `compress`. `original_size` and `max_nb_bits` travel out of
/// band, exactly as the underlying single-segment `decode` expects its
/// own `original_size`.
pub fn decompress(block: &[u8], original_size: usize, max_nb_bits: u8) -> Result<Vec<u8>> {
    if original_size == 0 {
        return Ok(Vec::new());
    }
    if block.len() < 2 {
        return Err(Error::SrcSizeWrong("huff0 block missing its tree header length"));
    }
    let hdr_len = u16::from_le_bytes([block[0], block[1]]) as usize;
    let hdr_bytes = block
        .get(2..2 + hdr_len)
        .ok_or(Error::SrcSizeWrong("huff0 block truncated before end of tree header"))?;
    let tree = read_tree_header(hdr_bytes, BYTE_ALPHABET_MAX, max_nb_bits)?;
    let dt = build_dtable(&tree);

    let jt_start = 2 + hdr_len;
    let jt = block
        .get(jt_start..jt_start + JUMP_TABLE_BYTES)
        .ok_or(Error::SrcSizeWrong("huff0 block truncated before jump table"))?;
    let l1 = u16::from_le_bytes([jt[0], jt[1]]) as usize;
    let l2 = u16::from_le_bytes([jt[2], jt[3]]) as usize;
    let l3 = u16::from_le_bytes([jt[4], jt[5]]) as usize;

    let payload = &block[jt_start + JUMP_TABLE_BYTES..];
    let p1 = payload
        .get(0..l1)
        .ok_or(Error::SrcSizeWrong("huff0 block truncated in segment 1"))?;
    let p2 = payload
        .get(l1..l1 + l2)
        .ok_or(Error::SrcSizeWrong("huff0 block truncated in segment 2"))?;
    let p3 = payload
        .get(l1 + l2..l1 + l2 + l3)
        .ok_or(Error::SrcSizeWrong("huff0 block truncated in segment 3"))?;
    let p4 = payload
        .get(l1 + l2 + l3..)
        .ok_or(Error::SrcSizeWrong("huff0 block truncated in segment 4"))?;

    let segments = fse::split_into_segments(original_size);
    let mut out = Vec::with_capacity(original_size);
    for (buf, range) in [p1, p2, p3, p4].into_iter().zip(segments.iter()) {
        if range.is_empty() {
            continue;
        }
        out.extend(decode(buf, &dt, range.len())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_for(src: &[u8]) -> (HuffCTable, HuffDTable) {
        let mut hist = vec![0usize; 256];
        for &b in src {
            hist[b as usize] += 1;
        }
        let ct = build_ctable(&hist, 12).unwrap();
        let dt = build_dtable(&ct.tree);
        (ct, dt)
    }

    #[test]
    fn round_trips_plain_text() {
        let src = b"the quick brown fox jumps over the lazy dog again and again and again";
        let (ct, dt) = build_for(src);
        let buf = encode(src, &ct).unwrap();
        let out = decode(&buf, &dt, src.len()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn four_segment_block_round_trips() {
        let src: Vec<u8> = (0..5000u32).map(|i| (i % 17) as u8).collect();
        let block = compress(&src, 12).unwrap();
        let out = decompress(&block, src.len(), 12).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn four_segment_block_round_trips_on_tiny_input() {
        let src = b"abc";
        let block = compress(src, 12).unwrap();
        let out = decompress(&block, src.len(), 12).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn four_segment_block_round_trips_on_empty_input() {
        let block = compress(&[], 12).unwrap();
        let out = decompress(&block, 0, 12).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn tree_header_round_trips() {
        let src = b"aaaaaaaaaaaabbbbbbbbbccccccccdddddddddeeeeeeeeeeeeeeeeeeeffff";
        let (ct, _) = build_for(src);
        let hdr = write_tree_header(&ct.tree).unwrap();
        let tree = read_tree_header(&hdr, ct.tree.max_symbol_value, ct.tree.max_nb_bits).unwrap();
        assert_eq!(tree.nb_bits, ct.tree.nb_bits);
        assert_eq!(tree.codes, ct.tree.codes);
    }

    #[test]
    fn single_symbol_stream_round_trips() {
        let src = [42u8; 64];
        let (ct, dt) = build_for(&src);
        let buf = encode(&src, &ct).unwrap();
        let out = decode(&buf, &dt, src.len()).unwrap();
        assert_eq!(out, src);
    }
}
