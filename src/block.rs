//! Block framing (C9): the mode byte that lets a compressor fall back
//! to raw or RLE storage whenever the FSE table wouldn't pay for itself.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::count;
use crate::error::{Error, Result};
use crate::fse;
use crate::fse_table;
use crate::header;
use crate::normalization::{self, NormalizeOutcome, FSE_MAX_TABLELOG};

pub const MODE_RAW: u8 = 0;
pub const MODE_RLE: u8 = 1;
pub const MODE_COMPRESSED: u8 = 2;
pub const MODE_RESERVED: u8 = 3;

/// Byte alphabet used by the block-level FSE coder. Fixed, so the
/// header never needs to transmit it: `write_header`/`read_header`
/// always see a 256-entry distribution (long trailing zero runs are
/// cheap thanks to the run-length escape in `header`).
const BYTE_ALPHABET_MAX: usize = 255;

pub fn compress_bound(n: usize) -> usize {
    n + (n >> 7) + 512
}

pub fn header_bound(max_symbol_value: usize, table_log: usize) -> usize {
    ((((max_symbol_value + 1) * table_log) >> 3) + 1).min(512)
}

/// Compress one block. Falls back to RLE when the histogram has a
/// single symbol, and to raw storage when the FSE-compressed form
/// wouldn't beat the input by more than a byte.
pub fn compress(src: &[u8]) -> Result<Vec<u8>> {
    if src.is_empty() {
        return Ok(vec![MODE_RAW]);
    }

    let hist = count::count_safe(src, BYTE_ALPHABET_MAX)?;
    if hist.max == src.len() {
        tracing::debug!(len = src.len(), "single-symbol block, emitting rle");
        return Ok(vec![MODE_RLE, src[0]]);
    }

    let total = src.len();
    let table_log = normalization::auto_table_log(total, hist.max_symbol_value, FSE_MAX_TABLELOG);
    let outcome = normalization::normalize(&hist.count, total, table_log)?;
    let (norm, table_log) = match outcome {
        NormalizeOutcome::Rle { symbol } => return Ok(vec![MODE_RLE, symbol as u8]),
        NormalizeOutcome::Normal { norm, table_log } => (norm, table_log),
    };

    let ctable = fse_table::build_ctable(&norm, table_log)?;
    let payload = fse::encode_2state(src, &ctable)?;
    let hdr = header::write_header(&norm, table_log)?;

    let mut compressed = Vec::with_capacity(1 + hdr.len() + payload.len());
    compressed.push(MODE_COMPRESSED);
    compressed.extend_from_slice(&hdr);
    compressed.extend_from_slice(&payload);

    if compressed.len() + 1 >= src.len() {
        tracing::debug!(
            len = src.len(),
            compressed = compressed.len(),
            "compressed block did not beat raw storage, falling back"
        );
        let mut raw = Vec::with_capacity(src.len() + 1);
        raw.push(MODE_RAW);
        raw.extend_from_slice(src);
        return Ok(raw);
    }

    tracing::debug!(len = src.len(), table_log, compressed = compressed.len(), "compressed block");
    Ok(compressed)
}

/// Decompress one block produced by `compress`. `original_size` travels
/// out of band, exactly as `decompress_usingDTable` expects it.
pub fn decompress(block: &[u8], original_size: usize) -> Result<Vec<u8>> {
    let mode = *block.first().ok_or(Error::SrcSizeWrong("empty block"))? & 0x3;

    match mode {
        MODE_RAW => {
            let payload = &block[1..];
            if payload.len() != original_size {
                return Err(Error::SrcSizeWrong("raw block length does not match originalSize"));
            }
            Ok(payload.to_vec())
        }
        MODE_RLE => {
            let symbol = *block.get(1).ok_or(Error::SrcSizeWrong("rle block missing its symbol byte"))?;
            Ok(vec![symbol; original_size])
        }
        MODE_COMPRESSED => {
            if original_size == 0 {
                return Ok(Vec::new());
            }
            let rest = &block[1..];
            let decoded = header::read_header(rest, BYTE_ALPHABET_MAX)?;
            let dtable = fse_table::build_dtable(&decoded.norm, decoded.table_log)?;
            let payload = rest
                .get(decoded.bytes_consumed..)
                .ok_or(Error::SrcSizeWrong("block shorter than its own header"))?;
            fse::decode_2state(payload, &dtable, original_size)
        }
        _ => Err(Error::CorruptedStream("block mode 3 is reserved")),
    }
}
