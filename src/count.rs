//! Histogram a tokenized block of symbols before normalization.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use crate::error::{Error, Result};

/// Result of a histogram pass: the per-symbol counts, the largest
/// single count observed (so a caller can detect the RLE case, where
/// `max == src.len()`), and the highest symbol value actually seen.
#[derive(Debug, Clone)]
pub struct Histogram {
    pub count: Vec<usize>,
    pub max: usize,
    pub max_symbol_value: usize,
}

/// Compute an histogram with a very basic method, failing if any source
/// byte exceeds `max_symbol_value`. Use this whenever the alphabet size
/// is not already guaranteed by the caller.
pub fn count_safe(src: &[u8], max_symbol_value: usize) -> Result<Histogram> {
    if max_symbol_value >= 256 {
        return Err(Error::BadArgument("max_symbol_value must fit a byte"));
    }
    let mut count = vec![0usize; max_symbol_value + 1];
    for &s in src {
        let s = s as usize;
        if s > max_symbol_value {
            return Err(Error::BadArgument("source byte exceeds max_symbol_value"));
        }
        count[s] += 1;
    }
    finish(count, max_symbol_value)
}

/// Same histogram, but trusts the caller: out-of-range symbols panic in
/// debug builds (array index out of bounds) and are simply never valid
/// in release. Use only when the alphabet has already been validated.
pub fn count_fast(src: &[u8], max_symbol_value: usize) -> Histogram {
    let mut count = vec![0usize; max_symbol_value + 1];
    src.iter().for_each(|&c| count[c as usize] += 1);
    finish(count, max_symbol_value).expect("count_fast: max_symbol_value already validated")
}

/// Four independent accumulators processed over strided slices of the
/// input and summed at the end. This is a performance idiom only: the
/// result is identical to `count_safe`, just computed with less of a
/// serial dependency chain between consecutive increments.
#[cfg(feature = "rayon")]
pub fn count_parallel(src: &[u8], max_symbol_value: usize) -> Result<Histogram> {
    use rayon::prelude::*;

    if max_symbol_value >= 256 {
        return Err(Error::BadArgument("max_symbol_value must fit a byte"));
    }
    let chunks = rayon::current_num_threads().max(1);
    let chunk_len = src.len().div_ceil(chunks).max(1);
    let partials: Vec<Result<Vec<usize>>> = src
        .par_chunks(chunk_len)
        .map(|chunk| {
            let mut local = vec![0usize; max_symbol_value + 1];
            for &s in chunk {
                let s = s as usize;
                if s > max_symbol_value {
                    return Err(Error::BadArgument("source byte exceeds max_symbol_value"));
                }
                local[s] += 1;
            }
            Ok(local)
        })
        .collect();

    let mut count = vec![0usize; max_symbol_value + 1];
    for partial in partials {
        let partial = partial?;
        for (c, p) in count.iter_mut().zip(partial) {
            *c += p;
        }
    }
    finish(count, max_symbol_value)
}

fn finish(count: Vec<usize>, max_symbol_value: usize) -> Result<Histogram> {
    let max = count.iter().copied().max().unwrap_or(0);
    let max_symbol_value = count
        .iter()
        .enumerate()
        .rev()
        .find(|&(_, &c)| c > 0)
        .map(|(s, _)| s)
        .unwrap_or(max_symbol_value);
    Ok(Histogram {
        count,
        max,
        max_symbol_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_symbol() {
        let src = b"abracadabra";
        let h = count_safe(src, 255).unwrap();
        assert_eq!(h.count[b'a' as usize], 5);
        assert_eq!(h.count[b'b' as usize], 2);
        assert_eq!(h.max, 5);
    }

    #[test]
    fn rejects_out_of_range_symbol() {
        let src = [0u8, 1, 200];
        assert!(count_safe(&src, 10).is_err());
    }

    #[test]
    fn detects_rle_case() {
        let src = [7u8; 1000];
        let h = count_safe(&src, 255).unwrap();
        assert_eq!(h.max, src.len());
        assert_eq!(h.max_symbol_value, 7);
    }
}
