//! Unified error taxonomy shared by every stage of the codec.
//!
//! Implémentation de final-state-rs, tenter d'implémenter FSE en Rust.
//! Author: Adrien Zinger, avec l'inspiration du travail de Jarek Duda,
//!         Yann Collet, Charles Bloom et bien d'autres.

use thiserror::Error;

/// Every public entry point returns this union; internal helpers do too,
/// so an error bubbles to the top-level `compress`/`decompress` call
/// untouched. No partial output is ever claimed on error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A configuration parameter (table_log, max_symbol_value, max_nb_bits...)
    /// is out of the range the algorithm accepts.
    #[error("bad argument: {0}")]
    BadArgument(&'static str),

    /// The destination buffer cannot hold the output.
    #[error("destination buffer too small: need at least {needed} bytes, have {available}")]
    DstTooSmall { needed: usize, available: usize },

    /// The input is shorter than the framing it claims to have.
    #[error("source size wrong: {0}")]
    SrcSizeWrong(&'static str),

    /// A decode-path sanity check failed: malformed header, a spread
    /// that didn't close, leftover bits after decode, a reserved mode
    /// byte, and so on.
    #[error("corrupted stream: {0}")]
    CorruptedStream(&'static str),

    /// Catch-all for a downstream failure that doesn't carry its own
    /// specific kind.
    #[error("generic entropy coder error: {0}")]
    GenericError(&'static str),
}
