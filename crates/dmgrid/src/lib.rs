//! dmgrid — pure-Rust Data Matrix (ECC200) reader.
//!
//! Decodes one or more ECC200 symbols from a grayscale raster image. The
//! pipeline stages are:
//!
//! 1. **Preprocess** – median smoothing, fixed/adaptive binarization,
//!    contour extraction, with four retryable conditioning policies.
//! 2. **Locate** – L-finder detection (orthogonal fast path + rotated
//!    vote-based path), quiet-zone verification, dashed-side tracking,
//!    two-pass perspective rectification.
//! 3. **Grid** – timing-side trimming, module counting, line-grid fitting
//!    and per-module classification into a bit grid.
//! 4. **Codewords** – alignment-pattern removal and the ECC200 "Utah"
//!    placement traversal.
//! 5. **Reed–Solomon** – table-driven GF(2⁸) correction, with block
//!    de-interleaving for the large symbol sizes.
//! 6. **Payload** – the ECC200 encoding-mode state machine (ASCII, C40,
//!    Text, X12, EDIFACT, Base256).
//!
//! # Public API
//! [`Decoder`] and [`DecodeConfig`] are the primary entry points; the
//! stage modules are exposed for tooling and tests, while the locator's
//! geometry internals stay private.

pub mod api;
pub mod codewords;
pub mod gf256;
pub mod grid;
mod locate;
pub mod matrix;
pub mod payload;
pub mod preprocess;
pub mod reed_solomon;
pub mod symbol;

pub use api::{DecodeConfig, DecodeOutcome, DecodedSymbol, Decoder, SymbolError};
pub use matrix::BitGrid;
pub use preprocess::{BinarizeMethod, PreprocessConfig};
pub use symbol::{find_spec, SymbolSpec, SYMBOL_SPECS};
