//! High-level decoding API.
//!
//! [`Decoder`] is the primary entry point. It wraps a [`DecodeConfig`] and
//! drives the whole pipeline: conditioning, symbol location, grid reading,
//! codeword assembly, Reed–Solomon correction and payload interpretation.
//! Up to four conditioning policies are tried in order until one pass
//! decodes at least one symbol.

use image::GrayImage;
use std::path::Path;

use crate::grid::{self, GridError};
use crate::payload;
use crate::preprocess::{self, PreprocessConfig};
use crate::reed_solomon::{self, Correction};
use crate::symbol;
use crate::{codewords, locate};

/// Decoder configuration: the base conditioning policy the retry schedule
/// is derived from.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Base image-conditioning parameters.
    pub preprocess: PreprocessConfig,
}

/// One successfully decoded symbol.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DecodedSymbol {
    /// The decoded payload bytes.
    pub payload: Vec<u8>,
    /// Symbol height in modules.
    pub num_rows: usize,
    /// Symbol width in modules.
    pub num_cols: usize,
    /// Byte errors repaired by Reed–Solomon correction.
    pub corrected_errors: usize,
}

/// Result of a decode call. An empty symbol list means failure.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecodeOutcome {
    /// Decoded symbols, one per located candidate that survived.
    pub symbols: Vec<DecodedSymbol>,
    /// Conditioning passes consumed (1..=4).
    pub takes: usize,
    /// Input dimensions [width, height].
    pub image_size: [u32; 2],
}

impl DecodeOutcome {
    fn empty(width: u32, height: u32) -> Self {
        Self {
            symbols: Vec::new(),
            takes: 0,
            image_size: [width, height],
        }
    }

    /// True when at least one symbol decoded.
    pub fn success(&self) -> bool {
        !self.symbols.is_empty()
    }
}

/// Why a located candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolError {
    /// A dashed border never cleared the trim threshold.
    DashTrim,
    /// Module counting failed or found too few modules.
    SizeDetection,
    /// The measured module grid matches no ECC200 size.
    UnsupportedSize {
        rows: usize,
        cols: usize,
    },
    /// Reed–Solomon correction failed.
    Unrecoverable,
    /// A Base256 run claimed more bytes than the data region holds.
    PayloadOverrun,
}

impl SymbolError {
    /// Stable snake_case code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DashTrim => "dash_trim",
            Self::SizeDetection => "size_detection",
            Self::UnsupportedSize { .. } => "unsupported_size",
            Self::Unrecoverable => "unrecoverable",
            Self::PayloadOverrun => "payload_overrun",
        }
    }
}

impl std::fmt::Display for SymbolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedSize { rows, cols } => {
                write!(f, "unsupported symbol size {rows}x{cols}")
            }
            other => f.write_str(other.code()),
        }
    }
}

impl std::error::Error for SymbolError {}

impl From<GridError> for SymbolError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::DashTrim => Self::DashTrim,
            GridError::SizeDetection => Self::SizeDetection,
        }
    }
}

/// Primary decoding interface. Create once, decode many images.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecodeConfig,
}

impl Decoder {
    /// Decoder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder with full config control.
    pub fn with_config(config: DecodeConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Mutable access for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut DecodeConfig {
        &mut self.config
    }

    /// Decode every readable Data Matrix symbol in a grayscale image.
    pub fn decode(&self, image: &GrayImage) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::empty(image.width(), image.height());

        for (take, cfg) in preprocess::retry_schedule(&self.config.preprocess)
            .iter()
            .enumerate()
        {
            outcome.takes = take + 1;

            let (binary, contours) = preprocess::process(image, cfg);
            tracing::debug!("take {}: {} candidate contours", take + 1, contours.len());
            if contours.is_empty() {
                continue;
            }

            let crops = locate::locate_symbols(image, &binary, &contours, cfg);
            tracing::debug!("take {}: {} rectified candidates", take + 1, crops.len());

            for crop in &crops {
                match decode_candidate(crop, cfg) {
                    Ok(symbol) => outcome.symbols.push(symbol),
                    Err(err) => tracing::debug!("candidate rejected: {}", err.code()),
                }
            }
            if outcome.success() {
                break;
            }
        }

        tracing::info!(
            "{} symbol(s) decoded in {} take(s)",
            outcome.symbols.len(),
            outcome.takes
        );
        outcome
    }

    /// Read an image from disk and decode it.
    pub fn decode_file(&self, path: &Path) -> Result<DecodeOutcome, image::ImageError> {
        let image = image::open(path)?.into_luma8();
        Ok(self.decode(&image))
    }
}

/// Run one rectified candidate through the back half of the pipeline.
fn decode_candidate(crop: &GrayImage, cfg: &PreprocessConfig) -> Result<DecodedSymbol, SymbolError> {
    let grid = grid::read_modules(crop, cfg)?;
    let spec = symbol::find_spec(grid.rows(), grid.cols()).ok_or(SymbolError::UnsupportedSize {
        rows: grid.rows(),
        cols: grid.cols(),
    })?;

    let mut words = codewords::extract(&grid, spec);
    let correction =
        reed_solomon::correct(&mut words, spec).map_err(|_| SymbolError::Unrecoverable)?;
    let payload = payload::decode_payload(&words, spec.data_words)
        .map_err(|_| SymbolError::PayloadOverrun)?;

    Ok(DecodedSymbol {
        payload,
        num_rows: spec.num_rows,
        num_cols: spec.num_cols,
        corrected_errors: match correction {
            Correction::Clean => 0,
            Correction::Repaired { errors } => errors,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn blank_image_exhausts_all_takes() {
        let decoder = Decoder::new();
        let img = GrayImage::from_pixel(64, 64, Luma([255u8]));
        let outcome = decoder.decode(&img);
        assert!(!outcome.success());
        assert_eq!(outcome.takes, 4);
        assert_eq!(outcome.image_size, [64, 64]);
    }

    #[test]
    fn config_mut_tunes_the_schedule_base() {
        let mut decoder = Decoder::new();
        decoder.config_mut().preprocess.adaptive_block = 31;
        assert_eq!(decoder.config().preprocess.adaptive_block, 31);
    }

    #[test]
    fn outcome_serializes_to_json() {
        let outcome = DecodeOutcome {
            symbols: vec![DecodedSymbol {
                payload: b"AB".to_vec(),
                num_rows: 10,
                num_cols: 10,
                corrected_errors: 1,
            }],
            takes: 1,
            image_size: [100, 100],
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"num_rows\":10"));
        assert!(json.contains("\"corrected_errors\":1"));
    }

    #[test]
    fn decode_file_reports_missing_files() {
        let decoder = Decoder::new();
        assert!(decoder
            .decode_file(Path::new("/nonexistent/symbol.png"))
            .is_err());
    }

    #[test]
    fn symbol_error_codes_are_stable() {
        assert_eq!(SymbolError::DashTrim.code(), "dash_trim");
        assert_eq!(
            SymbolError::UnsupportedSize { rows: 9, cols: 9 }.to_string(),
            "unsupported symbol size 9x9"
        );
        let from_grid: SymbolError = GridError::SizeDetection.into();
        assert_eq!(from_grid, SymbolError::SizeDetection);
    }
}
