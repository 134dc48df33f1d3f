//! The embedded ECC200 symbol size table.
//!
//! Thirty standard sizes: twenty-four squares from 10×10 to 144×144 and six
//! rectangles. Each entry records the sub-region layout, the usable data
//! modules per region, and the Reed–Solomon configuration. For the
//! rectangular sizes `region_rows` is 1 and `region_cols` is 1 or 2, per
//! ISO/IEC 16022.
//!
//! `error_words` is per Reed–Solomon block; sizes from 52×52 upward
//! interleave `rs_blocks` blocks over the codeword stream.

/// One row of the ECC200 size table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SymbolSpec {
    /// Total module rows, finder patterns included.
    pub num_rows: usize,
    /// Total module columns, finder patterns included.
    pub num_cols: usize,
    /// Vertical count of sub-regions.
    pub region_rows: usize,
    /// Horizontal count of sub-regions.
    pub region_cols: usize,
    /// Data module rows per region.
    pub data_rows: usize,
    /// Data module columns per region.
    pub data_cols: usize,
    /// Data codewords in the symbol.
    pub data_words: usize,
    /// Error codewords per Reed–Solomon block.
    pub error_words: usize,
    /// Interleaved Reed–Solomon block count.
    pub rs_blocks: usize,
}

impl SymbolSpec {
    /// Data module rows over the whole symbol (alignment patterns removed).
    pub fn data_grid_rows(&self) -> usize {
        self.num_rows - 2 * self.region_rows
    }

    /// Data module columns over the whole symbol (alignment patterns removed).
    pub fn data_grid_cols(&self) -> usize {
        self.num_cols - 2 * self.region_cols
    }

    /// Total codewords carried by the symbol.
    pub fn total_words(&self) -> usize {
        self.data_words + self.rs_blocks * self.error_words
    }

    /// Data modules the codeword placement leaves unread (0 or 4).
    pub fn unused_modules(&self) -> usize {
        self.data_grid_rows() * self.data_grid_cols() - 8 * self.total_words()
    }

    /// Error correction capacity per block: ⌊error_words / 2⌋.
    pub fn correctable_per_block(&self) -> usize {
        self.error_words / 2
    }
}

/// Look up the table entry for a raw module grid size.
pub fn find_spec(num_rows: usize, num_cols: usize) -> Option<&'static SymbolSpec> {
    SYMBOL_SPECS
        .iter()
        .find(|s| s.num_rows == num_rows && s.num_cols == num_cols)
}

macro_rules! spec {
    ($r:expr, $c:expr, $rr:expr, $rc:expr, $dr:expr, $dc:expr, $dw:expr, $ew:expr, $b:expr) => {
        SymbolSpec {
            num_rows: $r,
            num_cols: $c,
            region_rows: $rr,
            region_cols: $rc,
            data_rows: $dr,
            data_cols: $dc,
            data_words: $dw,
            error_words: $ew,
            rs_blocks: $b,
        }
    };
}

/// The 30 standard ECC200 sizes. Squares first, rectangles last.
pub static SYMBOL_SPECS: [SymbolSpec; 30] = [
    spec!(10, 10, 1, 1, 8, 8, 3, 5, 1),
    spec!(12, 12, 1, 1, 10, 10, 5, 7, 1),
    spec!(14, 14, 1, 1, 12, 12, 8, 10, 1),
    spec!(16, 16, 1, 1, 14, 14, 12, 12, 1),
    spec!(18, 18, 1, 1, 16, 16, 18, 14, 1),
    spec!(20, 20, 1, 1, 18, 18, 22, 18, 1),
    spec!(22, 22, 1, 1, 20, 20, 30, 20, 1),
    spec!(24, 24, 1, 1, 22, 22, 36, 24, 1),
    spec!(26, 26, 1, 1, 24, 24, 44, 28, 1),
    spec!(32, 32, 2, 2, 14, 14, 62, 36, 1),
    spec!(36, 36, 2, 2, 16, 16, 86, 42, 1),
    spec!(40, 40, 2, 2, 18, 18, 114, 48, 1),
    spec!(44, 44, 2, 2, 20, 20, 144, 56, 1),
    spec!(48, 48, 2, 2, 22, 22, 174, 68, 1),
    spec!(52, 52, 2, 2, 24, 24, 204, 42, 2),
    spec!(64, 64, 4, 4, 14, 14, 280, 56, 2),
    spec!(72, 72, 4, 4, 16, 16, 368, 36, 4),
    spec!(80, 80, 4, 4, 18, 18, 456, 48, 4),
    spec!(88, 88, 4, 4, 20, 20, 576, 56, 4),
    spec!(96, 96, 4, 4, 22, 22, 696, 68, 4),
    spec!(104, 104, 4, 4, 24, 24, 816, 56, 6),
    spec!(120, 120, 6, 6, 18, 18, 1050, 68, 6),
    spec!(132, 132, 6, 6, 20, 20, 1304, 62, 8),
    spec!(144, 144, 6, 6, 22, 22, 1558, 62, 10),
    spec!(8, 18, 1, 1, 6, 16, 5, 7, 1),
    spec!(8, 32, 1, 2, 6, 14, 10, 11, 1),
    spec!(12, 26, 1, 1, 10, 24, 16, 14, 1),
    spec!(12, 36, 1, 2, 10, 16, 22, 18, 1),
    spec!(16, 36, 1, 2, 14, 16, 32, 24, 1),
    spec!(16, 48, 1, 2, 14, 22, 49, 28, 1),
];
