//! Shared helpers: build complete synthetic ECC200 symbols from payload
//! codewords and rasterize them for the full pipeline.

use dmgrid::codewords::placement;
use dmgrid::reed_solomon::check_words;
use dmgrid::symbol::SymbolSpec;
use dmgrid::BitGrid;
use image::{GrayImage, Luma};

/// Append check words to the data codewords, interleaving blocks the way
/// the symbol's Reed–Solomon configuration requires.
pub fn with_check_words(spec: &SymbolSpec, data: &[u8]) -> Vec<u8> {
    assert_eq!(data.len(), spec.data_words);
    let blocks = spec.rs_blocks;
    let mut stream = vec![0u8; spec.total_words()];
    stream[..data.len()].copy_from_slice(data);
    for b in 0..blocks {
        let block_data: Vec<u8> = (b..data.len()).step_by(blocks).map(|i| data[i]).collect();
        for (k, &check) in check_words(&block_data, spec.error_words).iter().enumerate() {
            stream[spec.data_words + b + k * blocks] = check;
        }
    }
    stream
}

/// Place a full codeword stream into the data-module grid.
pub fn place_words(spec: &SymbolSpec, words: &[u8]) -> BitGrid {
    let rows = spec.data_grid_rows();
    let cols = spec.data_grid_cols();
    let order = placement(rows, cols);
    assert_eq!(order.len(), words.len());
    let mut grid = BitGrid::new(rows, cols);
    for (modules, &word) in order.iter().zip(words) {
        for (bit, &(r, c)) in modules.iter().enumerate() {
            grid.set(r, c, word >> (7 - bit) & 1 == 1);
        }
    }
    grid
}

/// Wrap the data-module grid with per-region finder borders: solid left
/// column and bottom row, alternating top row and right column.
pub fn embed_finder_patterns(spec: &SymbolSpec, data: &BitGrid) -> BitGrid {
    let mut raw = BitGrid::new(spec.num_rows, spec.num_cols);
    for region_i in 0..spec.region_rows {
        for region_j in 0..spec.region_cols {
            let base_row = region_i * (spec.data_rows + 2);
            let base_col = region_j * (spec.data_cols + 2);
            for ly in 0..spec.data_rows + 2 {
                for lx in 0..spec.data_cols + 2 {
                    let bright = if lx == 0 || ly == spec.data_rows + 1 {
                        true
                    } else if ly == 0 {
                        lx % 2 == 0
                    } else if lx == spec.data_cols + 1 {
                        (spec.data_rows + 1 - ly) % 2 == 0
                    } else {
                        data.get(
                            region_i * spec.data_rows + ly - 1,
                            region_j * spec.data_cols + lx - 1,
                        )
                    };
                    raw.set(base_row + ly, base_col + lx, bright);
                }
            }
        }
    }
    raw
}

/// Build the raw module grid for a payload (data codewords without checks).
pub fn symbol_grid(spec: &SymbolSpec, data: &[u8]) -> BitGrid {
    let stream = with_check_words(spec, data);
    embed_finder_patterns(spec, &place_words(spec, &stream))
}

/// Rasterize a module grid: dark ink on a light background, surrounded by
/// a quiet zone. `inverted` renders light-on-dark symbols instead.
pub fn render(grid: &BitGrid, module_px: u32, quiet_px: u32, inverted: bool) -> GrayImage {
    let (ink, paper) = if inverted { (220u8, 40u8) } else { (40u8, 220u8) };
    let w = grid.cols() as u32 * module_px + 2 * quiet_px;
    let h = grid.rows() as u32 * module_px + 2 * quiet_px;
    let mut img = GrayImage::from_pixel(w, h, Luma([paper]));
    for j in 0..grid.rows() {
        for i in 0..grid.cols() {
            if grid.get(j, i) {
                for dy in 0..module_px {
                    for dx in 0..module_px {
                        img.put_pixel(
                            quiet_px + i as u32 * module_px + dx,
                            quiet_px + j as u32 * module_px + dy,
                            Luma([ink]),
                        );
                    }
                }
            }
        }
    }
    img
}
