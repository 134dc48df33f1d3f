//! Codeword assembly: alignment-pattern removal and the ECC200 module
//! placement ("Utah") traversal.
//!
//! The traversal sweeps the data-module grid diagonally, placing an 8-module
//! L-shaped template per codeword, with four special corner patterns and
//! wrap rules for template positions that fall off the top or left edge.
//! [`placement`] materializes the visit order once; extraction is then a
//! plain bit gather, and tests reuse the same order to write synthetic
//! grids.

use crate::matrix::BitGrid;
use crate::symbol::SymbolSpec;

/// Module positions of one codeword, MSB first.
pub type CodewordModules = [(usize, usize); 8];

/// Utah template offsets relative to the anchor, MSB first.
const UTAH: [(i64, i64); 8] = [
    (-2, -2),
    (-2, -1),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (0, -2),
    (0, -1),
    (0, 0),
];

/// Remove the finder borders and inner alignment rows/columns, leaving the
/// concatenated data modules of all regions.
pub fn strip_alignment(grid: &BitGrid, spec: &SymbolSpec) -> BitGrid {
    debug_assert_eq!(grid.rows(), spec.num_rows);
    debug_assert_eq!(grid.cols(), spec.num_cols);

    let mut data = BitGrid::new(spec.data_grid_rows(), spec.data_grid_cols());
    for region_i in 0..spec.region_rows {
        for region_j in 0..spec.region_cols {
            for i in 0..spec.data_rows {
                for j in 0..spec.data_cols {
                    let src_row = 1 + region_i * (spec.data_rows + 2) + i;
                    let src_col = 1 + region_j * (spec.data_cols + 2) + j;
                    data.set(
                        region_i * spec.data_rows + i,
                        region_j * spec.data_cols + j,
                        grid.get(src_row, src_col),
                    );
                }
            }
        }
    }
    data
}

/// Wrap a template position that fell off the top or left edge.
fn wrap(row: i64, col: i64, rows: i64, cols: i64) -> (usize, usize) {
    let (mut row, mut col) = (row, col);
    if row < 0 {
        row += rows;
        col += 4 - ((rows + 4) & 0x07);
    }
    if col < 0 {
        col += cols;
        row += 4 - ((cols + 4) & 0x07);
    }
    (row as usize, col as usize)
}

fn utah(anchor_row: i64, anchor_col: i64, rows: i64, cols: i64) -> CodewordModules {
    let mut modules = [(0usize, 0usize); 8];
    for (slot, (dr, dc)) in modules.iter_mut().zip(UTAH) {
        *slot = wrap(anchor_row + dr, anchor_col + dc, rows, cols);
    }
    modules
}

fn corner1(rows: usize, cols: usize) -> CodewordModules {
    [
        (rows - 1, 0),
        (rows - 1, 1),
        (rows - 1, 2),
        (0, cols - 2),
        (0, cols - 1),
        (1, cols - 1),
        (2, cols - 1),
        (3, cols - 1),
    ]
}

fn corner2(rows: usize, cols: usize) -> CodewordModules {
    [
        (rows - 3, 0),
        (rows - 2, 0),
        (rows - 1, 0),
        (0, cols - 4),
        (0, cols - 3),
        (0, cols - 2),
        (0, cols - 1),
        (1, cols - 1),
    ]
}

fn corner3(rows: usize, cols: usize) -> CodewordModules {
    [
        (rows - 1, 0),
        (rows - 1, cols - 1),
        (0, cols - 3),
        (0, cols - 2),
        (0, cols - 1),
        (1, cols - 3),
        (1, cols - 2),
        (1, cols - 1),
    ]
}

fn corner4(rows: usize, cols: usize) -> CodewordModules {
    [
        (rows - 3, 0),
        (rows - 2, 0),
        (rows - 1, 0),
        (0, cols - 2),
        (0, cols - 1),
        (1, cols - 1),
        (2, cols - 1),
        (3, cols - 1),
    ]
}

/// The complete codeword visit order for a data-module grid of the given
/// dimensions: one 8-module group per codeword, MSB first.
pub fn placement(rows: usize, cols: usize) -> Vec<CodewordModules> {
    let rows_i = rows as i64;
    let cols_i = cols as i64;
    let mut read = vec![false; rows * cols];
    let mut order = Vec::new();
    let mut push = |modules: CodewordModules, read: &mut Vec<bool>| {
        for &(r, c) in &modules {
            read[r * cols + c] = true;
        }
        order.push(modules);
    };

    let mut row: i64 = 4;
    let mut col: i64 = 0;
    let (mut c1, mut c2, mut c3, mut c4) = (false, false, false, false);

    loop {
        if row == rows_i && col == 0 && !c1 {
            push(corner1(rows, cols), &mut read);
            row -= 2;
            col += 2;
            c1 = true;
        } else if row == rows_i - 2 && col == 0 && (cols_i & 0x03) != 0 && !c2 {
            push(corner2(rows, cols), &mut read);
            row -= 2;
            col += 2;
            c2 = true;
        } else if row == rows_i + 4 && col == 2 && (cols_i & 0x07) == 0 && !c3 {
            push(corner3(rows, cols), &mut read);
            row -= 2;
            col += 2;
            c3 = true;
        } else if row == rows_i - 2 && col == 0 && (cols_i & 0x07) == 4 && !c4 {
            push(corner4(rows, cols), &mut read);
            row -= 2;
            col += 2;
            c4 = true;
        } else {
            // Sweep up and to the right.
            loop {
                if row < rows_i
                    && col >= 0
                    && col < cols_i
                    && !read[row as usize * cols + col as usize]
                {
                    push(utah(row, col, rows_i, cols_i), &mut read);
                }
                row -= 2;
                col += 2;
                if !(row >= 0 && col < cols_i) {
                    break;
                }
            }
            row += 1;
            col += 3;

            // Sweep down and to the left.
            loop {
                if row >= 0
                    && row < rows_i
                    && col < cols_i
                    && !read[row as usize * cols + col as usize]
                {
                    push(utah(row, col, rows_i, cols_i), &mut read);
                }
                row += 2;
                col -= 2;
                if !(row < rows_i && col >= 0) {
                    break;
                }
            }
            row += 3;
            col += 1;
        }

        if !(row < rows_i || col < cols_i) {
            break;
        }
    }
    order
}

/// Assemble the codeword stream from a raw module grid.
///
/// Strips the finder/alignment patterns, then gathers one byte per
/// placement group. The stream length always equals
/// `spec.total_words()`.
pub fn extract(grid: &BitGrid, spec: &SymbolSpec) -> Vec<u8> {
    let data = strip_alignment(grid, spec);
    let order = placement(data.rows(), data.cols());
    debug_assert_eq!(order.len(), spec.total_words());

    order
        .iter()
        .map(|modules| {
            modules.iter().fold(0u8, |byte, &(r, c)| {
                (byte << 1) | u8::from(data.get(r, c))
            })
        })
        .collect()
}
