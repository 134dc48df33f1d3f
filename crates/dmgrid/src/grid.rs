//! Grid reading: from a canonical crop to a row-major bit grid.
//!
//! The crop arrives with the L on the left and bottom and the dashed
//! (timing) sides on top and right. The reader trims slack off the dashed
//! borders, measures the module count by run-counting along both timing
//! sides, fits a line grid to the module boundaries, scores every cell's
//! bright fraction, and resolves ambiguous cells from a reversed-polarity
//! re-binarization of a cleaned-up canvas. Border cells are finally forced
//! to the known finder patterns so orientation is anchored regardless of
//! sampling noise.

use image::{GrayImage, Luma};
use imageproc::point::Point;

use crate::locate::trace::{bright_fraction, move_pixel, pixel_value, round_coord};
use crate::matrix::BitGrid;
use crate::preprocess::{self, PreprocessConfig};

/// Pixels of slack tolerated on each dashed border.
const TRIM_TRIES: i32 = 6;
/// Bright fraction a border line must reach after trimming.
const TRIM_BRIGHT_RATE: f64 = 0.2;
/// Offsets scanned from each timing side during size detection.
const SIZE_TRIES: i32 = 6;
/// Minimum module runs ratio: the shortest retained run over the longest.
const RUN_MIN_TO_MAX: f64 = 0.3;
/// Line-fit window half-width, px. A tunable, exposed for tests.
pub(crate) const FIT_WINDOW: i32 = 2;
/// Offsets sampled per fitted line.
pub(crate) const FIT_SAMPLES: i32 = 5;

const DARK_GATE: f64 = 0.25;
const BRIGHT_GATE: f64 = 0.75;
const CENTER_GATE: f64 = 0.66;

/// Why a crop could not be read as a module grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// A dashed border never reached the required bright fraction.
    DashTrim,
    /// Module counting found fewer modules than the smallest symbol.
    SizeDetection,
}

impl GridError {
    /// Stable snake_case code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DashTrim => "dash_trim",
            Self::SizeDetection => "size_detection",
        }
    }
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::error::Error for GridError {}

/// Read the module grid from a canonical grayscale crop.
pub fn read_modules(crop: &GrayImage, config: &PreprocessConfig) -> Result<BitGrid, GridError> {
    let binary = preprocess::binarize(crop, config);
    let (w, h) = binary.dimensions();

    let (pad_top, pad_right) = trim_dashed_borders(&binary).ok_or(GridError::DashTrim)?;
    let roi_w = w - pad_right;
    let roi_h = h - pad_top;
    let binary_roi = image::imageops::crop_imm(&binary, 0, pad_top, roi_w, roi_h).to_image();
    let gray_roi = image::imageops::crop_imm(crop, 0, pad_top, roi_w, roi_h).to_image();

    let (rows, cols) =
        detect_size(&binary_roi, w.max(h) as i32).ok_or(GridError::SizeDetection)?;
    tracing::trace!("module grid {}x{}", rows, cols);

    let (row_pos, col_pos) = fit_grid(&binary_roi, rows, cols);
    Ok(classify_modules(
        &binary_roi,
        &gray_roi,
        rows,
        cols,
        &row_pos,
        &col_pos,
        config,
    ))
}

/// Trim the top and right borders inward until each shows the timing
/// pattern. Returns `(top, right)` trim counts.
fn trim_dashed_borders(binary: &GrayImage) -> Option<(u32, u32)> {
    let (w, h) = binary.dimensions();

    let mut right_edge = Point::new(w as i32 - 1, h as i32 - 1);
    let mut pad_right = None;
    for i in 0..TRIM_TRIES {
        if bright_fraction(binary, right_edge, 270.0, h as i32, 1) >= TRIM_BRIGHT_RATE {
            pad_right = Some(i as u32);
            break;
        }
        right_edge = move_pixel(right_edge, 360.0, 1, 1);
    }

    let mut top_edge = Point::new(0, 0);
    let mut pad_top = None;
    for i in 0..TRIM_TRIES {
        if bright_fraction(binary, top_edge, 180.0, w as i32, 1) >= TRIM_BRIGHT_RATE {
            pad_top = Some(i as u32);
            break;
        }
        top_edge = move_pixel(top_edge, 90.0, 1, 1);
    }

    Some((pad_top?, pad_right?))
}

/// Count modules along both timing sides: columns across the top, rows up
/// the right side. Requires at least 10 columns and 8 rows.
fn detect_size(binary: &GrayImage, scan_len: i32) -> Option<(usize, usize)> {
    let (w, h) = (binary.width() as i32, binary.height() as i32);

    let mut cols = -1i32;
    for j in 0..SIZE_TRIES {
        let m = run_count_modules(binary, Point::new(0, j), 0.0, scan_len).map_or(-1, |v| v as i32);
        if m >= cols {
            cols = m;
        }
    }
    if cols < 10 {
        return None;
    }

    let mut rows = -1i32;
    for j in 0..SIZE_TRIES {
        let m = run_count_modules(binary, Point::new(w - j - 1, h - 1), 90.0, scan_len)
            .map_or(-1, |v| v as i32);
        if m >= rows {
            rows = m;
        }
    }
    if rows < 8 {
        return None;
    }
    Some((rows as usize, cols as usize))
}

/// Count bright and dark runs along a timing track. Runs of a single pixel
/// are noise; retained runs of each kind must be of similar size and the
/// bright and dark counts must agree to within one. Modules = 2 × dark
/// runs.
fn run_count_modules(binary: &GrayImage, p: Point<i32>, angle: f64, length: i32) -> Option<usize> {
    let mut bright_runs = Vec::new();
    let mut dark_runs = Vec::new();
    let mut is_bright = false;
    let mut bright_from = -1i32;
    let mut dark_from = -1i32;

    for i in 0..length {
        let bright = pixel_value(binary, move_pixel(p, angle, i, -1)) == 255;
        if !is_bright {
            if i == length - 1 {
                dark_runs.push(i - dark_from + 1);
            } else if bright {
                is_bright = true;
                bright_from = i;
                if dark_from != -1 {
                    dark_runs.push(i - dark_from);
                }
            }
        }
        if is_bright {
            if i == length - 1 {
                bright_runs.push(i - bright_from + 1);
            } else if !bright {
                is_bright = false;
                bright_runs.push(i - bright_from);
                dark_from = i;
            }
        }
    }

    let n_bright = retained_run_count(&bright_runs)?;
    let n_dark = retained_run_count(&dark_runs)?;
    if n_bright == n_dark || n_bright == n_dark + 1 {
        Some(2 * n_dark)
    } else {
        None
    }
}

fn retained_run_count(runs: &[i32]) -> Option<usize> {
    let mut count = 0usize;
    let mut min = i32::MAX;
    let mut max = 0i32;
    for &run in runs {
        if run > 1 {
            count += 1;
            min = min.min(run);
            max = max.max(run);
        }
    }
    if max > 0 && (min as f64) / (max as f64) < RUN_MIN_TO_MAX {
        None
    } else {
        Some(count)
    }
}

/// Fit row and column boundary lines: start from an even subdivision and
/// snap each line to the nearby offset crossing the most contour pixels.
fn fit_grid(binary: &GrayImage, rows: usize, cols: usize) -> (Vec<i32>, Vec<i32>) {
    let (w, h) = binary.dimensions();
    let mut canvas = GrayImage::new(w, h);
    for contour in imageproc::contours::find_contours::<i32>(binary) {
        for p in contour.points {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
                canvas.put_pixel(p.x as u32, p.y as u32, Luma([255u8]));
            }
        }
    }

    let block_h = h as f64 / rows as f64;
    let block_w = w as f64 / cols as f64;

    let mut row_pos = vec![0i32; rows + 1];
    let mut col_pos = vec![0i32; cols + 1];
    row_pos[rows] = h as i32 - 1;
    col_pos[cols] = w as i32 - 1;
    for j in 0..rows {
        row_pos[j] = fit_line(&canvas, round_coord(block_h * j as f64), true);
    }
    for j in 0..cols {
        col_pos[j] = fit_line(&canvas, round_coord(block_w * j as f64), false);
    }
    (row_pos, col_pos)
}

fn fit_line(canvas: &GrayImage, coord: i32, horizontal: bool) -> i32 {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let mut best_count = 0u32;
    let mut best = None;
    for i in 0..FIT_SAMPLES {
        let c = coord - FIT_WINDOW + i;
        let mut count = 0u32;
        if horizontal {
            for x in 0..w {
                if pixel_value(canvas, Point::new(x, c)) == 255 {
                    count += 1;
                }
            }
        } else {
            for y in 0..h {
                if pixel_value(canvas, Point::new(c, y)) == 255 {
                    count += 1;
                }
            }
        }
        if count > best_count {
            best_count = count;
            best = Some(c);
        }
    }
    best.unwrap_or(coord)
}

/// Score every cell and classify it, resolving ambiguous cells through a
/// reversed-polarity re-binarization, then force the border patterns.
#[allow(clippy::too_many_arguments)]
fn classify_modules(
    binary: &GrayImage,
    gray: &GrayImage,
    rows: usize,
    cols: usize,
    row_pos: &[i32],
    col_pos: &[i32],
    config: &PreprocessConfig,
) -> BitGrid {
    let mut scores = vec![0.0f64; rows * cols];
    let mut dark_sum = 0.0f64;
    let mut bright_sum = 0.0f64;
    let mut n_dark = 0u32;
    let mut n_bright = 0u32;

    for j in 0..rows {
        for i in 0..cols {
            let idx = j * cols + i;
            let (x0, x1) = (col_pos[i], col_pos[i + 1]);
            let (y0, y1) = (row_pos[j], row_pos[j + 1]);
            let score = cell_bright_fraction(binary, x0, y0, x1, y1);
            let average = cell_mean(gray, x0, y0, x1, y1);
            scores[idx] = score;

            if score <= DARK_GATE {
                scores[idx] = 0.0;
                dark_sum += average;
                n_dark += 1;
            } else if score >= BRIGHT_GATE {
                scores[idx] = 1.0;
                bright_sum += average;
                n_bright += 1;
            }
        }
    }

    let dark_average = if n_dark > 0 {
        (dark_sum / n_dark as f64).round()
    } else {
        0.0
    };
    let bright_average = if n_bright > 0 {
        (bright_sum / n_bright as f64).round()
    } else {
        255.0
    };

    // Repaint decided cells with their class's mean luminance so the
    // reversed-polarity pass sees clean context around the ambiguous
    // cells, which keep their (bright-ink) binary values.
    let mut canvas = binary.clone();
    for j in 0..rows {
        for i in 0..cols {
            let idx = j * cols + i;
            if scores[idx] == 1.0 {
                paint_cell(&mut canvas, col_pos, row_pos, i, j, bright_average);
            } else if scores[idx] == 0.0 {
                paint_cell(&mut canvas, col_pos, row_pos, i, j, dark_average);
            }
        }
    }
    let reversed = PreprocessConfig {
        reversed: true,
        ..config.clone()
    };
    let reread = preprocess::binarize(&canvas, &reversed);

    for j in 0..rows {
        for i in 0..cols {
            let idx = j * cols + i;
            if scores[idx] > DARK_GATE && scores[idx] < BRIGHT_GATE {
                let (x0, x1) = (col_pos[i], col_pos[i + 1]);
                let (y0, y1) = (row_pos[j], row_pos[j + 1]);
                let center = cell_center_fraction(&reread, x0, y0, x1, y1);
                scores[idx] = if center > CENTER_GATE { 1.0 } else { 0.0 };
            }
        }
    }

    let mut grid = BitGrid::new(rows, cols);
    for j in 0..rows {
        for i in 0..cols {
            grid.set(j, i, scores[j * cols + i] as i32 == 1);
        }
    }
    force_border_patterns(&mut grid);
    grid
}

/// Bright fraction of a cell interior (boundary lines excluded). NaN for
/// degenerate cells, which later comparisons treat as ambiguous.
fn cell_bright_fraction(binary: &GrayImage, x0: i32, y0: i32, x1: i32, y1: i32) -> f64 {
    let mut bright = 0u32;
    let mut total = 0u32;
    for y in y0 + 1..y1 {
        for x in x0 + 1..x1 {
            if pixel_value(binary, Point::new(x, y)) > 0 {
                bright += 1;
            }
            total += 1;
        }
    }
    bright as f64 / total as f64
}

fn cell_mean(gray: &GrayImage, x0: i32, y0: i32, x1: i32, y1: i32) -> f64 {
    let mut sum = 0u64;
    let mut total = 0u32;
    for y in y0 + 1..y1 {
        for x in x0 + 1..x1 {
            sum += pixel_value(gray, Point::new(x, y)) as u64;
            total += 1;
        }
    }
    sum as f64 / total as f64
}

/// Bright fraction of a 3×3 (2×2 for even cell spans) patch at the cell
/// center.
fn cell_center_fraction(binary: &GrayImage, x0: i32, y0: i32, x1: i32, y1: i32) -> f64 {
    let x_end = (x1 + x0) / 2 + 1;
    let x_begin = if (x1 - x0) % 2 == 0 {
        (x1 + x0) / 2 - 1
    } else {
        (x1 + x0) / 2
    };
    let y_end = (y1 + y0) / 2 + 1;
    let y_begin = if (y1 - y0) % 2 == 0 {
        (y1 + y0) / 2 - 1
    } else {
        (y1 + y0) / 2
    };

    let mut bright = 0u32;
    let mut total = 0u32;
    for y in y_begin..=y_end {
        for x in x_begin..=x_end {
            if pixel_value(binary, Point::new(x, y)) > 0 {
                bright += 1;
            }
            total += 1;
        }
    }
    bright as f64 / total as f64
}

fn paint_cell(
    canvas: &mut GrayImage,
    col_pos: &[i32],
    row_pos: &[i32],
    i: usize,
    j: usize,
    luminance: f64,
) {
    let value = round_coord(luminance).clamp(0, 255) as u8;
    for y in row_pos[j]..=row_pos[j + 1] {
        for x in col_pos[i]..=col_pos[i + 1] {
            if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
                canvas.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }
}

/// Force the border rows and columns to the finder patterns: solid left
/// column and bottom row, alternating top row (bright at the left) and
/// right column (bright at the bottom).
fn force_border_patterns(grid: &mut BitGrid) {
    let rows = grid.rows();
    let cols = grid.cols();
    for i in 0..cols {
        grid.set(rows - 1, i, true);
        grid.set(0, i, i % 2 == 0);
    }
    for j in 0..rows {
        grid.set(j, 0, true);
        grid.set(j, cols - 1, (rows - 1 - j) % 2 == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render a module grid as a grayscale crop, dark ink on a light
    /// background. Separate module sizes mimic the square warp output of
    /// rectangular symbols.
    fn render_crop_xy(grid: &BitGrid, px_x: u32, px_y: u32) -> GrayImage {
        let w = grid.cols() as u32 * px_x;
        let h = grid.rows() as u32 * px_y;
        let mut img = GrayImage::from_pixel(w, h, Luma([220u8]));
        for j in 0..grid.rows() {
            for i in 0..grid.cols() {
                if grid.get(j, i) {
                    for dy in 0..px_y {
                        for dx in 0..px_x {
                            img.put_pixel(
                                i as u32 * px_x + dx,
                                j as u32 * px_y + dy,
                                Luma([40u8]),
                            );
                        }
                    }
                }
            }
        }
        img
    }

    fn render_crop(grid: &BitGrid, module_px: u32) -> GrayImage {
        render_crop_xy(grid, module_px, module_px)
    }

    /// A structurally valid symbol grid with a checkerboard interior.
    fn bordered_grid(rows: usize, cols: usize) -> BitGrid {
        let mut grid = BitGrid::new(rows, cols);
        for j in 0..rows {
            for i in 0..cols {
                grid.set(j, i, (i + j) % 2 == 0);
            }
        }
        force_border_patterns(&mut grid);
        grid
    }

    fn fixed_config() -> PreprocessConfig {
        PreprocessConfig {
            method: crate::preprocess::BinarizeMethod::Fixed,
            ..PreprocessConfig::default()
        }
    }

    #[test]
    fn reads_back_a_clean_ten_by_ten() {
        let grid = bordered_grid(10, 10);
        let crop = render_crop(&grid, 8);
        let read = read_modules(&crop, &fixed_config()).expect("grid read");
        assert_eq!((read.rows(), read.cols()), (10, 10));
        assert_eq!(read, grid);
    }

    #[test]
    fn reads_back_a_rectangle() {
        // Rectangular symbols arrive as square crops: modules are taller
        // than they are wide after the warp.
        let grid = bordered_grid(8, 18);
        let crop = render_crop_xy(&grid, 8, 18);
        let read = read_modules(&crop, &fixed_config()).expect("grid read");
        assert_eq!((read.rows(), read.cols()), (8, 18));
        assert_eq!(read, grid);
    }

    #[test]
    fn blank_crop_fails_size_detection() {
        let crop = GrayImage::from_pixel(80, 80, Luma([220u8]));
        assert!(read_modules(&crop, &fixed_config()).is_err());
    }

    #[test]
    fn run_counting_matches_the_timing_pattern() {
        let grid = bordered_grid(12, 12);
        let crop = render_crop(&grid, 8);
        let binary = preprocess::binarize(&crop, &fixed_config());
        let n = run_count_modules(&binary, Point::new(0, 0), 0.0, 96);
        assert_eq!(n, Some(12));
    }

    #[test]
    fn irregular_runs_are_rejected() {
        // One long run and one tiny run: min/max ratio below 0.3.
        assert_eq!(retained_run_count(&[30, 4]), None);
        assert_eq!(retained_run_count(&[8, 8, 7]), Some(3));
        // Single-pixel runs are ignored entirely.
        assert_eq!(retained_run_count(&[1, 1, 1]), Some(0));
    }

    #[test]
    fn border_patterns_overrule_sampling() {
        let mut grid = BitGrid::new(10, 10);
        force_border_patterns(&mut grid);
        for i in 0..10 {
            assert!(grid.get(9, i), "bottom row solid");
            assert!(grid.get(i, 0), "left column solid");
            assert_eq!(grid.get(0, i), i % 2 == 0, "top row alternates");
            assert_eq!(grid.get(i, 9), (9 - i) % 2 == 0, "right column alternates");
        }
    }
}
