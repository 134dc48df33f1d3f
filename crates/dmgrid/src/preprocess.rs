//! Image conditioning: smoothing, binarization and candidate contours.
//!
//! The conditioner turns a grayscale frame into a binary image in which
//! symbol modules are the bright foreground, then extracts every external
//! and internal contour as a full point chain. Candidate contours are kept
//! only when they are plausibly a whole symbol: enough boundary points, a
//! sane aspect ratio, and clearance from the image edges.
//!
//! Binarization is retryable: the driver walks [`retry_schedule`] until one
//! pass of the pipeline succeeds.

use image::GrayImage;
use imageproc::point::Point;
use imageproc::rect::Rect;

/// An ordered, closed boundary point chain.
pub type ContourPoints = Vec<Point<i32>>;

/// Thresholding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinarizeMethod {
    /// Global fixed threshold.
    Fixed,
    /// Mean adaptive threshold over a square block.
    Adaptive,
}

/// Conditioner configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Flip polarity: set when modules are brighter than the background.
    pub reversed: bool,
    /// Thresholding strategy. Default: adaptive.
    pub method: BinarizeMethod,
    /// Threshold for [`BinarizeMethod::Fixed`].
    /// Default: [`PreprocessConfig::DEFAULT_FIXED_THRESHOLD`].
    pub fixed_threshold: u8,
    /// Block size for [`BinarizeMethod::Adaptive`].
    /// Default: [`PreprocessConfig::DEFAULT_ADAPTIVE_BLOCK`].
    pub adaptive_block: u32,
    /// Minimum contour length in points: each side at least 10 modules,
    /// each module at least 4 px, four sides.
    /// Default: [`PreprocessConfig::DEFAULT_MIN_CONTOUR_POINTS`].
    pub min_contour_points: usize,
    /// Minimum bounding-box aspect ratio (short side over long side).
    /// Default: [`PreprocessConfig::DEFAULT_MIN_ASPECT`].
    pub min_aspect: f32,
    /// Minimum distance between a candidate and every image edge, px.
    /// Default: [`PreprocessConfig::DEFAULT_EDGE_MARGIN`].
    pub edge_margin: i32,
}

impl PreprocessConfig {
    pub const DEFAULT_FIXED_THRESHOLD: u8 = 127;
    pub const DEFAULT_ADAPTIVE_BLOCK: u32 = 25;
    /// Larger adaptive block used by the third retry policy.
    pub const RETRY_ADAPTIVE_BLOCK: u32 = 35;
    pub const DEFAULT_MIN_CONTOUR_POINTS: usize = 160;
    pub const DEFAULT_MIN_ASPECT: f32 = 0.20;
    pub const DEFAULT_EDGE_MARGIN: i32 = 4;
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            reversed: false,
            method: BinarizeMethod::Adaptive,
            fixed_threshold: Self::DEFAULT_FIXED_THRESHOLD,
            adaptive_block: Self::DEFAULT_ADAPTIVE_BLOCK,
            min_contour_points: Self::DEFAULT_MIN_CONTOUR_POINTS,
            min_aspect: Self::DEFAULT_MIN_ASPECT,
            edge_margin: Self::DEFAULT_EDGE_MARGIN,
        }
    }
}

/// The four conditioning policies the driver tries, in order: defaults,
/// reversed polarity, a larger adaptive block, reversed fixed threshold.
pub fn retry_schedule(base: &PreprocessConfig) -> [PreprocessConfig; 4] {
    let mut takes = [base.clone(), base.clone(), base.clone(), base.clone()];
    takes[1].reversed = true;
    takes[2].reversed = false;
    takes[2].adaptive_block = PreprocessConfig::RETRY_ADAPTIVE_BLOCK;
    takes[3].reversed = true;
    takes[3].method = BinarizeMethod::Fixed;
    takes
}

/// Median-smooth and binarize so that symbol modules come out bright.
pub fn binarize(image: &GrayImage, config: &PreprocessConfig) -> GrayImage {
    let smoothed = imageproc::filter::median_filter(image, 1, 1);
    let mut binary = match config.method {
        BinarizeMethod::Fixed => imageproc::contrast::threshold(&smoothed, config.fixed_threshold),
        BinarizeMethod::Adaptive => {
            imageproc::contrast::adaptive_threshold(&smoothed, config.adaptive_block / 2)
        }
    };
    // Thresholding marks bright pixels; dark ink on a light background
    // needs the inverse unless the caller asked for reversed polarity.
    if !config.reversed {
        image::imageops::invert(&mut binary);
    }
    binary
}

/// Binarize and extract filtered candidate contours.
pub fn process(image: &GrayImage, config: &PreprocessConfig) -> (GrayImage, Vec<ContourPoints>) {
    let binary = binarize(image, config);
    let (width, height) = binary.dimensions();
    let contours: Vec<ContourPoints> = imageproc::contours::find_contours::<i32>(&binary)
        .into_iter()
        .map(|c| c.points)
        .filter(|points| contour_passes(points, width, height, config))
        .collect();
    (binary, contours)
}

/// Axis-aligned bounding box of a point chain. Width and height run one
/// past the extent, so the far corners sit just outside the chain.
pub(crate) fn bounding_box(points: &[Point<i32>]) -> Rect {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32)
}

fn contour_passes(
    points: &[Point<i32>],
    width: u32,
    height: u32,
    config: &PreprocessConfig,
) -> bool {
    if points.len() < config.min_contour_points {
        return false;
    }

    let bound = bounding_box(points);
    let (w, h) = (bound.width() as f32, bound.height() as f32);
    let aspect = if h < w { h / w } else { w / h };
    if aspect < config.min_aspect {
        return false;
    }

    let margin = config.edge_margin;
    if bound.left() < margin || bound.top() < margin {
        return false;
    }
    if bound.left() + bound.width() as i32 + margin > width as i32
        || bound.top() + bound.height() as i32 + margin > height as i32
    {
        return false;
    }
    true
}
