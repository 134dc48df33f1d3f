//! Symbol location: from candidate contours to canonical square crops.
//!
//! Each contour is examined independently. The stages mirror the geometry
//! of a Data Matrix border: find the two solid sides forming the L (a fast
//! path for axis-aligned symbols, a slower vote-based path for rotated
//! ones), confirm the quiet zone beside the L, track the two dashed sides
//! to recover the fourth corner, then rectify the quadrilateral with a
//! perspective warp. A second rectification pass on the now-canonical
//! square absorbs residual skew.
//!
//! Any failed stage drops the candidate; the caller keeps the rest.

mod calibrate;
mod lfinder;
mod quiet;
mod rectify;
pub(crate) mod trace;
mod vertex;

use image::GrayImage;
use imageproc::point::Point;

use crate::preprocess::{self, ContourPoints, PreprocessConfig};
use trace::round_coord;

/// A contour point together with its position along the chain. Index
/// arithmetic is i64: walking past the chain ends produces negative
/// intermediates that wrap by adding or subtracting the chain length.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IndexedPoint {
    pub point: Point<i32>,
    pub index: i64,
}

impl IndexedPoint {
    pub fn new(point: Point<i32>, index: i64) -> Self {
        Self { point, index }
    }
}

/// Which bounding-box corner the L-corner occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CornerPosition {
    TopLeft,
    BottomLeft,
    BottomRight,
    TopRight,
}

/// The L-finder descriptor: the two solid sides and, once the dashed sides
/// are tracked, the full symbol quadrilateral.
#[derive(Debug, Clone)]
pub(crate) struct LShape {
    /// The L-corner.
    pub p0: IndexedPoint,
    /// Far end of the first solid side.
    pub p1: IndexedPoint,
    /// Far end of the second solid side.
    pub p2: IndexedPoint,
    /// The corner diagonally opposite `p0`, from dashed-side tracking.
    pub px: Point<i32>,
    pub position: CornerPosition,
    /// Angle of the `p0→p1` ray, degrees.
    pub angle1: f64,
    /// Angle of the `p0→p2` ray, degrees.
    pub angle2: f64,
}

/// Squared Euclidean distance.
pub(crate) fn distance_sq(a: Point<i32>, b: Point<i32>) -> i64 {
    let dx = (a.x - b.x) as i64;
    let dy = (a.y - b.y) as i64;
    dx * dx + dy * dy
}

/// Euclidean distance.
pub(crate) fn distance(a: Point<i32>, b: Point<i32>) -> f64 {
    (distance_sq(a, b) as f64).sqrt()
}

/// Angle of the line through two points, degrees in [0, 180).
///
/// Measured so that a ray walked by [`trace::move_pixel`] with direction +1
/// travels from `p1` toward `p0`.
pub(crate) fn angle_f(p0: Point<i32>, p1: Point<i32>) -> f64 {
    let dx = (p0.x - p1.x) as f64;
    let dy = (p0.y - p1.y) as f64;
    let angle = if dx != 0.0 {
        (dy / dx).atan().to_degrees()
    } else {
        90.0
    };
    if angle > 0.0 {
        180.0 - angle
    } else {
        -angle
    }
}

/// Integer-degree version of [`angle_f`], rounded before folding so the
/// result stays within [0, 179].
pub(crate) fn angle_i(p0: Point<i32>, p1: Point<i32>) -> i32 {
    let dx = (p0.x - p1.x) as f64;
    let dy = (p0.y - p1.y) as f64;
    let angle = if dx != 0.0 {
        round_coord((dy / dx).atan().to_degrees())
    } else {
        90
    };
    if angle > 0 {
        180 - angle
    } else {
        -angle
    }
}

/// Rectify every plausible symbol among the contours.
///
/// `gray` is the untouched input frame (warp source), `binary` its
/// conditioned counterpart (geometry tracking).
pub(crate) fn locate_symbols(
    gray: &GrayImage,
    binary: &GrayImage,
    contours: &[ContourPoints],
    config: &PreprocessConfig,
) -> Vec<GrayImage> {
    let mut crops = Vec::new();
    for contour in contours {
        if let Some(crop) = locate_one(gray, binary, contour, config) {
            crops.push(crop);
        }
    }
    crops
}

fn locate_one(
    gray: &GrayImage,
    binary: &GrayImage,
    contour: &ContourPoints,
    config: &PreprocessConfig,
) -> Option<GrayImage> {
    let (bound, vertices) = vertex::seed_vertices(contour);

    let mut l = match lfinder::check_orthogonal(contour, bound) {
        Some(l) => l,
        None => {
            let mut l = lfinder::rotated_l_shape(contour, bound, &vertices)?;
            if !calibrate::calibrate_l_shape(contour, &mut l) {
                return None;
            }
            l
        }
    };

    calibrate::recompute_p0(&mut l);
    calibrate::redefine_angle_position(&mut l);

    if !quiet::check_blank_l(binary, &mut l) {
        tracing::trace!("candidate dropped: no quiet zone beside the L");
        return None;
    }
    if !quiet::track_dashed_sides(binary, 2, &mut l) {
        tracing::trace!("candidate dropped: dashed sides not found");
        return None;
    }
    quiet::pad_l_shape(binary, true, &mut l);

    if !rectify::enlarge_l_shape(&mut l, binary.width(), binary.height()) {
        return None;
    }
    let (warped, side) = rectify::warp_l_shape(gray, &l, None)?;

    // Second pass: the crop is square now, so the L sits on known corners;
    // re-track the dashed sides to absorb residual skew.
    let rebinarized = preprocess::binarize(&warped, config);
    let far = side as i32 - 1;
    let mut canonical = LShape {
        p0: IndexedPoint::new(Point::new(0, far), -1),
        p1: IndexedPoint::new(Point::new(0, 0), -1),
        p2: IndexedPoint::new(Point::new(far, far), -1),
        px: Point::new(far, 0),
        position: CornerPosition::BottomLeft,
        angle1: 90.0,
        angle2: 0.0,
    };
    if !quiet::track_dashed_sides(&rebinarized, 5, &mut canonical) {
        tracing::trace!("candidate dropped: dashed sides lost after rectification");
        return None;
    }
    quiet::pad_l_shape(&rebinarized, false, &mut canonical);

    let (crop, _) = rectify::warp_l_shape(&warped, &canonical, Some(side))?;
    Some(crop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_between_points() {
        let origin = Point::new(0, 0);
        assert!((angle_f(origin, Point::new(10, 0)) - 0.0).abs() < 1e-9);
        assert!((angle_f(origin, Point::new(0, 10)) - 90.0).abs() < 1e-9);
        // Diagonals fold into [0, 180).
        assert!((angle_f(origin, Point::new(10, 10)) - 135.0).abs() < 1e-9);
        assert!((angle_f(origin, Point::new(10, -10)) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn integer_angle_stays_in_range() {
        let origin = Point::new(0, 0);
        for (x, y) in [(100, 1), (100, -1), (1, 100), (-1, 100), (57, 33)] {
            let a = angle_i(origin, Point::new(x, y));
            assert!((0..180).contains(&a), "angle {a} for ({x}, {y})");
        }
        assert_eq!(angle_i(origin, Point::new(0, 5)), 90);
        assert_eq!(angle_i(origin, Point::new(7, 0)), 0);
    }

    #[test]
    fn opposite_angles_walk_opposite_ways() {
        let start = Point::new(50, 50);
        for angle in [0.0, 30.0, 90.0, 145.0] {
            let ahead = trace::move_pixel(start, angle, 10, 1);
            let behind = trace::move_pixel(start, angle + 180.0, 10, 1);
            assert_eq!(ahead.x - start.x, start.x - behind.x);
            assert_eq!(ahead.y - start.y, start.y - behind.y);
        }
    }

    #[test]
    fn distances() {
        let a = Point::new(1, 2);
        let b = Point::new(4, 6);
        assert_eq!(distance_sq(a, b), 25);
        assert!((distance(a, b) - 5.0).abs() < 1e-12);
    }
}
