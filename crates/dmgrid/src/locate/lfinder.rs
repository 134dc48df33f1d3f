//! L-finder detection: recognize the two solid border sides of a symbol.

use imageproc::point::Point;
use imageproc::rect::Rect;

use super::{angle_f, distance_sq, CornerPosition, IndexedPoint, LShape};
use crate::preprocess::ContourPoints;

/// Maximum distance from a bounding-box side for a point to count toward it.
const SIDE_GAP: i32 = 4;
/// Fraction of a side's length its point count must reach to be solid.
const SIDE_OVERLAY_RATE: f64 = 0.7;

/// Squared straightness ratio a vertex pair must exceed to be a line.
const LINE_RATIO: f64 = 0.8 * 0.8;
/// Squared length ratio between the two chosen sides (true ratio 1:5).
const SIDE_ASPECT: f64 = 0.04;
/// Minimum squared side length: 10 modules of 4 px.
const MIN_SIDE_SQ: i64 = 1600;

/// Fast path: the contour hugs its bounding box. Counts points within
/// [`SIDE_GAP`] of each box side; two adjacent sides covering at least 70 %
/// of their length form the L. `p1` and `p2` are then refined to the contour
/// points nearest their box corners.
pub(crate) fn check_orthogonal(contour: &ContourPoints, bound: Rect) -> Option<LShape> {
    let mut counters = [0usize; 4];
    let right = bound.left() + bound.width() as i32;
    let bottom = bound.top() + bound.height() as i32;
    for p in contour {
        if p.y - bound.top() < SIDE_GAP {
            counters[0] += 1; // top
        }
        if p.x - bound.left() < SIDE_GAP {
            counters[1] += 1; // left
        }
        if bottom - p.y < SIDE_GAP {
            counters[2] += 1; // bottom
        }
        if right - p.x < SIDE_GAP {
            counters[3] += 1; // right
        }
    }

    let side_len = |idx: usize| -> f64 {
        if idx % 2 == 1 {
            bound.height() as f64
        } else {
            bound.width() as f64
        }
    };

    let first = (0..4).fold(0usize, |best, i| {
        if counters[i] > counters[best] {
            i
        } else {
            best
        }
    });
    if counters[first] as f64 / side_len(first) < SIDE_OVERLAY_RATE {
        return None;
    }
    let second = (0..4)
        .filter(|&i| i != first)
        .fold(None::<usize>, |best, i| match best {
            Some(b) if counters[i] <= counters[b] => Some(b),
            _ => Some(i),
        })?;
    if counters[second] as f64 / side_len(second) < SIDE_OVERLAY_RATE {
        return None;
    }

    let pair = (first.min(second), first.max(second));
    let corner = |x, y| Point::new(x, y);
    // Side pair → L-corner position; the far ends follow clockwise from
    // the corner naming: top-left, bottom-left, bottom-right, top-right.
    let (position, p0, p1, p2, angle1, angle2) = match pair {
        (0, 1) => (
            CornerPosition::TopLeft,
            corner(bound.left(), bound.top()),
            corner(right, bound.top()),
            corner(bound.left(), bottom),
            0.0,
            90.0,
        ),
        (1, 2) => (
            CornerPosition::BottomLeft,
            corner(bound.left(), bottom),
            corner(bound.left(), bound.top()),
            corner(right, bottom),
            90.0,
            0.0,
        ),
        (2, 3) => (
            CornerPosition::BottomRight,
            corner(right, bottom),
            corner(bound.left(), bottom),
            corner(right, bound.top()),
            0.0,
            90.0,
        ),
        (0, 3) => (
            CornerPosition::TopRight,
            corner(right, bound.top()),
            corner(right, bottom),
            corner(bound.left(), bound.top()),
            90.0,
            0.0,
        ),
        _ => return None,
    };

    // Snap the far ends to actual contour points.
    let mut best1 = (i64::MAX, IndexedPoint::new(p1, -1));
    let mut best2 = (i64::MAX, IndexedPoint::new(p2, -1));
    for (i, &p) in contour.iter().enumerate() {
        let d1 = distance_sq(p, p1);
        if d1 < best1.0 {
            best1 = (d1, IndexedPoint::new(p, i as i64));
        }
        let d2 = distance_sq(p, p2);
        if d2 < best2.0 {
            best2 = (d2, IndexedPoint::new(p, i as i64));
        }
    }

    Some(LShape {
        p0: IndexedPoint::new(p0, -1),
        p1: best1.1,
        p2: best2.1,
        px: Point::new(0, 0),
        position,
        angle1,
        angle2,
    })
}

/// Rotated path: rank the four vertex-pair sides by straightness
/// (squared chord length over squared contour-index gap) and take the two
/// best. The shared seed vertex becomes the L-corner.
pub(crate) fn rotated_l_shape(
    contour: &ContourPoints,
    _bound: Rect,
    vertices: &[IndexedPoint; 4],
) -> Option<LShape> {
    let total = contour.len() as i64;
    let mut side_len_sq = [0i64; 4];
    let mut rates = [0.0f64; 4];

    for i in 0..4 {
        let next = (i + 1) % 4;
        side_len_sq[i] = distance_sq(vertices[i].point, vertices[next].point);

        let mut index_gap = vertices[next].index - vertices[i].index;
        if vertices[next].index < vertices[i].index {
            index_gap = vertices[next].index + total - vertices[i].index + 1;
        }
        let steps_sq = (index_gap * index_gap).max(1);
        rates[i] = side_len_sq[i] as f64 / steps_sq as f64;
        if side_len_sq[i] < MIN_SIDE_SQ {
            rates[i] = 0.0;
        }
    }

    let first = (0..4).fold(0usize, |best, i| if rates[i] > rates[best] { i } else { best });
    if rates[first] < LINE_RATIO {
        return None;
    }
    let second = (0..4).filter(|&i| i != first).fold(None::<usize>, |best, i| match best {
        Some(b) if rates[i] <= rates[b] => Some(b),
        _ => Some(i),
    })?;
    if rates[second] < LINE_RATIO {
        return None;
    }

    let (short, long) = if side_len_sq[second] < side_len_sq[first] {
        (side_len_sq[second], side_len_sq[first])
    } else {
        (side_len_sq[first], side_len_sq[second])
    };
    if (short as f64) / (long as f64) < SIDE_ASPECT {
        return None;
    }

    let pair = (first.min(second), first.max(second));
    // Side i runs from vertex i to vertex i+1; adjacent sides share the
    // vertex that becomes the L-corner.
    let (position, p0, p1, p2) = match pair {
        (0, 1) => (CornerPosition::TopLeft, vertices[1], vertices[0], vertices[2]),
        (1, 2) => (CornerPosition::BottomLeft, vertices[2], vertices[1], vertices[3]),
        (2, 3) => (CornerPosition::BottomRight, vertices[3], vertices[2], vertices[0]),
        (0, 3) => (CornerPosition::TopRight, vertices[0], vertices[3], vertices[1]),
        _ => return None,
    };

    let angle1 = angle_f(p0.point, p1.point);
    let angle2 = angle_f(p0.point, p2.point);
    let diff = (angle1 - angle2).abs();
    if !(45.0..=135.0).contains(&diff) {
        return None;
    }

    Some(LShape {
        p0,
        p1,
        p2,
        px: Point::new(0, 0),
        position,
        angle1,
        angle2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::vertex::seed_vertices;

    /// Closed chain around a square, clockwise from the top-left.
    fn square_contour(x0: i32, y0: i32, side: i32) -> ContourPoints {
        let mut points = Vec::new();
        for d in 0..side {
            points.push(Point::new(x0 + d, y0));
        }
        for d in 0..side {
            points.push(Point::new(x0 + side, y0 + d));
        }
        for d in 0..side {
            points.push(Point::new(x0 + side - d, y0 + side));
        }
        for d in 0..side {
            points.push(Point::new(x0, y0 + side - d));
        }
        points
    }

    #[test]
    fn full_square_reads_as_orthogonal() {
        let contour = square_contour(10, 10, 60);
        let (bound, _) = seed_vertices(&contour);
        let l = check_orthogonal(&contour, bound).expect("orthogonal L");
        // All four sides are solid; the first two win: top + left.
        assert_eq!(l.position, CornerPosition::TopLeft);
        assert_eq!(l.p0.point, Point::new(10, 10));
        assert!(l.p1.index >= 0);
        assert!(l.p2.index >= 0);
    }

    #[test]
    fn sparse_contour_is_not_orthogonal() {
        // Only two opposite sides present: no adjacent solid pair.
        let mut points = Vec::new();
        for d in 0..60 {
            points.push(Point::new(10 + d, 10));
        }
        for d in 0..60 {
            points.push(Point::new(70 - d, 70));
        }
        let (bound, _) = seed_vertices(&points);
        assert!(check_orthogonal(&points, bound).is_none());
    }

    /// Diamond: a square rotated 45°, traced counterclockwise (the order
    /// border following emits outer contours in image coordinates).
    fn diamond_contour(cx: i32, cy: i32, r: i32) -> ContourPoints {
        let mut points = Vec::new();
        for d in 0..r {
            points.push(Point::new(cx - d, cy - r + d));
        }
        for d in 0..r {
            points.push(Point::new(cx - r + d, cy + d));
        }
        for d in 0..r {
            points.push(Point::new(cx + d, cy + r - d));
        }
        for d in 0..r {
            points.push(Point::new(cx + r - d, cy - d));
        }
        points
    }

    #[test]
    fn rotated_square_yields_an_l_shape() {
        let contour = diamond_contour(100, 100, 60);
        let (bound, vertices) = seed_vertices(&contour);
        assert!(check_orthogonal(&contour, bound).is_none());
        let l = rotated_l_shape(&contour, bound, &vertices).expect("rotated L");
        // Sides are equally straight; the first pair wins, sharing vertex 1
        // (the leftmost point).
        assert_eq!(l.position, CornerPosition::TopLeft);
        assert_eq!(l.p0.point, Point::new(40, 100));
        let diff = (l.angle1 - l.angle2).abs();
        assert!((45.0..=135.0).contains(&diff));
    }

    #[test]
    fn short_sides_are_rejected() {
        let contour = diamond_contour(100, 100, 20);
        let (bound, vertices) = seed_vertices(&contour);
        // Chords of ~28 px: below the 40 px minimum side length.
        assert!(rotated_l_shape(&contour, bound, &vertices).is_none());
    }
}
