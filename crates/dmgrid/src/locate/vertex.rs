//! Vertex seeding: pick the four contour points that anchor L detection.

use imageproc::point::Point;
use imageproc::rect::Rect;

use super::{distance_sq, IndexedPoint};
use crate::preprocess::{bounding_box, ContourPoints};

/// Fraction of the bounding-box area the seeded vertices must span before
/// the contour counts as axis-aligned.
const ROTATION_AREA_RATIO: f64 = 0.75;

/// Bounding box plus the four seed vertices, ordered top-left, bottom-left,
/// bottom-right, top-right.
///
/// Seeds start as the contour points nearest each bounding-box corner. When
/// the tight rectangle over those seeds covers less than 75 % of the box the
/// symbol is rotated, and the seeds become the extreme top, left, bottom and
/// right contour points instead.
pub(crate) fn seed_vertices(contour: &ContourPoints) -> (Rect, [IndexedPoint; 4]) {
    let bound = bounding_box(contour);
    let corners = [
        Point::new(bound.left(), bound.top()),
        Point::new(bound.left(), bound.top() + bound.height() as i32),
        Point::new(
            bound.left() + bound.width() as i32,
            bound.top() + bound.height() as i32,
        ),
        Point::new(bound.left() + bound.width() as i32, bound.top()),
    ];

    let mut vertices = [IndexedPoint::new(Point::new(0, 0), -1); 4];
    let mut best = [i64::MAX; 4];
    for (i, &p) in contour.iter().enumerate() {
        for j in 0..4 {
            let d = distance_sq(p, corners[j]);
            if d < best[j] {
                best[j] = d;
                vertices[j] = IndexedPoint::new(p, i as i64);
            }
        }
    }

    // Tight extent of the seeds against the full box.
    let mut top = i32::MAX;
    let mut left = i32::MAX;
    let mut bottom = i32::MIN;
    let mut right = i32::MIN;
    for v in &vertices {
        top = top.min(v.point.y);
        left = left.min(v.point.x);
        bottom = bottom.max(v.point.y);
        right = right.max(v.point.x);
    }
    let tight_area = ((right - left) as i64 * (bottom - top) as i64) as f64;
    let bound_area = (bound.width() as i64 * bound.height() as i64) as f64;

    if tight_area / bound_area < ROTATION_AREA_RATIO {
        // Rotated: reseed with the extreme points, first occurrence wins.
        let mut top = i32::MAX;
        let mut left = i32::MAX;
        let mut bottom = i32::MIN;
        let mut right = i32::MIN;
        for (i, &p) in contour.iter().enumerate() {
            if p.y < top {
                top = p.y;
                vertices[0] = IndexedPoint::new(p, i as i64);
            }
            if p.x < left {
                left = p.x;
                vertices[1] = IndexedPoint::new(p, i as i64);
            }
            if p.y > bottom {
                bottom = p.y;
                vertices[2] = IndexedPoint::new(p, i as i64);
            }
            if p.x > right {
                right = p.x;
                vertices[3] = IndexedPoint::new(p, i as i64);
            }
        }
    }

    (bound, vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn diamond_contour(cx: i32, cy: i32, r: i32) -> ContourPoints {
        // A square rotated 45°, traced counterclockwise in image
        // coordinates as border following emits outer contours.
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
    fn axis_aligned_square_keeps_corner_seeds() {
        let contour = square_contour(10, 20, 40);
        let (bound, vertices) = seed_vertices(&contour);
        assert_eq!((bound.left(), bound.top()), (10, 20));
        assert_eq!((bound.width(), bound.height()), (41, 41));
        assert_eq!(vertices[0].point, Point::new(10, 20));
        assert_eq!(vertices[1].point, Point::new(10, 60));
        assert_eq!(vertices[2].point, Point::new(50, 60));
        assert_eq!(vertices[3].point, Point::new(50, 20));
        for v in &vertices {
            assert!(v.index >= 0);
        }
    }

    #[test]
    fn rotated_contour_reseeds_with_extremes() {
        let contour = diamond_contour(50, 50, 30);
        let (_, vertices) = seed_vertices(&contour);
        // The diamond's tight corner rectangle covers ~50% of its bounding
        // box, so the seeds must be the extreme points.
        assert_eq!(vertices[0].point, Point::new(50, 20)); // top
        assert_eq!(vertices[1].point, Point::new(20, 50)); // left
        assert_eq!(vertices[2].point, Point::new(50, 80)); // bottom
        assert_eq!(vertices[3].point, Point::new(80, 50)); // right
    }
}
