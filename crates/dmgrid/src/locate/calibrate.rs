//! Angle calibration for the L legs and analytic corner recovery.
//!
//! Seed vertices land on rasterized corners, so the leg angles read off
//! them are a few degrees off. A vote over the contour segment between the
//! L-corner and each far end refines the angle; the far ends are then
//! nudged along the contour until the local angle falls out of tolerance,
//! and the L-corner is recomputed as the exact intersection of the two
//! refined rays.

use imageproc::point::Point;

use super::trace::round_coord;
use super::{angle_f, angle_i, CornerPosition, IndexedPoint, LShape};
use crate::preprocess::ContourPoints;

/// Sample points per leg in the angle vote.
const SAMPLE_COUNT: usize = 6;
/// Degrees a contour point may deviate from the winning angle while still
/// belonging to the leg.
const ANGLE_TOLERANCE: f64 = 2.0;
/// Most contour steps a far end may be nudged.
const NUDGE_LIMIT: i32 = 30;

/// Refine both leg angles and far ends. Fails when either vote is too weak
/// or the refined legs stop looking like an L.
pub(crate) fn calibrate_l_shape(contour: &ContourPoints, l: &mut LShape) -> bool {
    let home = l.p0;
    let first = calibrate_angle(contour, home, 1, &mut l.p1, &mut l.angle1);
    let second = calibrate_angle(contour, home, -1, &mut l.p2, &mut l.angle2);

    let diff = (l.angle1 - l.angle2).abs();
    if !(45.0..=135.0).contains(&diff) {
        return false;
    }
    first && second
}

/// Hough-style vote along the contour segment from `p` to `p0`.
///
/// Six equally spaced sample points each accumulate votes for the integer
/// degree of the sample→point line, over every point of the segment. The
/// winning (sample, angle) pair must collect at least a quarter of the
/// segment length in votes; the far end is then nudged to the tolerance
/// boundary of the winning angle.
fn calibrate_angle(
    contour: &ContourPoints,
    p0: IndexedPoint,
    direction: i32,
    p: &mut IndexedPoint,
    angle: &mut f64,
) -> bool {
    let total = contour.len() as i64;
    let mut hough = vec![0u32; SAMPLE_COUNT * 180];

    let mut path = direction as i64 * (p0.index - p.index);
    if path < 0 {
        path += total;
    }
    let min_votes = (path / 4) as u32;

    let mut samples = [IndexedPoint::new(Point::new(0, 0), -1); SAMPLE_COUNT];
    let interval = path / (SAMPLE_COUNT as i64 + 1);
    for (i, sample) in samples.iter_mut().enumerate() {
        let mut idx = p.index + direction as i64 * interval * (i as i64 + 1);
        if idx < 0 {
            idx += total;
        }
        if idx >= total {
            idx -= total;
        }
        *sample = IndexedPoint::new(contour[idx as usize], idx);
    }

    let mut idx = p.index;
    let mut max_votes = 0u32;
    let mut max_angle = -1i32;
    let mut max_sample = None;
    loop {
        if idx < 0 {
            idx += total;
        }
        if idx >= total {
            idx -= total;
        }
        if idx == p0.index + 1 || idx == p0.index - 1 {
            break;
        }

        let current = contour[idx as usize];
        for (i, sample) in samples.iter().enumerate() {
            if sample.index == idx {
                continue;
            }
            let a = angle_i(sample.point, current);
            let slot = i * 180 + a as usize;
            hough[slot] += 1;
            if hough[slot] > max_votes {
                max_votes = hough[slot];
                max_angle = a;
                max_sample = Some(i);
            }
        }
        idx += direction as i64;
    }

    let best_sample = match max_sample {
        Some(i) if max_votes >= min_votes => samples[i],
        _ => return false,
    };

    let diff = max_angle as f64 - *angle;
    if (diff < 0.0 && diff > -90.0) || diff > 90.0 {
        nudge_far_end(contour, best_sample, max_angle, -1, -direction, p);
    }
    if (diff > 0.0 && diff < 90.0) || diff < -90.0 {
        nudge_far_end(contour, best_sample, max_angle, 1, direction, p);
    }
    *angle = max_angle as f64;
    true
}

/// Walk the far end along the contour until the angle to the vote winner
/// crosses the tolerance. `orient` −1 extends away from the L-corner as
/// long as the angle holds; +1 retreats toward it until the angle holds.
fn nudge_far_end(
    contour: &ContourPoints,
    best_point: IndexedPoint,
    angle: i32,
    direction: i32,
    orient: i32,
    p: &mut IndexedPoint,
) {
    let total = contour.len() as i64;
    let mut best = *p;
    let mut idx = p.index + direction as i64;
    for _ in 0..=NUDGE_LIMIT {
        if idx < 0 {
            idx += total;
        }
        if idx >= total {
            idx -= total;
        }
        let current = contour[idx as usize];
        let diff = (angle_f(best_point.point, current) - angle as f64).abs();
        if orient == -1 {
            if diff > ANGLE_TOLERANCE {
                break;
            }
            best = IndexedPoint::new(current, idx);
        } else if diff < ANGLE_TOLERANCE {
            best = IndexedPoint::new(current, idx);
            break;
        }
        idx += direction as i64;
    }
    *p = best;
}

/// Intersection of the line through `p1` at `angle1` with the line through
/// `p2` at `angle2`, in the locator's angle convention.
pub(crate) fn intersect(p1: Point<i32>, angle1: f64, p2: Point<i32>, angle2: f64) -> Point<i32> {
    let (x1, y1) = (p1.x as f64, p1.y as f64);
    let (x2, y2) = (p2.x as f64, p2.y as f64);
    let t1 = angle1.to_radians().tan();
    let t2 = angle2.to_radians().tan();

    let vertical = |a: f64| a == 90.0 || a == 270.0;
    let horizontal = |a: f64| a == 0.0 || a == 180.0;

    let (x, y) = if vertical(angle1) {
        (x1, (x2 - x1) * t2 + y2)
    } else if horizontal(angle1) {
        ((y2 - y1) / t2 + x2, y1)
    } else if vertical(angle2) {
        (x2, (x1 - x2) * t1 + y1)
    } else if horizontal(angle2) {
        ((y1 - y2) / t1 + x1, y2)
    } else {
        let x = (t2 * x2 - t1 * x1 - y1 + y2) / (t2 - t1);
        (x, y1 + t1 * (x1 - x))
    };
    Point::new(round_coord(x), round_coord(y))
}

/// Recompute the L-corner from the refined far ends and angles.
pub(crate) fn recompute_p0(l: &mut LShape) {
    let p0 = intersect(l.p1.point, l.angle1, l.p2.point, l.angle2);
    l.p0 = IndexedPoint::new(p0, -1);
}

/// Reassign `position` from the refined geometry and lift the leg angles
/// from line angles (0–180) to ray angles (0–360) so that walking a leg
/// with direction +1 always heads toward the L-corner.
pub(crate) fn redefine_angle_position(l: &mut LShape) {
    let p0 = l.p0.point;
    let p1 = l.p1.point;

    if l.angle1 > 45.0 && l.angle1 < 135.0 {
        l.position = if p0.y > p1.y {
            CornerPosition::BottomLeft
        } else {
            CornerPosition::TopRight
        };
    } else if l.angle1 < 45.0 || l.angle1 > 135.0 {
        l.position = if p0.x < p1.x {
            CornerPosition::TopLeft
        } else {
            CornerPosition::BottomRight
        };
    }

    match l.position {
        CornerPosition::TopLeft => {
            if l.angle1 > 90.0 {
                l.angle1 += 180.0;
            }
            l.angle2 += 180.0;
        }
        CornerPosition::BottomLeft => {
            if l.angle2 > 90.0 {
                l.angle2 += 180.0;
            }
        }
        CornerPosition::BottomRight => {
            if l.angle1 < 90.0 {
                l.angle1 += 180.0;
            }
        }
        CornerPosition::TopRight => {
            l.angle1 += 180.0;
            if l.angle2 < 90.0 {
                l.angle2 += 180.0;
            }
        }
    }
}
